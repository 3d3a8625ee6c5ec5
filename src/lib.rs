pub mod attendance;
pub mod config;
pub mod enroll;
pub mod matcher;
pub mod scanner;
pub mod store;
pub mod trainer;

// Re-export vision types for convenience
pub use rollcall_vision::{Detection, Pipeline};
pub use scanner::{FaceScanner, ScannedFace};

pub mod align;
pub mod detect;
pub mod encode;
pub mod model;
pub mod pipeline;
pub mod tensor;

// Re-export commonly used types
pub use detect::Detection;
pub use pipeline::Pipeline;

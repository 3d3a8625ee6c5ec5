use std::path::Path;

use anyhow::{Context, Result};
#[cfg(any(feature = "openvino", feature = "cuda"))]
use ort::ep::{self, ExecutionProvider};
use ort::session::{
    builder::{GraphOptimizationLevel, SessionBuilder},
    Session,
};

pub const DETECTOR_MODEL: &str = "face_detection_yunet_2023mar.onnx";
pub const ENCODER_MODEL: &str = "face_recognition_sface_2021dec.onnx";

/// Where model files are looked up when no directory is configured.
pub fn default_model_dir() -> &'static Path {
    Path::new(option_env!("ROLLCALL_MODEL_DIR").unwrap_or("/usr/local/share/rollcall/models"))
}

pub fn session_builder() -> Result<SessionBuilder> {
    #[allow(unused_mut)]
    let mut builder = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(ort::Error::<()>::from)?;

    #[cfg(feature = "openvino")]
    {
        let ep = ep::OpenVINO::default();
        if ep.is_available()? {
            ep.register(&mut builder)?;
        } else {
            log::warn!("openvino feature is enabled, onnx runtime not compiled with openvino")
        }
    }

    #[cfg(feature = "cuda")]
    {
        let ep = ep::CUDA::default();
        if ep.is_available()? {
            ep.register(&mut builder)?;
        } else {
            log::warn!("cuda feature is enabled, onnx runtime not compiled with cuda")
        }
    }

    Ok(builder)
}

fn load_session(dir: &Path, file: &str) -> Result<Session> {
    let path = dir.join(file);
    session_builder()?
        .commit_from_file(&path)
        .with_context(|| format!("loading model {}", path.display()))
}

pub fn detector_session(dir: &Path) -> Result<Session> {
    load_session(dir, DETECTOR_MODEL)
}

pub fn encoder_session(dir: &Path) -> Result<Session> {
    load_session(dir, ENCODER_MODEL)
}

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub static CONFIG_PATH: Lazy<&'static Path> = Lazy::new(|| {
    Path::new(option_env!("ROLLCALL_CONFIG_PATH").unwrap_or("/usr/local/etc/rollcall/config.toml"))
});

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum embedding distance for a detected face to count as a match.
    pub tolerance: f32,
    /// Detector confidence threshold.
    pub score_threshold: f32,
    /// Detector NMS IoU threshold.
    pub nms_threshold: f32,
    /// Directory of `<name>_<id>.<ext>` enrollment images.
    pub known_faces_dir: PathBuf,
    /// Directory the dated attendance logs are written to.
    pub attendance_dir: PathBuf,
    /// Path of the serialized encoding store.
    pub encodings_file: PathBuf,
    /// Directory holding the ONNX model files.
    pub model_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tolerance: 0.55,
            score_threshold: 0.6,
            nms_threshold: 0.3,
            known_faces_dir: PathBuf::from("known_faces"),
            attendance_dir: PathBuf::from("daily_attendance"),
            encodings_file: PathBuf::from("face_encodings.bin"),
            model_dir: rollcall_vision::model::default_model_dir().to_path_buf(),
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.unwrap_or(&CONFIG_PATH);
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config at {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<()> {
    let path = path.unwrap_or(&CONFIG_PATH);
    let data = toml::to_string_pretty(cfg)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(Some(&dir.path().join("absent.toml"))).unwrap();
        assert!((cfg.tolerance - 0.55).abs() < 1e-6);
        assert_eq!(cfg.known_faces_dir, PathBuf::from("known_faces"));
    }

    #[test]
    fn partial_config_keeps_defaults_for_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "tolerance = 0.4\n").unwrap();

        let cfg = load_config(Some(&path)).unwrap();
        assert!((cfg.tolerance - 0.4).abs() < 1e-6);
        assert_eq!(cfg.attendance_dir, PathBuf::from("daily_attendance"));
    }

    #[test]
    fn save_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut cfg = Config::default();
        cfg.tolerance = 0.6;
        cfg.known_faces_dir = PathBuf::from("/srv/faces");
        save_config(&cfg, Some(&path)).unwrap();

        let loaded = load_config(Some(&path)).unwrap();
        assert!((loaded.tolerance - 0.6).abs() < 1e-6);
        assert_eq!(loaded.known_faces_dir, PathBuf::from("/srv/faces"));
    }
}

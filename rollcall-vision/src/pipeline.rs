use std::path::Path;

use anyhow::{Context, Result};
use image::DynamicImage;
use log::debug;
use ort::session::Session;

use crate::detect::{self, Detection};
use crate::{align, encode, model};

/// Full pipeline: detect faces → align → encode.
pub struct Pipeline {
    pub detector: Session,
    pub encoder: Session,
}

impl Pipeline {
    /// Load the detector and encoder models from `model_dir`.
    pub fn load(model_dir: &Path) -> Result<Self> {
        Ok(Self {
            detector: model::detector_session(model_dir)?,
            encoder: model::encoder_session(model_dir)?,
        })
    }

    /// Detect every face in the image and compute an embedding for each.
    pub fn scan_all(
        &mut self,
        img: &DynamicImage,
        score_threshold: f32,
        nms_threshold: f32,
    ) -> Result<Vec<(Detection, Vec<f32>)>> {
        let detections =
            detect::detect_faces(&mut self.detector, img, score_threshold, nms_threshold)
                .context("detecting faces")?;
        debug!("{} face(s) above threshold", detections.len());

        let mut faces = Vec::with_capacity(detections.len());
        for detection in detections {
            let crop = align::align_face(img, &detection);
            let embedding =
                encode::encode_face(&mut self.encoder, &crop).context("encoding face")?;
            faces.push((detection, embedding));
        }
        Ok(faces)
    }
}

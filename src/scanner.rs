//! Seam between the attendance pipeline and the face detection / embedding
//! capability, so the trainer and matcher can be exercised without ONNX
//! models.

use anyhow::Result;
use image::DynamicImage;
use rollcall_vision::{Detection, Pipeline};

/// One face found in an image: where it is and its embedding.
#[derive(Debug, Clone)]
pub struct ScannedFace {
    pub detection: Detection,
    pub embedding: Vec<f32>,
}

/// Face detection and embedding for a whole image.
pub trait FaceScanner {
    fn scan(&mut self, img: &DynamicImage) -> Result<Vec<ScannedFace>>;
}

/// Production scanner backed by the ONNX pipeline.
pub struct OnnxScanner {
    pipeline: Pipeline,
    score_threshold: f32,
    nms_threshold: f32,
}

impl OnnxScanner {
    pub fn new(pipeline: Pipeline, score_threshold: f32, nms_threshold: f32) -> Self {
        Self {
            pipeline,
            score_threshold,
            nms_threshold,
        }
    }
}

impl FaceScanner for OnnxScanner {
    fn scan(&mut self, img: &DynamicImage) -> Result<Vec<ScannedFace>> {
        let faces = self
            .pipeline
            .scan_all(img, self.score_threshold, self.nms_threshold)?;
        Ok(faces
            .into_iter()
            .map(|(detection, embedding)| ScannedFace {
                detection,
                embedding,
            })
            .collect())
    }
}

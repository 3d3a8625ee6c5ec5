//! SFace embedding.

use anyhow::Result;
use image::DynamicImage;
use ort::{session::Session, value::Value};

use crate::align::CROP_SIZE;
use crate::tensor;

/// Dimensionality of an SFace embedding.
pub const EMBEDDING_DIM: usize = 128;

/// Encode an aligned face crop to an L2-normalized embedding.
///
/// SFace takes a `[1, 3, 112, 112]` BGR tensor with values in `[0, 255]` and
/// produces a `[1, 128]` vector.
pub fn encode_face(session: &mut Session, face: &DynamicImage) -> Result<Vec<f32>> {
    let resized = face.resize_exact(CROP_SIZE, CROP_SIZE, image::imageops::FilterType::Triangle);
    let input = Value::from_array(tensor::bgr_chw_tensor(&resized)?)?;

    let outputs = session.run(ort::inputs![input])?;
    let (shape, data) = outputs[0].try_extract_tensor::<f32>()?;

    let dim = if shape.len() == 2 {
        shape[1] as usize
    } else {
        data.len()
    };
    let mut embedding = data[..dim].to_vec();
    l2_normalize(&mut embedding);
    Ok(embedding)
}

/// Scale a vector to unit length. A zero vector is left unchanged.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

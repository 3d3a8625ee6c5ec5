//! YuNet face detection.
//!
//! YuNet is an anchor-free detector: for each stride (8, 16, 32) it predicts
//! directly from grid locations. Per stride the model outputs
//! cls `[1, H*W, 1]`, obj `[1, H*W, 1]`, bbox `[1, H*W, 4]` (dx, dy, dw, dh)
//! and kps `[1, H*W, 10]` (5 landmark points), in the tensor order
//! cls_8, cls_16, cls_32, obj_8, ..., kps_32. Decoding maps grid cell (i, j)
//! to pixels: cx = (j + dx) * stride, w = dw * stride, and likewise for
//! landmarks.

use anyhow::{bail, Result};
use image::DynamicImage;
use ort::{session::Session, value::Value};

use crate::tensor::{self, Letterbox};

/// YuNet input resolution.
pub const INPUT_SIZE: usize = 640;

const STRIDES: [usize; 3] = [8, 16, 32];

/// A face found in an image, in source-image pixel coordinates.
#[derive(Debug, Clone)]
pub struct Detection {
    /// x, y, w, h.
    pub bbox: [f32; 4],
    pub score: f32,
    /// 5 points: left eye, right eye, nose, left mouth corner, right mouth
    /// corner, as x1,y1,...,x5,y5.
    pub landmarks: [f32; 10],
}

/// Detect every face in `img`.
///
/// Returns detections above `score_threshold` after NMS at `nms_threshold`,
/// with coordinates mapped back to the source image.
pub fn detect_faces(
    session: &mut Session,
    img: &DynamicImage,
    score_threshold: f32,
    nms_threshold: f32,
) -> Result<Vec<Detection>> {
    let (canvas, lb) = tensor::letterbox(img, INPUT_SIZE as u32);
    let input = Value::from_array(tensor::bgr_chw_tensor(&canvas)?)?;

    let outputs = session.run(ort::inputs![input])?;
    let mut raw: Vec<(Vec<i64>, Vec<f32>)> = Vec::new();
    for (_name, output) in outputs.iter() {
        let (shape, data) = output.try_extract_tensor::<f32>()?;
        raw.push((shape.iter().copied().collect(), data.to_vec()));
    }

    let mut detections = decode_outputs(&raw, score_threshold)?;
    for det in &mut detections {
        *det = to_source_coords(det, &lb);
    }

    Ok(nms(&detections, nms_threshold))
}

/// Map a detection on the letterboxed canvas back to source-image pixels.
fn to_source_coords(det: &Detection, lb: &Letterbox) -> Detection {
    let (x, y) = lb.to_source(det.bbox[0], det.bbox[1]);
    let w = lb.length_to_source(det.bbox[2]);
    let h = lb.length_to_source(det.bbox[3]);

    let mut landmarks = [0.0f32; 10];
    for k in 0..5 {
        let (lx, ly) = lb.to_source(det.landmarks[k * 2], det.landmarks[k * 2 + 1]);
        landmarks[k * 2] = lx;
        landmarks[k * 2 + 1] = ly;
    }

    Detection {
        bbox: [x, y, w, h],
        score: det.score,
        landmarks,
    }
}

/// Validate the shape of one output tensor and return its data slice.
fn plane<'a>(
    raw: &'a [(Vec<i64>, Vec<f32>)],
    index: usize,
    locations: usize,
    channels: usize,
) -> Result<&'a [f32]> {
    let Some((shape, data)) = raw.get(index) else {
        bail!("missing YuNet output at index {index}");
    };
    if shape.as_slice() != [1, locations as i64, channels as i64] {
        bail!(
            "unexpected shape for YuNet output {index}: {shape:?}, expected [1, {locations}, {channels}]"
        );
    }
    Ok(data)
}

/// Decode the 12 YuNet output tensors into detections on the input canvas.
fn decode_outputs(raw: &[(Vec<i64>, Vec<f32>)], score_threshold: f32) -> Result<Vec<Detection>> {
    let mut detections = Vec::new();

    for (s, &stride) in STRIDES.iter().enumerate() {
        let grid = INPUT_SIZE / stride;
        let locations = grid * grid;

        let cls = plane(raw, s, locations, 1)?;
        let obj = plane(raw, s + 3, locations, 1)?;
        let bbox = plane(raw, s + 6, locations, 4)?;
        let kps = plane(raw, s + 9, locations, 10)?;

        for i in 0..grid {
            for j in 0..grid {
                let idx = i * grid + j;
                let score = sigmoid(cls[idx] * obj[idx]);
                if score < score_threshold {
                    continue;
                }

                // Grid-based decoding, no anchors: deltas are in stride units.
                let cx = (j as f32 + bbox[idx * 4]) * stride as f32;
                let cy = (i as f32 + bbox[idx * 4 + 1]) * stride as f32;
                let w = bbox[idx * 4 + 2] * stride as f32;
                let h = bbox[idx * 4 + 3] * stride as f32;

                let mut landmarks = [0.0f32; 10];
                for k in 0..5 {
                    landmarks[k * 2] = (j as f32 + kps[idx * 10 + k * 2]) * stride as f32;
                    landmarks[k * 2 + 1] = (i as f32 + kps[idx * 10 + k * 2 + 1]) * stride as f32;
                }

                detections.push(Detection {
                    bbox: [cx - w / 2.0, cy - h / 2.0, w, h],
                    score,
                    landmarks,
                });
            }
        }
    }

    Ok(detections)
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Non-maximum suppression: drop detections overlapping a higher-scoring one
/// by more than `iou_threshold`.
pub fn nms(detections: &[Detection], iou_threshold: f32) -> Vec<Detection> {
    let mut sorted = detections.to_vec();
    sorted.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut keep: Vec<Detection> = Vec::new();
    for candidate in sorted {
        if keep
            .iter()
            .all(|kept| iou(&kept.bbox, &candidate.bbox) <= iou_threshold)
        {
            keep.push(candidate);
        }
    }
    keep
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = (a[0] + a[2]).min(b[0] + b[2]);
    let y2 = (a[1] + a[3]).min(b[1] + b[3]);

    if x2 <= x1 || y2 <= y1 {
        return 0.0;
    }

    let inter = (x2 - x1) * (y2 - y1);
    inter / (a[2] * a[3] + b[2] * b[3] - inter)
}

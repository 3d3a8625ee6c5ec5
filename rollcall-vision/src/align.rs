//! Eye-based face alignment.
//!
//! SFace expects a 112x112 crop with the eyes at fixed reference positions
//! (the ArcFace convention). The detected eye landmarks define a similarity
//! transform (rotation + uniform scale + translation) onto that reference;
//! the crop is produced by inverse-mapping each output pixel and sampling
//! the source bilinearly.

use image::{DynamicImage, GenericImageView, Rgb};

use crate::detect::Detection;

/// Side length of the aligned crop fed to the encoder.
pub const CROP_SIZE: u32 = 112;

// Reference eye positions for a 112x112 ArcFace crop.
const REF_LEFT_EYE: (f32, f32) = (38.3, 51.7);
const REF_RIGHT_EYE: (f32, f32) = (73.5, 51.5);

/// Similarity transform `out = [a, b; c, d] * in + [tx, ty]`.
struct Similarity {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    tx: f32,
    ty: f32,
}

impl Similarity {
    /// Transform mapping the detected eye pair onto the reference eye pair.
    fn from_eyes(left: (f32, f32), right: (f32, f32)) -> Self {
        let dx = right.0 - left.0;
        let dy = right.1 - left.1;
        let angle = dy.atan2(dx);

        let ref_dist = ((REF_RIGHT_EYE.0 - REF_LEFT_EYE.0).powi(2)
            + (REF_RIGHT_EYE.1 - REF_LEFT_EYE.1).powi(2))
        .sqrt();
        let eye_dist = (dx * dx + dy * dy).sqrt();
        let scale = ref_dist / eye_dist;

        let a = scale * angle.cos();
        let b = scale * angle.sin();
        let c = -scale * angle.sin();
        let d = scale * angle.cos();

        // Anchor the midpoint between the eyes to the reference midpoint.
        let center = ((left.0 + right.0) / 2.0, (left.1 + right.1) / 2.0);
        let ref_center = (
            (REF_LEFT_EYE.0 + REF_RIGHT_EYE.0) / 2.0,
            (REF_LEFT_EYE.1 + REF_RIGHT_EYE.1) / 2.0,
        );
        let tx = ref_center.0 - (a * center.0 + b * center.1);
        let ty = ref_center.1 - (c * center.0 + d * center.1);

        Self { a, b, c, d, tx, ty }
    }

    /// Map a point in crop space back to source space.
    fn invert(&self, x: f32, y: f32) -> (f32, f32) {
        let det = self.a * self.d - self.b * self.c;
        let rx = x - self.tx;
        let ry = y - self.ty;
        (
            (self.d * rx - self.b * ry) / det,
            (-self.c * rx + self.a * ry) / det,
        )
    }
}

/// Produce the aligned 112x112 crop for a detection.
pub fn align_face(img: &DynamicImage, det: &Detection) -> DynamicImage {
    let left_eye = (det.landmarks[0], det.landmarks[1]);
    let right_eye = (det.landmarks[2], det.landmarks[3]);
    let transform = Similarity::from_eyes(left_eye, right_eye);

    let (img_w, img_h) = img.dimensions();
    let mut out = image::RgbImage::new(CROP_SIZE, CROP_SIZE);

    for out_y in 0..CROP_SIZE {
        for out_x in 0..CROP_SIZE {
            let (sx, sy) = transform.invert(out_x as f32, out_y as f32);
            if sx >= 0.0 && sx < img_w as f32 && sy >= 0.0 && sy < img_h as f32 {
                out.put_pixel(out_x, out_y, bilinear(img, sx, sy));
            }
            // Out-of-bounds pixels stay black.
        }
    }

    DynamicImage::ImageRgb8(out)
}

fn bilinear(img: &DynamicImage, x: f32, y: f32) -> Rgb<u8> {
    let (img_w, img_h) = img.dimensions();
    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(img_w - 1);
    let y1 = (y0 + 1).min(img_h - 1);

    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = img.get_pixel(x0, y0);
    let p10 = img.get_pixel(x1, y0);
    let p01 = img.get_pixel(x0, y1);
    let p11 = img.get_pixel(x1, y1);

    let w00 = (1.0 - fx) * (1.0 - fy);
    let w10 = fx * (1.0 - fy);
    let w01 = (1.0 - fx) * fy;
    let w11 = fx * fy;

    let mut rgb = [0u8; 3];
    for (ch, out) in rgb.iter_mut().enumerate() {
        *out = (p00[ch] as f32 * w00
            + p10[ch] as f32 * w10
            + p01[ch] as f32 * w01
            + p11[ch] as f32 * w11) as u8;
    }
    Rgb(rgb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn similarity_maps_eyes_to_reference() {
        let left = (100.0, 200.0);
        let right = (180.0, 200.0);
        let t = Similarity::from_eyes(left, right);

        // Forward-map the eye midpoint: it must land on the reference midpoint.
        let mid = (140.0, 200.0);
        let fx = t.a * mid.0 + t.b * mid.1 + t.tx;
        let fy = t.c * mid.0 + t.d * mid.1 + t.ty;
        assert!((fx - (REF_LEFT_EYE.0 + REF_RIGHT_EYE.0) / 2.0).abs() < 1e-3);
        assert!((fy - (REF_LEFT_EYE.1 + REF_RIGHT_EYE.1) / 2.0).abs() < 1e-3);
    }

    #[test]
    fn invert_roundtrips() {
        let t = Similarity::from_eyes((120.0, 150.0), (200.0, 170.0));
        let (sx, sy) = t.invert(56.0, 56.0);
        let fx = t.a * sx + t.b * sy + t.tx;
        let fy = t.c * sx + t.d * sy + t.ty;
        assert!((fx - 56.0).abs() < 1e-3);
        assert!((fy - 56.0).abs() < 1e-3);
    }

    #[test]
    fn align_produces_crop_size() {
        let img = DynamicImage::new_rgb8(640, 480);
        let det = Detection {
            bbox: [200.0, 150.0, 120.0, 120.0],
            score: 0.9,
            landmarks: [230.0, 190.0, 290.0, 190.0, 260.0, 220.0, 240.0, 250.0, 280.0, 250.0],
        };
        let crop = align_face(&img, &det);
        assert_eq!(crop.width(), CROP_SIZE);
        assert_eq!(crop.height(), CROP_SIZE);
    }
}

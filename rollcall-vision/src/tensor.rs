//! Shared preprocessing for the ONNX models: aspect-preserving letterbox
//! resize and RGB→BGR planar tensor conversion.

use anyhow::Result;
use image::{imageops, DynamicImage};
use ndarray::Array4;

/// Geometry of a letterbox resize, needed to map coordinates on the square
/// canvas back to source-image pixels.
#[derive(Debug, Clone, Copy)]
pub struct Letterbox {
    pub scale: f32,
    pub offset_x: u32,
    pub offset_y: u32,
}

impl Letterbox {
    /// Map a point on the canvas (pixels) back to source-image pixels.
    pub fn to_source(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x - self.offset_x as f32) / self.scale,
            (y - self.offset_y as f32) / self.scale,
        )
    }

    /// Map a length on the canvas back to source-image pixels.
    pub fn length_to_source(&self, len: f32) -> f32 {
        len / self.scale
    }
}

/// Resize `img` onto a `size`x`size` canvas, preserving aspect ratio and
/// centering with black padding.
pub fn letterbox(img: &DynamicImage, size: u32) -> (DynamicImage, Letterbox) {
    let (w, h) = (img.width(), img.height());
    let scale = size as f32 / w.max(h) as f32;
    let new_w = (w as f32 * scale) as u32;
    let new_h = (h as f32 * scale) as u32;

    let resized = img.resize_exact(new_w, new_h, imageops::FilterType::Triangle);
    let mut canvas = DynamicImage::new_rgb8(size, size);
    let offset_x = (size - new_w) / 2;
    let offset_y = (size - new_h) / 2;
    imageops::overlay(&mut canvas, &resized, offset_x as i64, offset_y as i64);

    (
        canvas,
        Letterbox {
            scale,
            offset_x,
            offset_y,
        },
    )
}

/// Convert an RGB image to a `[1, 3, H, W]` tensor in BGR channel order with
/// values in `[0, 255]`, the layout both YuNet and SFace expect.
pub fn bgr_chw_tensor(img: &DynamicImage) -> Result<Array4<f32>> {
    let rgb = img.to_rgb8();
    let (w, h) = rgb.dimensions();
    let pixel_count = (w * h) as usize;

    let mut data = vec![0.0f32; 3 * pixel_count];
    let (b_plane, rest) = data.split_at_mut(pixel_count);
    let (g_plane, r_plane) = rest.split_at_mut(pixel_count);

    for (i, px) in rgb.pixels().enumerate() {
        r_plane[i] = px[0] as f32;
        g_plane[i] = px[1] as f32;
        b_plane[i] = px[2] as f32;
    }

    Ok(Array4::from_shape_vec(
        (1, 3, h as usize, w as usize),
        data,
    )?)
}

// ============================================================================
// BASE-IMAGE OPERATIONS — crop, rotate, flip.
//
// These rewrite the base template in place; the layer stack survives and is
// remapped (crop) or left alone (rotate/flip keep normalized coordinates
// meaningful on the transformed image).
// ============================================================================

use image::imageops;

use crate::canvas::{Bitmap, CropRect, Layer};

/// Cut the crop rectangle out of the base image. The sub-image is at least
/// 1x1 even for a degenerate rect.
pub fn apply_crop(base: &Bitmap, crop: &CropRect) -> Bitmap {
    let (w, h) = base.dimensions();
    let x = ((crop.x.clamp(0.0, 1.0) * w as f32) as u32).min(w.saturating_sub(1));
    let y = ((crop.y.clamp(0.0, 1.0) * h as f32) as u32).min(h.saturating_sub(1));
    let cw = ((crop.w * w as f32) as u32).clamp(1, w - x);
    let ch = ((crop.h * h as f32) as u32).clamp(1, h - y);
    imageops::crop_imm(base, x, y, cw, ch).to_image()
}

/// Re-express layer centers relative to the cropped region, so a layer
/// sitting on a face stays on that face. Size and scale are untouched:
/// the layer keeps its pixel dimensions on the (smaller) new base.
pub fn remap_layers_for_crop(layers: &mut [Layer], crop: &CropRect, img_w: u32, img_h: u32) {
    let crop_x_px = crop.x * img_w as f32;
    let crop_y_px = crop.y * img_h as f32;
    let crop_w_px = (crop.w * img_w as f32).max(1.0);
    let crop_h_px = (crop.h * img_h as f32).max(1.0);
    for layer in layers {
        layer.x = (layer.x * img_w as f32 - crop_x_px) / crop_w_px;
        layer.y = (layer.y * img_h as f32 - crop_y_px) / crop_h_px;
    }
}

pub fn rotate_cw(base: &Bitmap) -> Bitmap {
    imageops::rotate90(base)
}

pub fn rotate_ccw(base: &Bitmap) -> Bitmap {
    imageops::rotate270(base)
}

pub fn flip_horizontal(base: &Bitmap) -> Bitmap {
    imageops::flip_horizontal(base)
}

pub fn flip_vertical(base: &Bitmap) -> Bitmap {
    imageops::flip_vertical(base)
}

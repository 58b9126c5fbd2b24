// ============================================================================
// GLOBAL FILTERS — the "cinematic" grade and the deep-fry effect.
//
// Both run over the full composite after all layers are blended, row-parallel
// via rayon. Deep-fry takes an explicit noise seed so the same scene renders
// to the same bytes every time.
// ============================================================================

use image::{RgbaImage, imageops};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// "Cinematic" grade parameters.
const CINEMATIC_SATURATION: f32 = 1.15;
const CINEMATIC_CONTRAST: f32 = 1.05;

/// Deep-fry parameters.
const FRY_NOISE_AMPLITUDE: f32 = 30.0;
const FRY_CONTRAST: f32 = 2.0;
const FRY_DOWNSAMPLE: u32 = 4;

/// Saturation then contrast, per pixel, alpha untouched.
///
/// Per channel: `c = gray*(1-sat) + v*sat`, then `(c-128)*contrast + 128`,
/// clamped to [0,255]. Luma weights are the usual Rec.601 ones.
pub fn saturation_contrast(img: &RgbaImage, sat: f32, contrast: f32) -> RgbaImage {
    let (w, h) = img.dimensions();
    let src_raw = img.as_raw();
    let stride = w as usize * 4;
    let mut dst_raw = vec![0u8; src_raw.len()];

    dst_raw.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
        let row_in = &src_raw[y * stride..(y + 1) * stride];
        for x in 0..w as usize {
            let pi = x * 4;
            let r = row_in[pi] as f32;
            let g = row_in[pi + 1] as f32;
            let b = row_in[pi + 2] as f32;
            let gray = 0.299 * r + 0.587 * g + 0.114 * b;
            for (c, v) in [(0usize, r), (1, g), (2, b)] {
                let sat_v = gray * (1.0 - sat) + v * sat;
                let out = (sat_v - 128.0) * contrast + 128.0;
                row_out[pi + c] = out.clamp(0.0, 255.0) as u8;
            }
            row_out[pi + 3] = row_in[pi + 3];
        }
    });

    RgbaImage::from_raw(w, h, dst_raw).expect("buffer sized to image")
}

/// The fixed "cinematic" look: mild saturation and contrast boost.
pub fn cinematic(img: &RgbaImage) -> RgbaImage {
    saturation_contrast(img, CINEMATIC_SATURATION, CINEMATIC_CONTRAST)
}

/// Deep-fry: per-channel uniform noise, harsh contrast, then a
/// nearest-neighbor round trip through quarter resolution for the blocky
/// compression-artifact look. `seed` fixes the noise pattern.
pub fn deep_fry(img: &RgbaImage, seed: u64) -> RgbaImage {
    let (w, h) = img.dimensions();
    let src_raw = img.as_raw();
    let stride = w as usize * 4;
    let mut dst_raw = vec![0u8; src_raw.len()];

    // Per-row RNG keyed on (seed, row) keeps the noise deterministic
    // while rows run in parallel.
    dst_raw.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
        let row_in = &src_raw[y * stride..(y + 1) * stride];
        let mut rng = StdRng::seed_from_u64(seed ^ (y as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
        for x in 0..w as usize {
            let pi = x * 4;
            for c in 0..3 {
                let noise: f32 = rng.random_range(-FRY_NOISE_AMPLITUDE..=FRY_NOISE_AMPLITUDE);
                let v = row_in[pi + c] as f32 + noise;
                let out = (v - 128.0) * FRY_CONTRAST + 128.0;
                row_out[pi + c] = out.clamp(0.0, 255.0) as u8;
            }
            row_out[pi + 3] = row_in[pi + 3];
        }
    });

    let fried = RgbaImage::from_raw(w, h, dst_raw).expect("buffer sized to image");
    let small_w = (w / FRY_DOWNSAMPLE).max(1);
    let small_h = (h / FRY_DOWNSAMPLE).max(1);
    let small = imageops::resize(&fried, small_w, small_h, imageops::FilterType::Nearest);
    imageops::resize(&small, w, h, imageops::FilterType::Nearest)
}

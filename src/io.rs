// ============================================================================
// IMAGE FILE I/O — decoding templates and encoding exports.
//
// Format support comes entirely from the `image` crate feature set:
// PNG, JPEG, WEBP and BMP, chosen by file extension.
// ============================================================================

use std::path::Path;

use crate::canvas::Bitmap;
use crate::error::{EditorError, Result};
use crate::log_info;

/// Largest accepted image dimension per axis. Guards against decompression
/// bombs in user-supplied templates and project files.
pub const MAX_IMAGE_DIM: u32 = 16_384;

/// Decode an image file into an RGBA bitmap.
pub fn load_image(path: &Path) -> Result<Bitmap> {
    let img = image::open(path)?.to_rgba8();
    check_dimensions(img.dimensions())?;
    log_info!(
        "loaded {} ({}x{})",
        path.display(),
        img.width(),
        img.height()
    );
    Ok(img)
}

/// Decode an in-memory image (project files embed layers as PNG bytes).
pub fn decode_image(bytes: &[u8]) -> Result<Bitmap> {
    let img = image::load_from_memory(bytes)?.to_rgba8();
    check_dimensions(img.dimensions())?;
    Ok(img)
}

/// Encode a bitmap to PNG bytes in memory.
pub fn encode_png(img: &Bitmap) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img.clone()).write_to(
        &mut std::io::Cursor::new(&mut buf),
        image::ImageOutputFormat::Png,
    )?;
    Ok(buf)
}

/// Write a bitmap to disk, format inferred from the extension.
pub fn save_image(img: &Bitmap, path: &Path) -> Result<()> {
    img.save(path)?;
    log_info!(
        "saved {} ({}x{})",
        path.display(),
        img.width(),
        img.height()
    );
    Ok(())
}

fn check_dimensions((w, h): (u32, u32)) -> Result<()> {
    if w == 0 || h == 0 {
        return Err(EditorError::InvalidGeometry("image has a zero dimension"));
    }
    if w > MAX_IMAGE_DIM || h > MAX_IMAGE_DIM {
        return Err(EditorError::InvalidGeometry("image dimension too large"));
    }
    Ok(())
}

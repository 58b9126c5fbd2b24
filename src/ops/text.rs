// ============================================================================
// TEXT RASTERIZATION — classic meme styling: white fill, black outline.
// ============================================================================

use std::sync::OnceLock;

use ab_glyph::{Font, FontArc, ScaleFont};
use image::{Rgba, RgbaImage};

/// Padding added around the glyph extents on each axis, in pixels.
pub const TEXT_PADDING: f32 = 10.0;

/// Outline stroke width as a fraction of the font size.
const OUTLINE_RATIO: f32 = 0.08;

/// Placeholder metrics used when no system font can be found (bare CI
/// containers). Wide enough to stay visible and hit-testable.
const PLACEHOLDER_ADVANCE: f32 = 0.6;

static SYSTEM_FONT: OnceLock<Option<FontArc>> = OnceLock::new();

/// Best-match system sans-serif, loaded once. `None` when the host has no
/// usable fonts; rendering then falls back to placeholder blocks.
pub fn system_font() -> Option<&'static FontArc> {
    SYSTEM_FONT
        .get_or_init(|| {
            use font_kit::family_name::FamilyName;
            use font_kit::properties::{Properties, Weight};
            use font_kit::source::SystemSource;

            let load = || {
                let mut props = Properties::new();
                props.weight = Weight::BOLD;
                let handle = SystemSource::new()
                    .select_best_match(
                        &[
                            FamilyName::Title("Impact".to_string()),
                            FamilyName::Title("DejaVu Sans".to_string()),
                            FamilyName::SansSerif,
                        ],
                        &props,
                    )
                    .ok()?;
                let font_data = handle.load().ok()?;
                let bytes: Vec<u8> = (*font_data.copy_font_data()?).clone();
                FontArc::try_from_vec(bytes).ok()
            };
            let font = load();
            if font.is_none() {
                crate::log_warn!("no usable system font; captions render as placeholder blocks");
            }
            font
        })
        .as_ref()
}

/// Glyph extents of a single line plus padding. This is what a text
/// layer's width/height are set to on every render.
pub fn measure(text: &str, font_size: f32) -> (f32, f32) {
    match system_font() {
        Some(font) => {
            let scaled = font.as_scaled(font_size);
            let mut width = 0.0f32;
            let mut last = None;
            for ch in text.chars() {
                let id = font.glyph_id(ch);
                if let Some(prev) = last {
                    width += scaled.kern(prev, id);
                }
                width += scaled.h_advance(id);
                last = Some(id);
            }
            let height = scaled.ascent() - scaled.descent();
            (width + TEXT_PADDING, height + TEXT_PADDING)
        }
        None => (
            text.chars().count() as f32 * font_size * PLACEHOLDER_ADVANCE + TEXT_PADDING,
            font_size + TEXT_PADDING,
        ),
    }
}

/// Render one line of text into its own bitmap: black outline of width
/// `font_size * 0.08` under a white fill. The bitmap is exactly
/// [`measure`]-sized; opacity and blending happen at composite time.
pub fn rasterize(text: &str, font_size: f32) -> RgbaImage {
    let (mw, mh) = measure(text, font_size);
    let w = mw.ceil().max(1.0) as u32;
    let h = mh.ceil().max(1.0) as u32;
    let margin = TEXT_PADDING / 2.0;

    let fill = match system_font() {
        Some(font) => glyph_coverage(font, text, font_size, w, h, margin),
        None => placeholder_coverage(text, font_size, w, h, margin),
    };

    // Outline = fill dilated by the stroke radius.
    let radius = (font_size * OUTLINE_RATIO).ceil().max(1.0) as i32;
    let mut outline = vec![0.0f32; (w * h) as usize];
    for y in 0..h as i32 {
        for x in 0..w as i32 {
            let mut best = 0.0f32;
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    if dx * dx + dy * dy > radius * radius {
                        continue;
                    }
                    let sx = x + dx;
                    let sy = y + dy;
                    if sx >= 0 && sy >= 0 && sx < w as i32 && sy < h as i32 {
                        best = best.max(fill[(sy as u32 * w + sx as u32) as usize]);
                    }
                }
            }
            outline[(y as u32 * w + x as u32) as usize] = best;
        }
    }

    let mut out = RgbaImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let i = (y * w + x) as usize;
            let f = fill[i];
            let o = outline[i];
            if o <= 0.0 {
                continue;
            }
            // White fill composited over the black stroke.
            let v = (f * 255.0).clamp(0.0, 255.0) as u8;
            let a = (o * 255.0).clamp(0.0, 255.0) as u8;
            out.put_pixel(x, y, Rgba([v, v, v, a]));
        }
    }
    out
}

fn glyph_coverage(
    font: &FontArc,
    text: &str,
    font_size: f32,
    w: u32,
    h: u32,
    margin: f32,
) -> Vec<f32> {
    let scaled = font.as_scaled(font_size);
    let mut cov = vec![0.0f32; (w * h) as usize];
    let mut cursor_x = margin;
    let baseline = margin + scaled.ascent();
    let mut last = None;

    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = last {
            cursor_x += scaled.kern(prev, id);
        }
        let glyph = id.with_scale_and_position(font_size, ab_glyph::point(cursor_x, baseline));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, c| {
                let px = bounds.min.x as i32 + gx as i32;
                let py = bounds.min.y as i32 + gy as i32;
                if px >= 0 && py >= 0 && (px as u32) < w && (py as u32) < h {
                    let i = (py as u32 * w + px as u32) as usize;
                    cov[i] = cov[i].max(c);
                }
            });
        }
        cursor_x += scaled.h_advance(id);
        last = Some(id);
    }
    cov
}

/// Crude per-character blocks when no font is available. Keeps text layers
/// visible and every downstream test meaningful without system fonts.
fn placeholder_coverage(text: &str, font_size: f32, w: u32, h: u32, margin: f32) -> Vec<f32> {
    let mut cov = vec![0.0f32; (w * h) as usize];
    let advance = font_size * PLACEHOLDER_ADVANCE;
    for (i, ch) in text.chars().enumerate() {
        if ch.is_whitespace() {
            continue;
        }
        let x0 = (margin + i as f32 * advance + advance * 0.1) as u32;
        let x1 = ((margin + (i + 1) as f32 * advance - advance * 0.1) as u32).min(w);
        let y0 = margin as u32;
        let y1 = ((margin + font_size) as u32).min(h);
        for y in y0..y1 {
            for x in x0..x1 {
                cov[(y * w + x) as usize] = 1.0;
            }
        }
    }
    cov
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measure_includes_padding() {
        let (w, h) = measure("HELLO", 60.0);
        assert!(w > TEXT_PADDING);
        assert!(h > TEXT_PADDING);
        // Longer text is wider, same height.
        let (w2, h2) = measure("HELLO WORLD", 60.0);
        assert!(w2 > w);
        assert!((h2 - h).abs() < 1e-3);
    }

    #[test]
    fn empty_text_still_has_padded_extent() {
        let (w, h) = measure("", 60.0);
        assert!(w >= TEXT_PADDING);
        assert!(h >= TEXT_PADDING);
        let bmp = rasterize("", 60.0);
        assert!(bmp.width() >= 1 && bmp.height() >= 1);
    }

    #[test]
    fn rasterized_text_has_ink() {
        let bmp = rasterize("A", 60.0);
        assert_eq!(
            (bmp.width() as f32, bmp.height() as f32),
            {
                let (w, h) = measure("A", 60.0);
                (w.ceil(), h.ceil())
            }
        );
        let opaque = bmp.pixels().filter(|p| p[3] > 0).count();
        assert!(opaque > 0);
        // Outline means some drawn pixels are dark and some are light.
        let dark = bmp.pixels().any(|p| p[3] > 200 && p[0] < 64);
        let light = bmp.pixels().any(|p| p[3] > 200 && p[0] > 192);
        assert!(dark && light);
    }

    #[test]
    fn rasterize_is_deterministic() {
        let a = rasterize("MEME", 48.0);
        let b = rasterize("MEME", 48.0);
        assert_eq!(a.as_raw(), b.as_raw());
    }
}

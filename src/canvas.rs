use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// Flat RGBA8 pixel buffer. Everything in the scene owns its pixels.
pub type Bitmap = RgbaImage;

// ============================================================================
// BLEND MODES
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
}

impl BlendMode {
    /// All modes in UI/selection order.
    pub fn all() -> &'static [BlendMode] {
        &[
            BlendMode::Normal,
            BlendMode::Multiply,
            BlendMode::Screen,
            BlendMode::Overlay,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            BlendMode::Normal => "Normal",
            BlendMode::Multiply => "Multiply",
            BlendMode::Screen => "Screen",
            BlendMode::Overlay => "Overlay",
        }
    }

    /// Convert to a stable u8 for serialization.
    pub fn to_u8(&self) -> u8 {
        match self {
            BlendMode::Normal => 0,
            BlendMode::Multiply => 1,
            BlendMode::Screen => 2,
            BlendMode::Overlay => 3,
        }
    }

    /// Reconstruct from a u8 (defaults to Normal for unknown values).
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => BlendMode::Multiply,
            2 => BlendMode::Screen,
            3 => BlendMode::Overlay,
            _ => BlendMode::Normal,
        }
    }
}

/// Composite `top` over `base` with the given mode and an extra opacity
/// factor applied to the top pixel's alpha.
pub fn blend_pixel(base: Rgba<u8>, top: Rgba<u8>, mode: BlendMode, opacity: f32) -> Rgba<u8> {
    // Fast path: fully transparent top pixel — nothing to blend
    if top[3] == 0 || opacity <= 0.0 {
        return base;
    }

    // Fast path: Normal blend, full opacity, fully opaque top pixel — overwrite
    if matches!(mode, BlendMode::Normal) && opacity >= 1.0 && top[3] == 255 {
        return top;
    }

    let opacity = opacity.clamp(0.0, 1.0);

    let base_r = base[0] as f32 / 255.0;
    let base_g = base[1] as f32 / 255.0;
    let base_b = base[2] as f32 / 255.0;
    let base_a = base[3] as f32 / 255.0;

    let top_r = top[0] as f32 / 255.0;
    let top_g = top[1] as f32 / 255.0;
    let top_b = top[2] as f32 / 255.0;
    let top_a = (top[3] as f32 / 255.0) * opacity;

    let (r, g, b) = match mode {
        BlendMode::Normal => (top_r, top_g, top_b),
        BlendMode::Multiply => (base_r * top_r, base_g * top_g, base_b * top_b),
        BlendMode::Screen => (
            1.0 - (1.0 - base_r) * (1.0 - top_r),
            1.0 - (1.0 - base_g) * (1.0 - top_g),
            1.0 - (1.0 - base_b) * (1.0 - top_b),
        ),
        BlendMode::Overlay => (
            overlay_channel(base_r, top_r),
            overlay_channel(base_g, top_g),
            overlay_channel(base_b, top_b),
        ),
    };

    let out_a = top_a + base_a * (1.0 - top_a);
    if out_a == 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let out_r = (r * top_a + base_r * base_a * (1.0 - top_a)) / out_a;
    let out_g = (g * top_a + base_g * base_a * (1.0 - top_a)) / out_a;
    let out_b = (b * top_a + base_b * base_a * (1.0 - top_a)) / out_a;

    Rgba([
        (out_r * 255.0).clamp(0.0, 255.0) as u8,
        (out_g * 255.0).clamp(0.0, 255.0) as u8,
        (out_b * 255.0).clamp(0.0, 255.0) as u8,
        (out_a * 255.0).clamp(0.0, 255.0) as u8,
    ])
}

fn overlay_channel(base: f32, top: f32) -> f32 {
    if base < 0.5 {
        2.0 * base * top
    } else {
        1.0 - 2.0 * (1.0 - base) * (1.0 - top)
    }
}

// ============================================================================
// LAYERS
// ============================================================================

/// What a layer draws. The discriminant decides rendering, hit sizing and
/// serialization; there is no virtual dispatch anywhere.
#[derive(Clone, Debug, PartialEq)]
pub enum LayerContent {
    /// Overlay bitmap, exclusively owned. Width/height are fixed at creation
    /// to the bitmap's pixel dimensions.
    Image { pixels: Bitmap },
    /// Single-line string. Width/height are re-measured from glyph extents
    /// on every render.
    Text { text: String, font_size: f32 },
}

/// One transformable element composited over the base image.
///
/// `x`/`y` are the layer CENTER in coordinates normalized to the base image.
/// `width`/`height` are in base-image pixels (pre-scale).
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    pub content: LayerContent,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub scale: f32,
    pub rotation: f32,
    pub opacity: f32,
    pub blend_mode: BlendMode,
}

impl Layer {
    /// New text layer centered on the image, default meme styling.
    pub fn new_text(text: impl Into<String>, font_size: f32) -> Self {
        Self {
            content: LayerContent::Text {
                text: text.into(),
                font_size,
            },
            x: 0.5,
            y: 0.5,
            // Measured on first render.
            width: 0.0,
            height: 0.0,
            scale: 1.0,
            rotation: 0.0,
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
        }
    }

    /// New image layer centered on the image at its intrinsic pixel size.
    pub fn new_image(pixels: Bitmap) -> Self {
        let (w, h) = pixels.dimensions();
        Self {
            content: LayerContent::Image { pixels },
            x: 0.5,
            y: 0.5,
            width: w as f32,
            height: h as f32,
            scale: 1.0,
            rotation: 0.0,
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.content, LayerContent::Text { .. })
    }
}

// ============================================================================
// CROP RECTANGLE
// ============================================================================

/// Pending crop selection in coordinates normalized to the base image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Default for CropRect {
    fn default() -> Self {
        CropRect::FULL
    }
}

impl CropRect {
    pub const FULL: CropRect = CropRect {
        x: 0.0,
        y: 0.0,
        w: 1.0,
        h: 1.0,
    };

    /// Smallest allowed edge length (normalized).
    pub const MIN_SIZE: f32 = 0.05;

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn contains(&self, nx: f32, ny: f32) -> bool {
        nx > self.x && nx < self.right() && ny > self.y && ny < self.bottom()
    }

    /// Centered "contain" crop for a target aspect ratio, given the base
    /// image's dimensions. Used by the 1:1 / 4:3 / 16:9 preset buttons.
    pub fn for_aspect(target_ratio: f32, img_w: u32, img_h: u32) -> CropRect {
        let current_ratio = img_w as f32 / img_h as f32;
        if current_ratio > target_ratio {
            let w = target_ratio / current_ratio;
            CropRect {
                x: (1.0 - w) / 2.0,
                y: 0.0,
                w,
                h: 1.0,
            }
        } else {
            let h = current_ratio / target_ratio;
            CropRect {
                x: 0.0,
                y: (1.0 - h) / 2.0,
                w: 1.0,
                h,
            }
        }
    }
}

// ============================================================================
// SCENE
// ============================================================================

/// The full editable document: base template, layer stack, selection,
/// pending crop and global filter toggles.
///
/// The selection is an index into `layers`, never a reference — any code
/// that replaces the vector wholesale (undo/redo, load, clear) must also
/// reset it, which [`Scene::replace_layers`] enforces.
#[derive(Default)]
pub struct Scene {
    pub base: Option<Bitmap>,
    pub layers: Vec<Layer>,
    pub selected: Option<usize>,
    pub crop: CropRect,
    pub crop_mode: bool,
    pub deep_fry: bool,
    pub cinematic: bool,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_base(&self) -> bool {
        self.base.is_some()
    }

    /// Base image dimensions, or (0,0) when nothing is loaded.
    pub fn base_dimensions(&self) -> (u32, u32) {
        self.base.as_ref().map(|b| b.dimensions()).unwrap_or((0, 0))
    }

    /// Replace the base template. This is a hard reset of the layer stack
    /// and selection; the caller (Editor) also clears history.
    pub fn load_base(&mut self, bitmap: Bitmap) {
        self.base = Some(bitmap);
        self.layers.clear();
        self.selected = None;
        self.crop = CropRect::FULL;
        self.crop_mode = false;
    }

    /// Drop everything, including filter toggles.
    pub fn clear(&mut self) {
        *self = Scene::new();
    }

    /// Swap in a whole new layer vector (undo/redo). Clears the selection
    /// so it can never dangle into the old sequence.
    pub fn replace_layers(&mut self, layers: Vec<Layer>) -> Vec<Layer> {
        self.selected = None;
        std::mem::replace(&mut self.layers, layers)
    }

    pub fn selected_layer(&self) -> Option<&Layer> {
        self.selected.and_then(|i| self.layers.get(i))
    }

    pub fn selected_layer_mut(&mut self) -> Option<&mut Layer> {
        self.selected.and_then(|i| self.layers.get_mut(i))
    }
}

use crate::canvas::{CropRect, Layer, Scene};
use crate::hit::CropHandle;

/// Resize gestures starting closer than this to the layer center (in
/// base-image pixels) never change the scale. Keeps the distance ratio
/// from blowing up.
pub const RESIZE_DEAD_ZONE_PX: f32 = 5.0;

pub const MIN_SCALE: f32 = 0.1;
pub const MAX_SCALE: f32 = 5.0;

/// One in-flight pointer gesture. Each dragging variant carries the
/// gesture-start values it needs, so every motion event recomputes the
/// target from the start state plus the current pointer — no accumulated
/// per-event deltas, no drift.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DragState {
    Idle,
    LayerMove {
        index: usize,
        start_pointer: (f32, f32),
        start_pos: (f32, f32),
    },
    LayerResize {
        index: usize,
        start_dist_px: f32,
        start_scale: f32,
    },
    CropMove {
        start_pointer: (f32, f32),
        start_origin: (f32, f32),
    },
    CropResize {
        handle: CropHandle,
    },
}

impl Default for DragState {
    fn default() -> Self {
        DragState::Idle
    }
}

impl DragState {
    pub fn is_active(&self) -> bool {
        !matches!(self, DragState::Idle)
    }

    pub fn begin_layer_move(index: usize, layer: &Layer, nx: f32, ny: f32) -> DragState {
        DragState::LayerMove {
            index,
            start_pointer: (nx, ny),
            start_pos: (layer.x, layer.y),
        }
    }

    /// Start a corner resize. The start distance is measured in base-image
    /// pixels so the dead zone is a physical size, not a normalized one.
    pub fn begin_layer_resize(
        index: usize,
        layer: &Layer,
        nx: f32,
        ny: f32,
        img_w: u32,
        img_h: u32,
    ) -> DragState {
        let dx = (nx - layer.x) * img_w as f32;
        let dy = (ny - layer.y) * img_h as f32;
        DragState::LayerResize {
            index,
            start_dist_px: (dx * dx + dy * dy).sqrt(),
            start_scale: layer.scale,
        }
    }

    pub fn begin_crop(handle: CropHandle, crop: &CropRect, nx: f32, ny: f32) -> DragState {
        match handle {
            CropHandle::Move => DragState::CropMove {
                start_pointer: (nx, ny),
                start_origin: (crop.x, crop.y),
            },
            _ => DragState::CropResize { handle },
        }
    }

    /// Apply the current pointer position to the scene. A no-op when idle
    /// or when the dragged layer no longer exists.
    pub fn update(&self, scene: &mut Scene, nx: f32, ny: f32) {
        match *self {
            DragState::Idle => {}

            DragState::LayerMove {
                index,
                start_pointer,
                start_pos,
            } => {
                if let Some(layer) = scene.layers.get_mut(index) {
                    layer.x = (start_pos.0 + (nx - start_pointer.0)).clamp(0.0, 1.0);
                    layer.y = (start_pos.1 + (ny - start_pointer.1)).clamp(0.0, 1.0);
                }
            }

            DragState::LayerResize {
                index,
                start_dist_px,
                start_scale,
            } => {
                if start_dist_px <= RESIZE_DEAD_ZONE_PX {
                    return;
                }
                let (img_w, img_h) = scene.base_dimensions();
                if let Some(layer) = scene.layers.get_mut(index) {
                    let dx = (nx - layer.x) * img_w as f32;
                    let dy = (ny - layer.y) * img_h as f32;
                    let dist = (dx * dx + dy * dy).sqrt();
                    let ratio = dist / start_dist_px;
                    layer.scale = (start_scale * ratio).clamp(MIN_SCALE, MAX_SCALE);
                }
            }

            DragState::CropMove {
                start_pointer,
                start_origin,
            } => {
                let crop = &mut scene.crop;
                crop.x = (start_origin.0 + (nx - start_pointer.0)).clamp(0.0, 1.0 - crop.w);
                crop.y = (start_origin.1 + (ny - start_pointer.1)).clamp(0.0, 1.0 - crop.h);
            }

            DragState::CropResize { handle } => {
                resize_crop(&mut scene.crop, handle, nx, ny);
            }
        }
    }
}

/// Move the edges named by `handle` to follow the pointer, holding the
/// opposite edges fixed. Each axis clamps independently to stay inside
/// the image and above the minimum crop size.
fn resize_crop(crop: &mut CropRect, handle: CropHandle, nx: f32, ny: f32) {
    use CropHandle::*;
    let min = CropRect::MIN_SIZE;

    let touches_left = matches!(handle, TopLeft | BottomLeft | Left);
    let touches_right = matches!(handle, TopRight | BottomRight | Right);
    let touches_top = matches!(handle, TopLeft | TopRight | Top);
    let touches_bottom = matches!(handle, BottomLeft | BottomRight | Bottom);

    if touches_left {
        let right = crop.right();
        let new_x = nx.clamp(0.0, right - min);
        crop.w = right - new_x;
        crop.x = new_x;
    }
    if touches_right {
        let new_right = nx.clamp(crop.x + min, 1.0);
        crop.w = new_right - crop.x;
    }
    if touches_top {
        let bottom = crop.bottom();
        let new_y = ny.clamp(0.0, bottom - min);
        crop.h = bottom - new_y;
        crop.y = new_y;
    }
    if touches_bottom {
        let new_bottom = ny.clamp(crop.y + min, 1.0);
        crop.h = new_bottom - crop.y;
    }
}

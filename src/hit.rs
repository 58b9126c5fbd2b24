use crate::canvas::{CropRect, Layer, Scene};
use crate::geometry;

/// How far from a crop edge or corner (normalized units) a press still
/// grabs the handle.
pub const CROP_HANDLE_RADIUS: f32 = 0.05;

/// Screen-pixel margin inside a selected layer's corners that starts a
/// resize instead of a move.
pub const RESIZE_CORNER_MARGIN_PX: f32 = 20.0;

/// Which part of the crop rectangle a press landed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CropHandle {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Top,
    Bottom,
    Left,
    Right,
    /// Inside the rectangle: the whole selection moves.
    Move,
}

impl CropHandle {
    /// CSS cursor name shown while hovering the handle.
    pub fn cursor_name(&self) -> &'static str {
        match self {
            CropHandle::TopLeft => "nw-resize",
            CropHandle::TopRight => "ne-resize",
            CropHandle::BottomLeft => "sw-resize",
            CropHandle::BottomRight => "se-resize",
            CropHandle::Top => "n-resize",
            CropHandle::Bottom => "s-resize",
            CropHandle::Left => "w-resize",
            CropHandle::Right => "e-resize",
            CropHandle::Move => "move",
        }
    }
}

/// Crop handle under a normalized image point, or `None` outside the
/// selection. Corners win over edges, edges over the interior, in a fixed
/// order so overlapping zones on tiny rectangles resolve the same way
/// every time.
pub fn crop_handle_at(nx: f32, ny: f32, crop: &CropRect) -> Option<CropHandle> {
    let r = CROP_HANDLE_RADIUS;
    let near = |a: f32, b: f32| (a - b).abs() < r;

    let near_left = near(nx, crop.x);
    let near_right = near(nx, crop.right());
    let near_top = near(ny, crop.y);
    let near_bottom = near(ny, crop.bottom());
    let in_x_span = nx > crop.x - r && nx < crop.right() + r;
    let in_y_span = ny > crop.y - r && ny < crop.bottom() + r;

    if near_left && near_top {
        Some(CropHandle::TopLeft)
    } else if near_right && near_top {
        Some(CropHandle::TopRight)
    } else if near_left && near_bottom {
        Some(CropHandle::BottomLeft)
    } else if near_right && near_bottom {
        Some(CropHandle::BottomRight)
    } else if near_top && in_x_span {
        Some(CropHandle::Top)
    } else if near_bottom && in_x_span {
        Some(CropHandle::Bottom)
    } else if near_left && in_y_span {
        Some(CropHandle::Left)
    } else if near_right && in_y_span {
        Some(CropHandle::Right)
    } else if crop.contains(nx, ny) {
        Some(CropHandle::Move)
    } else {
        None
    }
}

/// Layer-stack hit result: which layer, and whether the press landed in a
/// resize corner (selected layer only) or its body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerHit {
    Resize(usize),
    Move(usize),
}

impl LayerHit {
    pub fn index(&self) -> usize {
        match self {
            LayerHit::Resize(i) | LayerHit::Move(i) => *i,
        }
    }

    pub fn cursor_name(&self) -> &'static str {
        match self {
            LayerHit::Resize(_) => "se-resize",
            LayerHit::Move(_) => "grab",
        }
    }
}

/// Topmost layer under a normalized point, scanning the stack from the top
/// down. Bounding boxes are axis-aligned and deliberately ignore rotation:
/// a rotated layer is still grabbed by its unrotated footprint.
///
/// `viewport` is the preview widget's size in pixels; it converts the
/// fixed screen-pixel corner margin into normalized units.
pub fn layer_at(scene: &Scene, nx: f32, ny: f32, viewport: (f32, f32)) -> Option<LayerHit> {
    let (img_w, img_h) = scene.base_dimensions();
    if img_w == 0 || img_h == 0 {
        return None;
    }

    for (idx, layer) in scene.layers.iter().enumerate().rev() {
        let half_w = (layer.width * layer.scale) / (2.0 * img_w as f32);
        let half_h = (layer.height * layer.scale) / (2.0 * img_h as f32);
        if nx < layer.x - half_w
            || nx > layer.x + half_w
            || ny < layer.y - half_h
            || ny > layer.y + half_h
        {
            continue;
        }

        // Corner zones only exist on the already-selected layer, so a
        // first click on an unselected layer always selects-and-moves.
        if scene.selected == Some(idx) {
            let s = geometry::fit_scale(viewport.0, viewport.1, img_w, img_h);
            if s > 0.0 {
                let margin_x = RESIZE_CORNER_MARGIN_PX / (img_w as f32 * s);
                let margin_y = RESIZE_CORNER_MARGIN_PX / (img_h as f32 * s);
                let near_x =
                    (nx - (layer.x - half_w)).abs() < margin_x || (nx - (layer.x + half_w)).abs() < margin_x;
                let near_y =
                    (ny - (layer.y - half_h)).abs() < margin_y || (ny - (layer.y + half_h)).abs() < margin_y;
                if near_x && near_y {
                    return Some(LayerHit::Resize(idx));
                }
            }
        }

        return Some(LayerHit::Move(idx));
    }
    None
}

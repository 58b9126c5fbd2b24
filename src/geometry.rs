// ============================================================================
// COORDINATE MAPPING
//
// The preview widget letterboxes the image with a "contain" fit: scale to
// the largest factor that fits both axes, then center. All pointer input
// crosses through here exactly once on its way into scene coordinates.
// ============================================================================

/// Contain-fit scale factor for an `iw`x`ih` image inside a `vw`x`vh`
/// viewport. Degenerate extents yield 0.0.
pub fn fit_scale(vw: f32, vh: f32, iw: u32, ih: u32) -> f32 {
    if vw <= 0.0 || vh <= 0.0 || iw == 0 || ih == 0 {
        return 0.0;
    }
    (vw / iw as f32).min(vh / ih as f32)
}

/// Map a widget-space point to normalized image coordinates. The result is
/// deliberately NOT clamped: points in the letterbox bands map outside
/// [0,1], and hit-testing relies on that to reject them.
pub fn widget_to_image(px: f32, py: f32, vw: f32, vh: f32, iw: u32, ih: u32) -> (f32, f32) {
    let s = fit_scale(vw, vh, iw, ih);
    if s <= 0.0 {
        return (0.0, 0.0);
    }
    let draw_w = iw as f32 * s;
    let draw_h = ih as f32 * s;
    let off_x = (vw - draw_w) / 2.0;
    let off_y = (vh - draw_h) / 2.0;
    ((px - off_x) / draw_w, (py - off_y) / draw_h)
}

/// Inverse of [`widget_to_image`].
pub fn image_to_widget(nx: f32, ny: f32, vw: f32, vh: f32, iw: u32, ih: u32) -> (f32, f32) {
    let s = fit_scale(vw, vh, iw, ih);
    if s <= 0.0 {
        return (0.0, 0.0);
    }
    let draw_w = iw as f32 * s;
    let draw_h = ih as f32 * s;
    let off_x = (vw - draw_w) / 2.0;
    let off_y = (vh - draw_h) / 2.0;
    (off_x + nx * draw_w, off_y + ny * draw_h)
}

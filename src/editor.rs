// ============================================================================
// EDITOR FACADE — the one stateful object a frontend talks to.
//
// Owns the scene, the undo history and the in-flight drag. Pointer input
// arrives in widget pixels and is mapped through `geometry`; everything
// else speaks normalized scene coordinates.
//
// History discipline: a snapshot is pushed BEFORE any mutation it should
// undo — at gesture begin for layer drags, and immediately before
// structural edits (add/delete layer, property changes, crop apply,
// rotate/flip). Crop-rectangle dragging itself never touches history;
// only the apply commits.
// ============================================================================

use std::path::Path;

use crate::canvas::{Bitmap, CropRect, Layer, LayerContent, Scene};
use crate::error::Result;
use crate::geometry;
use crate::history::History;
use crate::hit::{self, LayerHit};
use crate::interaction::DragState;
use crate::ops::{canvas_ops, text};
use crate::render::{self, RenderOptions};
use crate::{io, log_info, project};

/// Default label and size for a freshly added text layer.
const DEFAULT_TEXT: &str = "Text";
const DEFAULT_FONT_SIZE: f32 = 60.0;

pub struct Editor {
    pub scene: Scene,
    history: History,
    drag: DragState,
    /// Seed for the deep-fry noise. Fixed per editor so repeated renders
    /// of an unchanged scene are byte-identical.
    noise_seed: u64,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    pub fn new() -> Self {
        Self {
            scene: Scene::new(),
            history: History::new(),
            drag: DragState::Idle,
            noise_seed: 0,
        }
    }

    pub fn set_noise_seed(&mut self, seed: u64) {
        self.noise_seed = seed;
    }

    // ------------------------------------------------------------------
    // Document lifecycle
    // ------------------------------------------------------------------

    /// Load a new base template from disk. Hard reset: layers, selection,
    /// crop and the entire history are dropped.
    pub fn load_base(&mut self, path: &Path) -> Result<()> {
        let bitmap = io::load_image(path)?;
        self.load_base_bitmap(bitmap);
        Ok(())
    }

    pub fn load_base_bitmap(&mut self, bitmap: Bitmap) {
        self.scene.load_base(bitmap);
        self.history.clear();
        self.drag = DragState::Idle;
    }

    /// Drop the whole document, filter toggles included.
    pub fn clear(&mut self) {
        self.scene.clear();
        self.history.clear();
        self.drag = DragState::Idle;
        log_info!("document cleared");
    }

    pub fn save_project(&self, path: &Path) -> Result<()> {
        project::save_project(&self.scene, path)
    }

    pub fn load_project(&mut self, path: &Path) -> Result<()> {
        let scene = project::load_project(path)?;
        self.scene = scene;
        self.history.clear();
        self.drag = DragState::Idle;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Layer management
    // ------------------------------------------------------------------

    /// Add a default text layer at the image center and select it.
    pub fn add_text_layer(&mut self) -> usize {
        self.push_history();
        let mut layer = Layer::new_text(DEFAULT_TEXT, DEFAULT_FONT_SIZE);
        let (w, h) = text::measure(DEFAULT_TEXT, DEFAULT_FONT_SIZE);
        layer.width = w;
        layer.height = h;
        self.scene.layers.push(layer);
        let idx = self.scene.layers.len() - 1;
        self.scene.selected = Some(idx);
        log_info!("added text layer #{}", idx);
        idx
    }

    /// Add an image (sticker) layer from a decoded bitmap and select it.
    pub fn add_image_layer(&mut self, pixels: Bitmap) -> usize {
        self.push_history();
        self.scene.layers.push(Layer::new_image(pixels));
        let idx = self.scene.layers.len() - 1;
        self.scene.selected = Some(idx);
        log_info!("added image layer #{}", idx);
        idx
    }

    pub fn add_image_layer_from_file(&mut self, path: &Path) -> Result<usize> {
        let pixels = io::load_image(path)?;
        Ok(self.add_image_layer(pixels))
    }

    pub fn delete_selected_layer(&mut self) -> bool {
        let Some(idx) = self.scene.selected else {
            return false;
        };
        self.push_history();
        self.scene.layers.remove(idx);
        self.scene.selected = None;
        log_info!("deleted layer #{}", idx);
        true
    }

    pub fn select_layer(&mut self, index: usize) {
        if index < self.scene.layers.len() {
            self.scene.selected = Some(index);
        }
    }

    pub fn deselect(&mut self) {
        self.scene.selected = None;
    }

    /// Edit the selected text layer's string. Live, no history push — a
    /// keystroke-driven control would flood the stack. No-op on image
    /// layers.
    pub fn set_selected_text(&mut self, new_text: &str) -> bool {
        if let Some(layer) = self.scene.selected_layer_mut()
            && let LayerContent::Text { text, .. } = &mut layer.content
        {
            *text = new_text.to_string();
            true
        } else {
            false
        }
    }

    pub fn set_selected_font_size(&mut self, size: f32) -> bool {
        if let Some(layer) = self.scene.selected_layer_mut()
            && let LayerContent::Text { font_size, .. } = &mut layer.content
        {
            *font_size = size.max(1.0);
            true
        } else {
            false
        }
    }

    pub fn set_selected_opacity(&mut self, opacity: f32) -> bool {
        if let Some(layer) = self.scene.selected_layer_mut() {
            layer.opacity = opacity.clamp(0.0, 1.0);
            true
        } else {
            false
        }
    }

    pub fn set_selected_rotation(&mut self, radians: f32) -> bool {
        if let Some(layer) = self.scene.selected_layer_mut() {
            layer.rotation = radians;
            true
        } else {
            false
        }
    }

    pub fn set_selected_blend_mode(&mut self, mode: crate::canvas::BlendMode) -> bool {
        if let Some(layer) = self.scene.selected_layer_mut() {
            layer.blend_mode = mode;
            true
        } else {
            false
        }
    }

    // ------------------------------------------------------------------
    // Pointer gestures (widget-space input)
    // ------------------------------------------------------------------

    /// Pointer press. In crop mode this grabs a crop handle; otherwise it
    /// hit-tests the layer stack, updating the selection. Mutation-bearing
    /// layer drags snapshot history here; crop drags do not.
    pub fn pointer_press(&mut self, px: f32, py: f32, viewport: (f32, f32)) {
        let (img_w, img_h) = self.scene.base_dimensions();
        if img_w == 0 || img_h == 0 {
            return;
        }
        let (nx, ny) = geometry::widget_to_image(px, py, viewport.0, viewport.1, img_w, img_h);

        if self.scene.crop_mode {
            if let Some(handle) = hit::crop_handle_at(nx, ny, &self.scene.crop) {
                self.drag = DragState::begin_crop(handle, &self.scene.crop, nx, ny);
            }
            return;
        }

        match hit::layer_at(&self.scene, nx, ny, viewport) {
            Some(LayerHit::Resize(idx)) => {
                self.scene.selected = Some(idx);
                self.push_history();
                self.drag = DragState::begin_layer_resize(
                    idx,
                    &self.scene.layers[idx],
                    nx,
                    ny,
                    img_w,
                    img_h,
                );
            }
            Some(LayerHit::Move(idx)) => {
                self.scene.selected = Some(idx);
                self.push_history();
                self.drag = DragState::begin_layer_move(idx, &self.scene.layers[idx], nx, ny);
            }
            None => {
                self.scene.selected = None;
            }
        }
    }

    pub fn pointer_motion(&mut self, px: f32, py: f32, viewport: (f32, f32)) {
        let (img_w, img_h) = self.scene.base_dimensions();
        if img_w == 0 || img_h == 0 || !self.drag.is_active() {
            return;
        }
        let (nx, ny) = geometry::widget_to_image(px, py, viewport.0, viewport.1, img_w, img_h);
        let drag = self.drag;
        drag.update(&mut self.scene, nx, ny);
    }

    /// Pointer release: the gesture ends, final values stay committed.
    pub fn pointer_release(&mut self) {
        self.drag = DragState::Idle;
    }

    /// Cursor name for hover feedback at a widget position.
    pub fn cursor_at(&self, px: f32, py: f32, viewport: (f32, f32)) -> &'static str {
        let (img_w, img_h) = self.scene.base_dimensions();
        if img_w == 0 || img_h == 0 {
            return "default";
        }
        let (nx, ny) = geometry::widget_to_image(px, py, viewport.0, viewport.1, img_w, img_h);
        if self.scene.crop_mode {
            return hit::crop_handle_at(nx, ny, &self.scene.crop)
                .map(|h| h.cursor_name())
                .unwrap_or("default");
        }
        hit::layer_at(&self.scene, nx, ny, viewport)
            .map(|h| h.cursor_name())
            .unwrap_or("default")
    }

    pub fn drag_active(&self) -> bool {
        self.drag.is_active()
    }

    // ------------------------------------------------------------------
    // Undo / redo
    // ------------------------------------------------------------------

    /// Step back one snapshot. Underflow is a strict no-op: nothing in
    /// the scene, the selection included, changes.
    pub fn undo(&mut self) -> bool {
        if !self.history.can_undo() {
            return false;
        }
        let current = self.scene.replace_layers(Vec::new());
        match self.history.undo(current) {
            Ok(restored) => {
                self.scene.replace_layers(restored);
                true
            }
            Err(current) => {
                self.scene.replace_layers(current);
                false
            }
        }
    }

    pub fn redo(&mut self) -> bool {
        if !self.history.can_redo() {
            return false;
        }
        let current = self.scene.replace_layers(Vec::new());
        match self.history.redo(current) {
            Ok(restored) => {
                self.scene.replace_layers(restored);
                true
            }
            Err(current) => {
                self.scene.replace_layers(current);
                false
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn push_history(&mut self) {
        self.history.push(self.scene.layers.clone());
    }

    // ------------------------------------------------------------------
    // Crop mode
    // ------------------------------------------------------------------

    pub fn enter_crop_mode(&mut self) {
        self.scene.crop_mode = true;
        self.scene.crop = CropRect::FULL;
    }

    /// Leave crop mode without committing; the pending rect is discarded.
    pub fn cancel_crop(&mut self) {
        self.scene.crop_mode = false;
        self.scene.crop = CropRect::FULL;
        self.drag = DragState::Idle;
    }

    /// Snap the pending crop to a preset aspect ratio, centered.
    pub fn set_crop_preset(&mut self, target_ratio: f32) {
        let (w, h) = self.scene.base_dimensions();
        if w == 0 || h == 0 || !self.scene.crop_mode {
            return;
        }
        self.scene.crop = CropRect::for_aspect(target_ratio, w, h);
    }

    /// Commit the pending crop: replace the base with the sub-image and
    /// remap every layer into the new coordinate frame. One history push
    /// covers the layer remap; the base swap itself is not undoable.
    pub fn apply_crop(&mut self) -> bool {
        let Some(base) = self.scene.base.as_ref() else {
            return false;
        };
        if !self.scene.crop_mode {
            return false;
        }
        let (img_w, img_h) = base.dimensions();
        let crop = self.scene.crop;
        let new_base = canvas_ops::apply_crop(base, &crop);

        self.push_history();
        canvas_ops::remap_layers_for_crop(&mut self.scene.layers, &crop, img_w, img_h);
        self.scene.base = Some(new_base);
        self.scene.crop = CropRect::FULL;
        self.scene.crop_mode = false;
        self.drag = DragState::Idle;
        log_info!("applied crop ({:.2},{:.2} {:.2}x{:.2})", crop.x, crop.y, crop.w, crop.h);
        true
    }

    // ------------------------------------------------------------------
    // Base transforms
    // ------------------------------------------------------------------

    pub fn rotate_base_cw(&mut self) -> bool {
        self.transform_base(canvas_ops::rotate_cw)
    }

    pub fn rotate_base_ccw(&mut self) -> bool {
        self.transform_base(canvas_ops::rotate_ccw)
    }

    pub fn flip_base_horizontal(&mut self) -> bool {
        self.transform_base(canvas_ops::flip_horizontal)
    }

    pub fn flip_base_vertical(&mut self) -> bool {
        self.transform_base(canvas_ops::flip_vertical)
    }

    fn transform_base(&mut self, op: fn(&Bitmap) -> Bitmap) -> bool {
        let Some(base) = self.scene.base.as_ref() else {
            return false;
        };
        let new_base = op(base);
        self.push_history();
        self.scene.base = Some(new_base);
        true
    }

    // ------------------------------------------------------------------
    // Filters
    // ------------------------------------------------------------------

    pub fn set_deep_fry(&mut self, on: bool) {
        self.scene.deep_fry = on;
    }

    pub fn set_cinematic(&mut self, on: bool) {
        self.scene.cinematic = on;
    }

    // ------------------------------------------------------------------
    // Rendering and export
    // ------------------------------------------------------------------

    /// Final composite, no editing chrome. `None` without a base image.
    pub fn render(&mut self) -> Option<Bitmap> {
        self.sync_text_metrics();
        render::render(
            &self.scene,
            RenderOptions::from_scene(&self.scene, self.drag.is_active(), self.noise_seed),
        )
    }

    /// Composite plus crop shading / handles / selection outline, for
    /// on-screen preview.
    pub fn render_preview(&mut self) -> Option<Bitmap> {
        let mut composite = self.render()?;
        render::render_overlay(&mut composite, &self.scene);
        Some(composite)
    }

    pub fn can_export(&self) -> bool {
        self.scene.has_base()
    }

    /// Export to disk. While crop mode is active the pending rectangle is
    /// applied to the exported image (without committing it to the scene).
    pub fn export(&mut self, path: &Path) -> Result<()> {
        let composite = self.render().ok_or(crate::error::EditorError::InvalidGeometry(
            "no base image to export",
        ))?;
        let out = if self.scene.crop_mode {
            canvas_ops::apply_crop(&composite, &self.scene.crop)
        } else {
            composite
        };
        io::save_image(&out, path)
    }

    /// Text layer extents depend on the rasterizer, so they are refreshed
    /// from glyph metrics before every render and hit-test cycle.
    fn sync_text_metrics(&mut self) {
        for layer in &mut self.scene.layers {
            if let LayerContent::Text { text, font_size } = &layer.content {
                let (w, h) = text::measure(text, *font_size);
                layer.width = w;
                layer.height = h;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn editor_with_base(w: u32, h: u32) -> Editor {
        let mut editor = Editor::new();
        editor.load_base_bitmap(Bitmap::from_pixel(w, h, Rgba([255, 255, 255, 255])));
        editor
    }

    fn editor_with_sticker() -> Editor {
        let mut editor = editor_with_base(400, 400);
        editor.add_image_layer(Bitmap::from_pixel(100, 100, Rgba([255, 0, 0, 255])));
        editor
    }

    #[test]
    fn move_gesture_pushes_one_undo_step() {
        let mut editor = editor_with_sticker();
        let undo_before = editor.can_undo(); // add_image_layer pushed one
        assert!(undo_before);

        // Press on the layer center, drag right, release.
        editor.pointer_press(200.0, 200.0, (400.0, 400.0));
        assert!(editor.drag_active());
        editor.pointer_motion(280.0, 200.0, (400.0, 400.0));
        editor.pointer_motion(300.0, 200.0, (400.0, 400.0));
        editor.pointer_release();

        assert!((editor.scene.layers[0].x - 0.75).abs() < 1e-4);

        // One undo reverts the whole gesture, not each motion event.
        assert!(editor.undo());
        assert!((editor.scene.layers[0].x - 0.5).abs() < 1e-4);
    }

    #[test]
    fn press_on_empty_space_deselects() {
        let mut editor = editor_with_sticker();
        assert_eq!(editor.scene.selected, Some(0));
        editor.pointer_press(20.0, 20.0, (400.0, 400.0));
        assert_eq!(editor.scene.selected, None);
        assert!(!editor.drag_active());
    }

    #[test]
    fn resize_gesture_on_selected_corner() {
        let mut editor = editor_with_sticker();
        // Layer spans 150..250 in widget space; the corner margin is 20px.
        editor.pointer_press(245.0, 245.0, (400.0, 400.0));
        assert!(editor.drag_active());
        editor.pointer_motion(290.0, 290.0, (400.0, 400.0));
        editor.pointer_release();
        assert!(editor.scene.layers[0].scale > 1.0);
    }

    #[test]
    fn undo_redo_restores_layer_stack() {
        let mut editor = editor_with_base(200, 200);
        editor.add_text_layer();
        assert_eq!(editor.scene.layers.len(), 1);
        assert!(editor.undo());
        assert!(editor.scene.layers.is_empty());
        assert!(editor.redo());
        assert_eq!(editor.scene.layers.len(), 1);
        assert!(!editor.redo());
    }

    #[test]
    fn undo_underflow_leaves_selection_alone() {
        let mut editor = editor_with_base(100, 100);
        // A layer that entered the scene without a history entry, as after
        // a project load: the undo stack is empty but a selection exists.
        editor.scene.layers.push(Layer::new_text("hi", 30.0));
        editor.scene.selected = Some(0);

        assert!(!editor.undo());
        assert_eq!(editor.scene.selected, Some(0));
        assert_eq!(editor.scene.layers.len(), 1);

        assert!(!editor.redo());
        assert_eq!(editor.scene.selected, Some(0));
    }

    #[test]
    fn crop_apply_quadrant_remaps_layers() {
        let mut editor = editor_with_base(400, 400);
        editor.add_image_layer(Bitmap::from_pixel(20, 20, Rgba([0, 255, 0, 255])));
        editor.scene.layers[0].x = 0.25;
        editor.scene.layers[0].y = 0.25;

        editor.enter_crop_mode();
        editor.scene.crop = CropRect {
            x: 0.0,
            y: 0.0,
            w: 0.5,
            h: 0.5,
        };
        assert!(editor.apply_crop());

        assert_eq!(editor.scene.base_dimensions(), (200, 200));
        assert!((editor.scene.layers[0].x - 0.5).abs() < 1e-5);
        assert!((editor.scene.layers[0].y - 0.5).abs() < 1e-5);
        assert!(!editor.scene.crop_mode);
        assert_eq!(editor.scene.crop, CropRect::FULL);
    }

    #[test]
    fn crop_drag_does_not_touch_history() {
        let mut editor = editor_with_base(400, 400);
        editor.enter_crop_mode();
        assert!(!editor.can_undo());
        // Grab the bottom-right corner and drag inward.
        editor.pointer_press(400.0, 400.0, (400.0, 400.0));
        assert!(editor.drag_active());
        editor.pointer_motion(300.0, 300.0, (400.0, 400.0));
        editor.pointer_release();
        assert!(!editor.can_undo());
        assert!((editor.scene.crop.w - 0.75).abs() < 1e-4);
        // Applying finally commits one step.
        assert!(editor.apply_crop());
        assert!(editor.can_undo());
    }

    #[test]
    fn text_layer_defaults() {
        let mut editor = editor_with_base(300, 300);
        let idx = editor.add_text_layer();
        let layer = &editor.scene.layers[idx];
        assert!(layer.is_text());
        assert_eq!((layer.x, layer.y), (0.5, 0.5));
        assert!(layer.width > 0.0 && layer.height > 0.0);
        match &layer.content {
            LayerContent::Text { text, font_size } => {
                assert_eq!(text, "Text");
                assert_eq!(*font_size, 60.0);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn text_edit_is_live_and_image_layers_refuse() {
        let mut editor = editor_with_base(300, 300);
        editor.add_text_layer();
        assert!(editor.set_selected_text("BOTTOM TEXT"));
        // Live edit: no extra history entry beyond the layer add, so one
        // undo removes the layer entirely.
        assert!(editor.undo());
        assert!(editor.scene.layers.is_empty());

        let mut editor = editor_with_base(300, 300);
        editor.add_image_layer(Bitmap::new(10, 10));
        assert!(!editor.set_selected_text("nope"));
        assert!(editor.set_selected_opacity(0.5));
        assert!((editor.scene.layers[0].opacity - 0.5).abs() < 1e-6);
    }

    #[test]
    fn rotate_and_flip_push_history_and_keep_layers() {
        let mut editor = editor_with_base(300, 200);
        editor.add_text_layer();
        assert!(editor.rotate_base_cw());
        assert_eq!(editor.scene.base_dimensions(), (200, 300));
        assert!(editor.flip_base_horizontal());
        assert_eq!(editor.scene.layers.len(), 1);
        // Two base transforms plus the layer add: 3 undo steps.
        assert!(editor.undo() && editor.undo() && editor.undo());
        assert!(!editor.undo());
    }

    #[test]
    fn export_during_crop_mode_crops_output() {
        let mut editor = editor_with_base(100, 100);
        editor.enter_crop_mode();
        editor.scene.crop = CropRect {
            x: 0.0,
            y: 0.0,
            w: 0.5,
            h: 0.5,
        };
        let path = std::env::temp_dir().join(format!(
            "memerist-test-{}-cropexport.png",
            std::process::id()
        ));
        editor.export(&path).unwrap();
        let exported = crate::io::load_image(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(exported.dimensions(), (50, 50));
        // The scene itself is untouched.
        assert_eq!(editor.scene.base_dimensions(), (100, 100));
        assert!(editor.scene.crop_mode);
    }

    #[test]
    fn clear_resets_everything_and_disables_export() {
        let mut editor = editor_with_base(100, 100);
        editor.add_text_layer();
        editor.set_deep_fry(true);
        editor.clear();
        assert!(editor.scene.layers.is_empty());
        assert!(!editor.can_undo());
        assert!(!editor.scene.deep_fry);
        assert!(!editor.can_export());
        assert!(editor.render().is_none());
        assert!(editor.export(Path::new("/tmp/never.png")).is_err());
    }

    #[test]
    fn load_base_resets_history() {
        let mut editor = editor_with_base(100, 100);
        editor.add_text_layer();
        assert!(editor.can_undo());
        editor.load_base_bitmap(Bitmap::new(50, 50));
        assert!(!editor.can_undo());
        assert!(editor.scene.layers.is_empty());
    }

    #[test]
    fn filters_apply_only_when_idle() {
        let mut editor = Editor::new();
        editor.load_base_bitmap(Bitmap::from_pixel(400, 400, Rgba([200, 60, 60, 255])));
        editor.add_image_layer(Bitmap::from_pixel(100, 100, Rgba([255, 0, 0, 255])));
        editor.set_cinematic(true);
        let idle = editor.render().unwrap();

        editor.pointer_press(200.0, 200.0, (400.0, 400.0));
        let dragging = editor.render().unwrap();
        editor.pointer_release();

        // While dragging the composite skips the grade, so the base color
        // passes through unchanged.
        assert_eq!(dragging.get_pixel(5, 5), &Rgba([200, 60, 60, 255]));
        assert_ne!(idle.get_pixel(5, 5), dragging.get_pixel(5, 5));
    }

    #[test]
    fn crop_preset_requires_crop_mode() {
        let mut editor = editor_with_base(400, 200);
        editor.set_crop_preset(1.0);
        assert_eq!(editor.scene.crop, CropRect::FULL);
        editor.enter_crop_mode();
        editor.set_crop_preset(1.0);
        assert!((editor.scene.crop.w - 0.5).abs() < 1e-6);
        assert!((editor.scene.crop.h - 1.0).abs() < 1e-6);
    }
}

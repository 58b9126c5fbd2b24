//! Memerist — a meme-image editor core.
//!
//! The crate is the whole engine behind the GUI: an ordered layer stack
//! (caption text and sticker bitmaps) over a base template, composited by
//! a deterministic CPU renderer, with hit-testing, drag gestures, a
//! bounded undo history, crop tooling, global filters ("cinematic" and
//! deep-fry) and a binary project format.
//!
//! [`editor::Editor`] is the facade a frontend (or the headless CLI in
//! [`cli`]) drives; everything below it is side-effect-free and unit
//! tested in isolation.

pub mod canvas;
pub mod cli;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod history;
pub mod hit;
pub mod interaction;
pub mod io;
pub mod logger;
pub mod ops;
pub mod project;
pub mod render;

pub use canvas::{Bitmap, BlendMode, CropRect, Layer, LayerContent, Scene};
pub use editor::Editor;
pub use error::{EditorError, Result};
pub use render::RenderOptions;

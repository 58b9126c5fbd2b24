use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide error type. Everything here is recoverable: the editor keeps
/// its current document when a load, decode or save fails, and callers on
/// the CLI path surface the message and exit. Conditions that are part of
/// normal operation (empty undo stack, a click that hits nothing) are
/// expressed as `bool` / `Option` results, not errors.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(&'static str),

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("project file error: {0}")]
    Project(String),
}

pub type Result<T> = std::result::Result<T, EditorError>;

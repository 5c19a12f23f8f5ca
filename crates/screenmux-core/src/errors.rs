use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout::WindowHandle;

#[derive(Error, Debug)]
pub enum ScreenMuxError {
    #[error("Configuration invalid: {reason}")]
    ConfigurationInvalid { reason: String },

    #[error("Layout has {count} elements, at most {max} are supported")]
    TooManyElements { count: usize, max: usize },

    #[error("Imaging error: {0}")]
    Imaging(#[from] ErrorCode),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Status codes shared by the imaging types and the engine's status channel.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    #[error("Image has not been created")]
    ImageUninitialized,

    #[error("Buffer size does not match the image geometry")]
    BufferSizeMismatch,

    #[error("Layout parameters failed validation")]
    InvalidLayout,

    #[error("Capture source failed to deliver a bitmap")]
    CaptureFailed,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Window {0} not found")]
    WindowNotFound(WindowHandle),

    #[error("Clipping region {width}x{height} is empty")]
    EmptyClipping { width: u32, height: u32 },

    #[error("Bitmap {width}x{height} needs {} bytes, got {len}", *width as usize * *height as usize * 4)]
    BitmapSizeMismatch { width: u32, height: u32, len: usize },
}

pub mod config;
pub mod errors;
pub mod image;
pub mod layout;
pub mod validate;

pub use config::{load_json, EngineConfig, LayoutProfile, Resolution};
pub use errors::{CaptureError, ErrorCode, ScreenMuxError};
pub use image::*;
pub use layout::*;
pub use validate::{validate_layout, validate_layout_with, ValidationError, ValidationErrorType, ValidationErrors};

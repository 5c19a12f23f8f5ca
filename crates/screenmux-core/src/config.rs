use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::ScreenMuxError;
use crate::image::ImagePixelFormat;
use crate::layout::{LayoutParameter, LayoutParameterArray, Rect, WindowHandle, MAX_PROCESSOR_SIZE};

// MARK: - Resolution

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const VGA: Self = Self { width: 640, height: 480 };
    pub const HD: Self = Self { width: 1280, height: 720 };
    pub const FHD: Self = Self { width: 1920, height: 1080 };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn as_rect(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}×{}", self.width, self.height)
    }
}

// MARK: - EngineConfig

/// Output frame configuration for an engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub output: Resolution,
    #[serde(alias = "pixelFormat")]
    pub pixel_format: ImagePixelFormat,
    #[serde(alias = "targetFPS")]
    pub fps: u32,
    /// Log throughput every this many frames.
    #[serde(alias = "statsInterval")]
    pub stats_interval: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            output: Resolution::VGA,
            pixel_format: ImagePixelFormat::I420,
            fps: 30,
            stats_interval: 300,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ScreenMuxError> {
        let Resolution { width, height } = self.output;
        if width == 0 || height == 0 {
            return Err(ScreenMuxError::ConfigurationInvalid {
                reason: format!("output size {} is empty", self.output),
            });
        }
        if self.pixel_format.requires_even_dimensions() && (width % 2 != 0 || height % 2 != 0) {
            return Err(ScreenMuxError::ConfigurationInvalid {
                reason: format!("{} output needs even dimensions, got {}", self.pixel_format, self.output),
            });
        }
        if self.fps == 0 {
            return Err(ScreenMuxError::ConfigurationInvalid { reason: "fps must be positive".into() });
        }
        Ok(())
    }

    /// Interval between frames in microseconds.
    pub fn frame_interval_us(&self) -> u64 {
        1_000_000 / self.fps.max(1) as u64
    }
}

// MARK: - LayoutProfile

/// A named layout, as stored by a host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutProfile {
    #[serde(default)]
    pub name: String,
    pub elements: Vec<LayoutParameter>,
}

impl LayoutProfile {
    /// Single element capturing `clipping` of the desktop over the whole output.
    pub fn desktop(output: Resolution, clipping: Rect) -> Self {
        Self {
            name: "desktop".into(),
            elements: vec![LayoutParameter::new(WindowHandle::DESKTOP, clipping, output.as_rect())],
        }
    }

    /// Copy the elements into fixed-capacity storage.
    pub fn to_array(&self) -> Result<(usize, LayoutParameterArray), ScreenMuxError> {
        to_parameter_array(&self.elements)
    }
}

/// Copy `elements` into a [`LayoutParameterArray`], padding with defaults.
pub fn to_parameter_array(elements: &[LayoutParameter]) -> Result<(usize, LayoutParameterArray), ScreenMuxError> {
    if elements.len() > MAX_PROCESSOR_SIZE {
        return Err(ScreenMuxError::TooManyElements { count: elements.len(), max: MAX_PROCESSOR_SIZE });
    }
    let mut array = [LayoutParameter::default(); MAX_PROCESSOR_SIZE];
    array[..elements.len()].copy_from_slice(elements);
    Ok((elements.len(), array))
}

/// Read a JSON document such as an [`EngineConfig`] or [`LayoutProfile`].
pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ScreenMuxError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_json_reports_io_and_parse_errors() {
        let missing = std::env::temp_dir().join("screenmux-config-does-not-exist.json");
        let err = load_json::<EngineConfig>(&missing).unwrap_err();
        assert!(matches!(err, ScreenMuxError::Io(_)));

        let path = std::env::temp_dir().join(format!("screenmux-config-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_json::<EngineConfig>(&path).unwrap_err();
        assert!(matches!(err, ScreenMuxError::Json(_)));

        std::fs::write(&path, r#"{"fps": 25}"#).unwrap();
        let cfg: EngineConfig = load_json(&path).unwrap();
        assert_eq!(cfg.fps, 25);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn deserializes_camel_case_fields() {
        let json = r#"{
            "output": {"width": 1280, "height": 720},
            "pixelFormat": "YV12",
            "targetFPS": 60,
            "statsInterval": 120
        }"#;

        let cfg: EngineConfig = serde_json::from_str(json).expect("valid camelCase config");
        assert_eq!(cfg.output, Resolution::HD);
        assert_eq!(cfg.pixel_format, ImagePixelFormat::Yv12);
        assert_eq!(cfg.fps, 60);
        assert_eq!(cfg.stats_interval, 120);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let cfg: EngineConfig = serde_json::from_str(r#"{"fps": 15}"#).expect("valid partial config");
        assert_eq!(cfg.fps, 15);
        assert_eq!(cfg.output, Resolution::VGA);
        assert_eq!(cfg.pixel_format, ImagePixelFormat::I420);
        assert_eq!(cfg.frame_interval_us(), 66_666);
    }

    #[test]
    fn rejects_odd_size_for_yuv() {
        let cfg = EngineConfig { output: Resolution::new(641, 480), ..EngineConfig::default() };
        assert!(matches!(cfg.validate(), Err(ScreenMuxError::ConfigurationInvalid { .. })));

        let rgb = EngineConfig { pixel_format: ImagePixelFormat::Rgb0, ..cfg };
        assert!(rgb.validate().is_ok());
    }

    #[test]
    fn rejects_zero_fps_and_empty_output() {
        let cfg = EngineConfig { fps: 0, ..EngineConfig::default() };
        assert!(cfg.validate().is_err());
        let cfg = EngineConfig { output: Resolution::new(0, 480), ..EngineConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn profile_fills_fixed_array() {
        let profile = LayoutProfile::desktop(Resolution::VGA, Rect::from_size(1920, 1080));
        let (count, array) = profile.to_array().unwrap();
        assert_eq!(count, 1);
        assert_eq!(array[0], profile.elements[0]);
        assert_eq!(array[1], LayoutParameter::default());
    }

    #[test]
    fn profile_rejects_too_many_elements() {
        let profile = LayoutProfile {
            name: "crowded".into(),
            elements: vec![LayoutParameter::default(); MAX_PROCESSOR_SIZE + 1],
        };
        let err = profile.to_array().unwrap_err();
        assert!(matches!(err, ScreenMuxError::TooManyElements { count: 9, max: 8 }));
    }
}

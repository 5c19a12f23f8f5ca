use std::collections::BTreeMap;

use screenmux_core::{CaptureError, LayoutParameter, Resolution, WindowHandle};
use tracing::trace;

// MARK: - SourceBitmap

/// Captured pixels of one clipping region, packed RGB0 (4 bytes per pixel).
///
/// The buffer length always equals `width * height * 4`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBitmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl SourceBitmap {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CaptureError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(CaptureError::BitmapSizeMismatch { width, height, len: data.len() });
        }
        Ok(Self { width, height, data })
    }

    /// Bitmap filled with one colour.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixel = [rgb[0], rgb[1], rgb[2], 0];
        let data = pixel.repeat(width as usize * height as usize);
        Self { width, height, data }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }
}

// MARK: - CaptureSource

/// Supplies bitmaps for layout elements.
///
/// Platform capture backends implement this; the engine only asks for the
/// clipping region of each element it composes.
pub trait CaptureSource: Send {
    /// Capture `parameter.clipping` of `parameter.window`.
    fn capture(&mut self, parameter: &LayoutParameter) -> Result<SourceBitmap, CaptureError>;

    /// Whether `window` can currently be captured.
    fn is_window_valid(&self, window: WindowHandle) -> bool;
}

// MARK: - PatternSource

/// Synthetic source that renders a deterministic gradient per window.
///
/// Stands in for a platform backend in the host binary and in tests.
#[derive(Debug, Clone)]
pub struct PatternSource {
    windows: BTreeMap<WindowHandle, Resolution>,
    captures: u64,
}

impl PatternSource {
    pub fn new(desktop: Resolution) -> Self {
        let mut windows = BTreeMap::new();
        windows.insert(WindowHandle::DESKTOP, desktop);
        Self { windows, captures: 0 }
    }

    pub fn with_window(mut self, window: WindowHandle, size: Resolution) -> Self {
        self.windows.insert(window, size);
        self
    }

    pub fn close_window(&mut self, window: WindowHandle) {
        self.windows.remove(&window);
    }

    pub fn captures(&self) -> u64 {
        self.captures
    }

    /// Colour of window pixel (`x`, `y`).
    pub fn color_at(window: WindowHandle, size: Resolution, x: u32, y: u32) -> [u8; 3] {
        let r = (x as u64 * 255 / size.width.saturating_sub(1).max(1) as u64).min(255) as u8;
        let g = (y as u64 * 255 / size.height.saturating_sub(1).max(1) as u64).min(255) as u8;
        let b = (window.0.wrapping_mul(97) % 256) as u8;
        [r, g, b]
    }
}

impl CaptureSource for PatternSource {
    fn capture(&mut self, parameter: &LayoutParameter) -> Result<SourceBitmap, CaptureError> {
        let size = *self
            .windows
            .get(&parameter.window)
            .ok_or(CaptureError::WindowNotFound(parameter.window))?;
        let clip = parameter.clipping;
        if clip.is_empty() {
            return Err(CaptureError::EmptyClipping { width: clip.width, height: clip.height });
        }

        let mut data = Vec::with_capacity(clip.width as usize * clip.height as usize * 4);
        for row in 0..clip.height {
            let y = clip.y as i64 + row as i64;
            for col in 0..clip.width {
                let x = clip.x as i64 + col as i64;
                let inside = x >= 0 && y >= 0 && x < size.width as i64 && y < size.height as i64;
                let [r, g, b] = if inside {
                    Self::color_at(parameter.window, size, x as u32, y as u32)
                } else {
                    [0, 0, 0]
                };
                data.extend_from_slice(&[r, g, b, 0]);
            }
        }

        self.captures += 1;
        trace!("PatternSource captured {} from window {}", clip, parameter.window);
        SourceBitmap::new(clip.width, clip.height, data)
    }

    fn is_window_valid(&self, window: WindowHandle) -> bool {
        self.windows.contains_key(&window)
    }
}

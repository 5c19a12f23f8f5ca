//! Image metadata and pixel-format tables.
//!
//! [`Image`] only declares a format and a size. Pixel storage is carried by
//! [`ImageBuffer`], which pairs an initialized `Image` with a byte buffer of
//! exactly the size the format requires.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::errors::ErrorCode;

// MARK: - ImagePixelFormat

/// External pixel encodings accepted from capture sources and requested by
/// the host for output frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImagePixelFormat {
    /// Planar YUV 4:2:0, Y then U then V.
    I420,
    /// Same memory layout as I420, different FourCC.
    Iyuv,
    /// Planar YUV 4:2:0, Y then V then U.
    Yv12,
    /// Packed YUV 4:2:2, U0 Y0 V0 Y1.
    Uyvy,
    /// Packed YUV 4:2:2, Y0 U0 Y1 V0.
    Yuy2,
    /// Packed 32-bit R G B with an unused fourth byte.
    Rgb0,
}

impl ImagePixelFormat {
    pub const ALL: [ImagePixelFormat; 6] = [
        Self::I420,
        Self::Iyuv,
        Self::Yv12,
        Self::Uyvy,
        Self::Yuy2,
        Self::Rgb0,
    ];

    /// Canonical representation the compositor builds frames in.
    pub fn canonical(self) -> CanonicalPixelFormat {
        match self {
            Self::I420 | Self::Iyuv | Self::Yv12 => CanonicalPixelFormat::Yuv420p,
            Self::Uyvy => CanonicalPixelFormat::Uyvy422,
            Self::Yuy2 => CanonicalPixelFormat::Yuyv422,
            Self::Rgb0 => CanonicalPixelFormat::Rgb0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::I420 => "I420",
            Self::Iyuv => "IYUV",
            Self::Yv12 => "YV12",
            Self::Uyvy => "UYVY",
            Self::Yuy2 => "YUY2",
            Self::Rgb0 => "RGB0",
        }
    }

    pub fn is_planar(self) -> bool {
        self.canonical() == CanonicalPixelFormat::Yuv420p
    }

    /// Chroma-subsampled formats need even frame dimensions.
    pub fn requires_even_dimensions(self) -> bool {
        !matches!(self, Self::Rgb0)
    }

    /// Byte sizes of each plane, in memory order.
    pub fn plane_sizes(self, width: u32, height: u32) -> Vec<usize> {
        let w = width as usize;
        let h = height as usize;
        let half_w = (w + 1) / 2;
        let half_h = (h + 1) / 2;
        match self.canonical() {
            CanonicalPixelFormat::Yuv420p => vec![w * h, half_w * half_h, half_w * half_h],
            CanonicalPixelFormat::Uyvy422 | CanonicalPixelFormat::Yuyv422 => vec![half_w * 4 * h],
            CanonicalPixelFormat::Rgb0 => vec![w * h * 4],
        }
    }

    /// Total bytes for one frame of `width`×`height`.
    pub fn data_size(self, width: u32, height: u32) -> usize {
        self.plane_sizes(width, height).iter().sum()
    }
}

impl std::fmt::Display for ImagePixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// MARK: - CanonicalPixelFormat

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalPixelFormat {
    Yuv420p,
    Uyvy422,
    Yuyv422,
    Rgb0,
}

// MARK: - Image

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ImageDesc {
    pixel_format: ImagePixelFormat,
    width: u32,
    height: u32,
}

/// Pixel format and dimensions of a frame.
///
/// Starts out empty and is filled exactly once by [`Image::create`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Image {
    desc: Option<ImageDesc>,
}

impl Image {
    pub fn new() -> Self {
        Self { desc: None }
    }

    pub fn is_empty(&self) -> bool {
        self.desc.is_none()
    }

    pub fn pixel_format(&self) -> Option<ImagePixelFormat> {
        self.desc.map(|d| d.pixel_format)
    }

    pub fn width(&self) -> Option<u32> {
        self.desc.map(|d| d.width)
    }

    pub fn height(&self) -> Option<u32> {
        self.desc.map(|d| d.height)
    }

    /// `None` until the image has been created.
    pub fn canonical_pixel_format(&self) -> Option<CanonicalPixelFormat> {
        self.pixel_format().map(ImagePixelFormat::canonical)
    }

    pub fn data_size(&self) -> Option<usize> {
        self.desc
            .map(|d| d.pixel_format.data_size(d.width, d.height))
    }

    /// Declare the format and size of this image.
    ///
    /// # Panics
    ///
    /// Panics if the image was already created.
    pub fn create(
        &mut self,
        pixel_format: ImagePixelFormat,
        width: u32,
        height: u32,
    ) -> Result<(), ErrorCode> {
        assert!(self.is_empty(), "Image::create called on an initialized image");
        self.desc = Some(ImageDesc { pixel_format, width, height });
        Ok(())
    }
}

// MARK: - ImageBuffer

/// An initialized [`Image`] together with its pixel bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    image: Image,
    data: Bytes,
}

impl ImageBuffer {
    pub fn new(image: Image, data: Bytes) -> Result<Self, ErrorCode> {
        let expected = image.data_size().ok_or(ErrorCode::ImageUninitialized)?;
        if data.len() != expected {
            return Err(ErrorCode::BufferSizeMismatch);
        }
        Ok(Self { image, data })
    }

    /// Buffer of all-zero bytes.
    pub fn zeroed(pixel_format: ImagePixelFormat, width: u32, height: u32) -> Self {
        let mut image = Image::new();
        // A fresh image cannot already be initialized.
        let _ = image.create(pixel_format, width, height);
        let data = Bytes::from(vec![0u8; pixel_format.data_size(width, height)]);
        Self { image, data }
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Plane slices in memory order (one slice for packed formats).
    pub fn planes(&self) -> Vec<&[u8]> {
        let (Some(format), Some(w), Some(h)) =
            (self.image.pixel_format(), self.image.width(), self.image.height())
        else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(3);
        let mut offset = 0;
        for size in format.plane_sizes(w, h) {
            out.push(&self.data[offset..offset + size]);
            offset += size;
        }
        out
    }
}

use serde::{Deserialize, Serialize};

/// Upper bound on the number of composited elements in one layout.
pub const MAX_PROCESSOR_SIZE: usize = 8;

/// Fixed-capacity parameter storage; only a prefix is meaningful.
pub type LayoutParameterArray = [LayoutParameter; MAX_PROCESSOR_SIZE];

// MARK: - WindowHandle

/// Opaque identifier of a capture source window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowHandle(pub u64);

impl WindowHandle {
    /// The whole desktop.
    pub const DESKTOP: Self = Self(0);
}

impl std::fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

// MARK: - Rect

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle anchored at the origin.
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    /// Overlap of two rectangles, `None` when they do not overlap.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = (self.x as i64).max(other.x as i64);
        let top = (self.y as i64).max(other.y as i64);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= left || bottom <= top {
            return None;
        }
        Some(Rect::new(
            left as i32,
            top as i32,
            (right - left) as u32,
            (bottom - top) as u32,
        ))
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.intersection(other).is_some()
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

// MARK: - RotateDirection

/// Clockwise rotation applied to the captured region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotateDirection {
    #[default]
    None,
    Degrees90,
    Degrees180,
    Degrees270,
}

impl RotateDirection {
    pub fn swaps_axes(self) -> bool {
        matches!(self, Self::Degrees90 | Self::Degrees270)
    }
}

// MARK: - ScaleFilter

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleFilter {
    Nearest,
    #[default]
    Bilinear,
}

// MARK: - LayoutParameter

/// Placement of one captured region inside the output frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutParameter {
    /// Capture source.
    pub window: WindowHandle,
    /// Region to capture, in source coordinates.
    pub clipping: Rect,
    /// Destination area, in output coordinates.
    pub bound: Rect,
    #[serde(alias = "showCursor")]
    pub show_cursor: bool,
    #[serde(alias = "showLayeredWindow")]
    pub show_layered_window: bool,
    /// Allow scaling the region up beyond its captured size.
    pub stretch: bool,
    #[serde(alias = "keepAspectRatio")]
    pub keep_aspect_ratio: bool,
    pub rotate: RotateDirection,
    #[serde(alias = "scaleFilter")]
    pub scale_filter: ScaleFilter,
}

impl Default for LayoutParameter {
    fn default() -> Self {
        Self {
            window: WindowHandle::DESKTOP,
            clipping: Rect::default(),
            bound: Rect::default(),
            show_cursor: false,
            show_layered_window: false,
            stretch: true,
            keep_aspect_ratio: true,
            rotate: RotateDirection::None,
            scale_filter: ScaleFilter::Bilinear,
        }
    }
}

impl LayoutParameter {
    pub fn new(window: WindowHandle, clipping: Rect, bound: Rect) -> Self {
        Self { window, clipping, bound, ..Self::default() }
    }

    /// Size of the captured region after rotation.
    pub fn rotated_size(&self) -> (u32, u32) {
        if self.rotate.swaps_axes() {
            (self.clipping.height, self.clipping.width)
        } else {
            (self.clipping.width, self.clipping.height)
        }
    }

    /// Where the captured region lands inside `bound`.
    pub fn content_rect(&self, bound: Rect) -> Rect {
        let (w, h) = self.rotated_size();
        fit_into(w, h, bound, self.stretch, self.keep_aspect_ratio)
    }
}

// MARK: - Geometry

/// Fit a `src_width`×`src_height` region into `bound`, centred.
///
/// Without `stretch` a region smaller than the bound keeps its size. With
/// `keep_aspect_ratio` the result is letterboxed or pillarboxed.
pub fn fit_into(src_width: u32, src_height: u32, bound: Rect, stretch: bool, keep_aspect_ratio: bool) -> Rect {
    if src_width == 0 || src_height == 0 || bound.is_empty() {
        return Rect::new(bound.x, bound.y, 0, 0);
    }

    let (sw, sh) = (src_width as u64, src_height as u64);
    let (bw, bh) = (bound.width as u64, bound.height as u64);
    let fits = sw <= bw && sh <= bh;

    let (w, h) = if !stretch && fits {
        (sw, sh)
    } else if keep_aspect_ratio {
        if sw * bh <= sh * bw {
            // Height-limited: pillarbox.
            ((sw * bh + sh / 2) / sh, bh)
        } else {
            (bw, (sh * bw + sw / 2) / sw)
        }
    } else if stretch {
        (bw, bh)
    } else {
        (sw.min(bw), sh.min(bh))
    };

    let w = w.clamp(1, bw);
    let h = h.clamp(1, bh);
    let x = bound.x as i64 + ((bw - w) / 2) as i64;
    let y = bound.y as i64 + ((bh - h) / 2) as i64;
    let saturate = |v: i64| i32::try_from(v).unwrap_or(i32::MAX);
    Rect::new(saturate(x), saturate(y), w as u32, h as u32)
}

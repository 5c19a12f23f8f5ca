use screenmux_core::{Rect, RotateDirection, ScaleFilter};

use crate::source::SourceBitmap;

// MARK: - Canvas

/// RGB0 working surface the layout is composed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Canvas {
    /// Black canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, data: vec![0u8; width as usize * height as usize * 4] }
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

    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    /// Scale `bitmap` into `dest`, rotated by `rotate`. Pixels outside the
    /// canvas are dropped.
    pub fn draw(&mut self, bitmap: &SourceBitmap, dest: Rect, rotate: RotateDirection, filter: ScaleFilter) {
        if bitmap.width() == 0 || bitmap.height() == 0 || dest.is_empty() {
            return;
        }
        let Some(visible) = dest.intersection(&self.bounds()) else {
            return;
        };

        // Size of the bitmap after rotation; `dest` maps onto this.
        let (rw, rh) = if rotate.swaps_axes() {
            (bitmap.height(), bitmap.width())
        } else {
            (bitmap.width(), bitmap.height())
        };
        let sx = rw as f32 / dest.width as f32;
        let sy = rh as f32 / dest.height as f32;

        for oy in visible.y..visible.y + visible.height as i32 {
            let v = (oy - dest.y) as f32;
            let ry = (v + 0.5) * sy - 0.5;
            for ox in visible.x..visible.x + visible.width as i32 {
                let u = (ox - dest.x) as f32;
                let rx = (u + 0.5) * sx - 0.5;
                let (bx, by) = unrotate(rx, ry, bitmap.width(), bitmap.height(), rotate);
                let pixel = match filter {
                    ScaleFilter::Nearest => sample_nearest(bitmap, bx, by),
                    ScaleFilter::Bilinear => sample_bilinear(bitmap, bx, by),
                };
                let i = (oy as usize * self.width as usize + ox as usize) * 4;
                self.data[i..i + 3].copy_from_slice(&pixel);
                self.data[i + 3] = 0;
            }
        }
    }
}

/// Map a point of the rotated image back to bitmap coordinates.
fn unrotate(rx: f32, ry: f32, width: u32, height: u32, rotate: RotateDirection) -> (f32, f32) {
    let (w, h) = ((width - 1) as f32, (height - 1) as f32);
    match rotate {
        RotateDirection::None => (rx, ry),
        RotateDirection::Degrees90 => (ry, h - rx),
        RotateDirection::Degrees180 => (w - rx, h - ry),
        RotateDirection::Degrees270 => (w - ry, rx),
    }
}

fn sample_nearest(bitmap: &SourceBitmap, x: f32, y: f32) -> [u8; 3] {
    let xi = x.round().clamp(0.0, (bitmap.width() - 1) as f32) as u32;
    let yi = y.round().clamp(0.0, (bitmap.height() - 1) as f32) as u32;
    let [r, g, b, _] = bitmap.pixel(xi, yi);
    [r, g, b]
}

fn sample_bilinear(bitmap: &SourceBitmap, x: f32, y: f32) -> [u8; 3] {
    let max_x = (bitmap.width() - 1) as f32;
    let max_y = (bitmap.height() - 1) as f32;
    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let x1 = (x0 + 1.0).min(max_x) as u32;
    let y1 = (y0 + 1.0).min(max_y) as u32;
    let (x0, y0) = (x0 as u32, y0 as u32);

    let p00 = bitmap.pixel(x0, y0);
    let p10 = bitmap.pixel(x1, y0);
    let p01 = bitmap.pixel(x0, y1);
    let p11 = bitmap.pixel(x1, y1);

    let mut out = [0u8; 3];
    for c in 0..3 {
        let top = p00[c] as f32 * (1.0 - fx) + p10[c] as f32 * fx;
        let bottom = p01[c] as f32 * (1.0 - fx) + p11[c] as f32 * fx;
        out[c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2×1 bitmap: red then blue.
    fn red_blue() -> SourceBitmap {
        SourceBitmap::new(2, 1, vec![255, 0, 0, 0, 0, 0, 255, 0]).unwrap()
    }

    #[test]
    fn new_canvas_is_black() {
        let canvas = Canvas::new(4, 4);
        assert!(canvas.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn draws_solid_into_dest_only() {
        let mut canvas = Canvas::new(8, 8);
        let bitmap = SourceBitmap::solid(3, 3, [10, 20, 30]);
        canvas.draw(&bitmap, Rect::new(2, 2, 4, 4), RotateDirection::None, ScaleFilter::Bilinear);
        assert_eq!(canvas.pixel(2, 2), [10, 20, 30, 0]);
        assert_eq!(canvas.pixel(5, 5), [10, 20, 30, 0]);
        assert_eq!(canvas.pixel(1, 1), [0, 0, 0, 0]);
        assert_eq!(canvas.pixel(6, 6), [0, 0, 0, 0]);
    }

    #[test]
    fn clips_to_canvas() {
        let mut canvas = Canvas::new(4, 4);
        let bitmap = SourceBitmap::solid(2, 2, [1, 1, 1]);
        canvas.draw(&bitmap, Rect::new(-2, -2, 4, 4), RotateDirection::None, ScaleFilter::Nearest);
        assert_eq!(canvas.pixel(0, 0), [1, 1, 1, 0]);
        assert_eq!(canvas.pixel(1, 1), [1, 1, 1, 0]);
        assert_eq!(canvas.pixel(2, 2), [0, 0, 0, 0]);
    }

    #[test]
    fn nearest_upscale_keeps_edges() {
        let mut canvas = Canvas::new(4, 1);
        canvas.draw(&red_blue(), Rect::from_size(4, 1), RotateDirection::None, ScaleFilter::Nearest);
        assert_eq!(canvas.pixel(0, 0), [255, 0, 0, 0]);
        assert_eq!(canvas.pixel(3, 0), [0, 0, 255, 0]);
    }

    #[test]
    fn rotations_move_first_pixel() {
        // 2×1 red|blue rotated 90° clockwise becomes 1×2 red over blue.
        let mut canvas = Canvas::new(1, 2);
        canvas.draw(&red_blue(), Rect::from_size(1, 2), RotateDirection::Degrees90, ScaleFilter::Nearest);
        assert_eq!(canvas.pixel(0, 0), [255, 0, 0, 0]);
        assert_eq!(canvas.pixel(0, 1), [0, 0, 255, 0]);

        let mut canvas = Canvas::new(1, 2);
        canvas.draw(&red_blue(), Rect::from_size(1, 2), RotateDirection::Degrees270, ScaleFilter::Nearest);
        assert_eq!(canvas.pixel(0, 0), [0, 0, 255, 0]);
        assert_eq!(canvas.pixel(0, 1), [255, 0, 0, 0]);

        let mut canvas = Canvas::new(2, 1);
        canvas.draw(&red_blue(), Rect::from_size(2, 1), RotateDirection::Degrees180, ScaleFilter::Nearest);
        assert_eq!(canvas.pixel(0, 0), [0, 0, 255, 0]);
        assert_eq!(canvas.pixel(1, 0), [255, 0, 0, 0]);
    }

    #[test]
    fn bilinear_blends_between_samples() {
        let mut canvas = Canvas::new(3, 1);
        let bitmap = SourceBitmap::new(2, 1, vec![0, 0, 0, 0, 200, 200, 200, 0]).unwrap();
        canvas.draw(&bitmap, Rect::from_size(3, 1), RotateDirection::None, ScaleFilter::Bilinear);
        let middle = canvas.pixel(1, 0);
        assert_eq!(middle, [100, 100, 100, 0]);
        assert_eq!(canvas.pixel(0, 0), [0, 0, 0, 0]);
        assert_eq!(canvas.pixel(2, 0), [200, 200, 200, 0]);
    }
}

//! RGB0 → output pixel format conversion (BT.601, limited range).

use screenmux_core::{CanonicalPixelFormat, ImagePixelFormat};

#[inline]
fn rgb_to_y(r: i32, g: i32, b: i32) -> u8 {
    (((66 * r + 129 * g + 25 * b + 128) >> 8) + 16) as u8
}

#[inline]
fn rgb_to_u(r: i32, g: i32, b: i32) -> u8 {
    (((-38 * r - 74 * g + 112 * b + 128) >> 8) + 128) as u8
}

#[inline]
fn rgb_to_v(r: i32, g: i32, b: i32) -> u8 {
    (((112 * r - 94 * g - 18 * b + 128) >> 8) + 128) as u8
}

/// Average RGB of the pixels in `xs` × `ys` (ranges clamped by caller).
fn average_rgb(rgb0: &[u8], width: usize, xs: std::ops::Range<usize>, ys: std::ops::Range<usize>) -> (i32, i32, i32) {
    let (mut r, mut g, mut b, mut n) = (0i32, 0i32, 0i32, 0i32);
    for y in ys {
        for x in xs.clone() {
            let i = (y * width + x) * 4;
            r += rgb0[i] as i32;
            g += rgb0[i + 1] as i32;
            b += rgb0[i + 2] as i32;
            n += 1;
        }
    }
    let n = n.max(1);
    ((r + n / 2) / n, (g + n / 2) / n, (b + n / 2) / n)
}

/// Convert a packed RGB0 canvas of `width`×`height` into `format`.
///
/// The result is exactly `format.data_size(width, height)` bytes.
pub fn rgb0_to(format: ImagePixelFormat, rgb0: &[u8], width: u32, height: u32) -> Vec<u8> {
    debug_assert_eq!(rgb0.len(), width as usize * height as usize * 4);
    match format.canonical() {
        CanonicalPixelFormat::Yuv420p => to_yuv420p(rgb0, width, height, format == ImagePixelFormat::Yv12),
        CanonicalPixelFormat::Uyvy422 => to_packed_422(rgb0, width, height, PackedOrder::Uyvy),
        CanonicalPixelFormat::Yuyv422 => to_packed_422(rgb0, width, height, PackedOrder::Yuyv),
        CanonicalPixelFormat::Rgb0 => rgb0.to_vec(),
    }
}

fn to_yuv420p(rgb0: &[u8], width: u32, height: u32, swap_uv: bool) -> Vec<u8> {
    let (w, h) = (width as usize, height as usize);
    let (cw, ch) = ((w + 1) / 2, (h + 1) / 2);

    let mut out = vec![0u8; w * h + 2 * cw * ch];
    let (y_plane, chroma) = out.split_at_mut(w * h);
    let (first, second) = chroma.split_at_mut(cw * ch);
    let (u_plane, v_plane) = if swap_uv { (second, first) } else { (first, second) };

    for y in 0..h {
        for x in 0..w {
            let i = (y * w + x) * 4;
            y_plane[y * w + x] = rgb_to_y(rgb0[i] as i32, rgb0[i + 1] as i32, rgb0[i + 2] as i32);
        }
    }

    for cy in 0..ch {
        for cx in 0..cw {
            let xs = cx * 2..(cx * 2 + 2).min(w);
            let ys = cy * 2..(cy * 2 + 2).min(h);
            let (r, g, b) = average_rgb(rgb0, w, xs, ys);
            u_plane[cy * cw + cx] = rgb_to_u(r, g, b);
            v_plane[cy * cw + cx] = rgb_to_v(r, g, b);
        }
    }

    out
}

#[derive(Clone, Copy)]
enum PackedOrder {
    Uyvy,
    Yuyv,
}

fn to_packed_422(rgb0: &[u8], width: u32, height: u32, order: PackedOrder) -> Vec<u8> {
    let (w, h) = (width as usize, height as usize);
    let pairs = (w + 1) / 2;
    let mut out = Vec::with_capacity(pairs * 4 * h);

    for y in 0..h {
        for pair in 0..pairs {
            let x0 = pair * 2;
            let x1 = (x0 + 1).min(w - 1);
            let p0 = (y * w + x0) * 4;
            let p1 = (y * w + x1) * 4;
            let y0 = rgb_to_y(rgb0[p0] as i32, rgb0[p0 + 1] as i32, rgb0[p0 + 2] as i32);
            let y1 = rgb_to_y(rgb0[p1] as i32, rgb0[p1 + 1] as i32, rgb0[p1 + 2] as i32);
            let (r, g, b) = average_rgb(rgb0, w, x0..x1 + 1, y..y + 1);
            let u = rgb_to_u(r, g, b);
            let v = rgb_to_v(r, g, b);
            match order {
                PackedOrder::Uyvy => out.extend_from_slice(&[u, y0, v, y1]),
                PackedOrder::Yuyv => out.extend_from_slice(&[y0, u, y1, v]),
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
        [rgb[0], rgb[1], rgb[2], 0].repeat(width as usize * height as usize)
    }

    #[test]
    fn black_and_white_levels() {
        let black = rgb0_to(ImagePixelFormat::I420, &solid(2, 2, [0, 0, 0]), 2, 2);
        assert_eq!(black, vec![16, 16, 16, 16, 128, 128]);
        let white = rgb0_to(ImagePixelFormat::I420, &solid(2, 2, [255, 255, 255]), 2, 2);
        assert_eq!(white, vec![235, 235, 235, 235, 128, 128]);
    }

    #[test]
    fn yv12_swaps_chroma_planes() {
        let red = solid(2, 2, [255, 0, 0]);
        let i420 = rgb0_to(ImagePixelFormat::I420, &red, 2, 2);
        let yv12 = rgb0_to(ImagePixelFormat::Yv12, &red, 2, 2);
        let iyuv = rgb0_to(ImagePixelFormat::Iyuv, &red, 2, 2);
        assert_eq!(i420, vec![82, 82, 82, 82, 90, 240]);
        assert_eq!(yv12, vec![82, 82, 82, 82, 240, 90]);
        assert_eq!(iyuv, i420);
    }

    #[test]
    fn packed_byte_order() {
        let red = solid(2, 1, [255, 0, 0]);
        assert_eq!(rgb0_to(ImagePixelFormat::Uyvy, &red, 2, 1), vec![90, 82, 240, 82]);
        assert_eq!(rgb0_to(ImagePixelFormat::Yuy2, &red, 2, 1), vec![82, 90, 82, 240]);
    }

    #[test]
    fn rgb0_is_copied() {
        let canvas = solid(3, 1, [1, 2, 3]);
        assert_eq!(rgb0_to(ImagePixelFormat::Rgb0, &canvas, 3, 1), canvas);
    }

    #[test]
    fn output_sizes_match_format_table() {
        for format in ImagePixelFormat::ALL {
            for (w, h) in [(2, 2), (3, 5), (16, 9)] {
                let out = rgb0_to(format, &solid(w, h, [10, 200, 30]), w, h);
                assert_eq!(out.len(), format.data_size(w, h), "{format} {w}x{h}");
            }
        }
    }

    #[test]
    fn chroma_averages_block() {
        // Left column black, right column white: chroma of the average grey.
        let mut canvas = solid(2, 2, [0, 0, 0]);
        for y in 0..2 {
            let i = (y * 2 + 1) * 4;
            canvas[i..i + 3].copy_from_slice(&[255, 255, 255]);
        }
        let out = rgb0_to(ImagePixelFormat::I420, &canvas, 2, 2);
        assert_eq!(&out[..4], &[16, 235, 16, 235]);
        assert_eq!(&out[4..], &[128, 128]);
    }
}

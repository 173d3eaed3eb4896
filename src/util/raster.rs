//! Line rasterization into RGB image buffers.
//!
//! Segments are clipped against the image before they are walked, so
//! projections far outside the frame (points grazing the image plane) cost
//! no more than an on-screen segment and never write out of bounds.

use image::{Rgb, RgbImage};
use nalgebra::Vector2;

/// Endpoints with a larger magnitude are rejected outright.
pub const MAX_PIXEL_COORDINATE: f64 = 1.0e12;

/// Thicker strokes are drawn at this width.
pub const MAX_THICKNESS: u32 = 1 << 20;

/// Draws a straight segment of the given stroke width.
///
/// The stroke is a filled disk of radius `thickness / 2` stamped at every
/// Bresenham step, so a `thickness` of 0 or 1 draws a one pixel line.
/// `thickness` is clamped to [`MAX_THICKNESS`].
///
/// # Returns
///
/// `true` if any part of the segment reached the image, `false` if it was
/// rejected (non-finite or huge endpoints) or lies completely outside.
pub fn draw_line_segment(
    image: &mut RgbImage,
    start: &Vector2<f64>,
    end: &Vector2<f64>,
    color: Rgb<u8>,
    thickness: u32,
) -> bool {
    let usable =
        |p: &Vector2<f64>| p.iter().all(|v| v.is_finite() && v.abs() <= MAX_PIXEL_COORDINATE);
    if !usable(start) || !usable(end) {
        return false;
    }

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return false;
    }

    let radius = i64::from(thickness.min(MAX_THICKNESS) / 2);
    let margin = radius as f64 + 1.0;
    let Some((a, b)) = clip_segment(
        start,
        end,
        -margin,
        -margin,
        width as f64 - 1.0 + margin,
        height as f64 - 1.0 + margin,
    ) else {
        return false;
    };

    let (mut x0, mut y0) = (a.x.round() as i64, a.y.round() as i64);
    let (x1, y1) = (b.x.round() as i64, b.y.round() as i64);

    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        stamp_disk(image, x0, y0, radius, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }

    true
}

/// Fills a disk centred on `(cx, cy)`.
///
/// Only the part of the disk's bounding box inside the image is visited.
fn stamp_disk(image: &mut RgbImage, cx: i64, cy: i64, radius: i64, color: Rgb<u8>) {
    let (width, height) = (i64::from(image.width()), i64::from(image.height()));
    let (x_min, x_max) = ((cx - radius).max(0), (cx + radius).min(width - 1));
    let (y_min, y_max) = ((cy - radius).max(0), (cy + radius).min(height - 1));

    for y in y_min..=y_max {
        let dy = y - cy;
        for x in x_min..=x_max {
            let dx = x - cx;
            if dx * dx + dy * dy <= radius * radius {
                image.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

/// Liang–Barsky clipping of the segment `p0 -> p1` to an axis-aligned box.
fn clip_segment(
    p0: &Vector2<f64>,
    p1: &Vector2<f64>,
    x_min: f64,
    y_min: f64,
    x_max: f64,
    y_max: f64,
) -> Option<(Vector2<f64>, Vector2<f64>)> {
    let d = p1 - p0;
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;

    let boundaries = [
        (-d.x, p0.x - x_min),
        (d.x, x_max - p0.x),
        (-d.y, p0.y - y_min),
        (d.y, y_max - p0.y),
    ];

    for (p, q) in boundaries {
        if p == 0.0 {
            // Parallel to this boundary: either fully inside or fully outside.
            if q < 0.0 {
                return None;
            }
            continue;
        }

        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    Some((p0 + d * t0, p0 + d * t1))
}

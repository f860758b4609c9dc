//! Pixel drawing primitives for the render surface.

use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{Rgba, RgbaImage};

const GLYPH_SIZE: i32 = 8;

/// Parse `#rgb`, `#rrggbb`, `#rrggbbaa`, or a small set of named
/// colors. `None` for anything else.
pub fn parse_color(value: &str) -> Option<Rgba<u8>> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        return match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1], 16).ok()?;
                let g = u8::from_str_radix(&hex[1..2], 16).ok()?;
                let b = u8::from_str_radix(&hex[2..3], 16).ok()?;
                Some(Rgba([r * 17, g * 17, b * 17, 255]))
            }
            6 | 8 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                let a = if hex.len() == 8 {
                    u8::from_str_radix(&hex[6..8], 16).ok()?
                } else {
                    255
                };
                Some(Rgba([r, g, b, a]))
            }
            _ => None,
        };
    }

    match value.to_ascii_lowercase().as_str() {
        "red" => Some(Rgba([255, 0, 0, 255])),
        "green" => Some(Rgba([0, 128, 0, 255])),
        "blue" => Some(Rgba([0, 0, 255, 255])),
        "yellow" => Some(Rgba([255, 255, 0, 255])),
        "orange" => Some(Rgba([255, 165, 0, 255])),
        "black" => Some(Rgba([0, 0, 0, 255])),
        "white" => Some(Rgba([255, 255, 255, 255])),
        "gray" | "grey" => Some(Rgba([128, 128, 128, 255])),
        _ => None,
    }
}

/// Scale a color's alpha channel by `opacity` (clamped to 0..=1).
pub fn with_opacity(color: Rgba<u8>, opacity: f64) -> Rgba<u8> {
    let alpha = (f64::from(color[3]) * opacity.clamp(0.0, 1.0)).round() as u8;
    Rgba([color[0], color[1], color[2], alpha])
}

fn blend(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let a = f64::from(src[3]) / 255.0;
    if a <= 0.0 {
        return dst;
    }
    let inv = 1.0 - a;
    let mix = |d: u8, s: u8| (f64::from(d) * inv + f64::from(s) * a).round() as u8;
    Rgba([
        mix(dst[0], src[0]),
        mix(dst[1], src[1]),
        mix(dst[2], src[2]),
        dst[3].max(src[3]),
    ])
}

fn put_blended(img: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>) {
    if x < 0 || y < 0 || x >= img.width() as i32 || y >= img.height() as i32 {
        return;
    }
    let dst = *img.get_pixel(x as u32, y as u32);
    img.put_pixel(x as u32, y as u32, blend(dst, color));
}

/// Alpha-blended solid fill over the clamped rectangle.
pub fn fill_rect(img: &mut RgbaImage, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgba<u8>) {
    if color[3] == 0 {
        return;
    }
    for y in y0.min(y1)..=y0.max(y1) {
        for x in x0.min(x1)..=x0.max(x1) {
            put_blended(img, x, y, color);
        }
    }
}

/// Rectangle outline with the given stroke thickness, grown outward.
pub fn outline_rect(
    img: &mut RgbaImage,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    color: Rgba<u8>,
    thickness: u32,
) {
    if color[3] == 0 {
        return;
    }
    let (x0, x1) = (x0.min(x1), x0.max(x1));
    let (y0, y1) = (y0.min(y1), y0.max(y1));
    for t in 0..thickness.max(1) as i32 {
        let (lx, rx) = (x0 - t, x1 + t);
        let (ty, by) = (y0 - t, y1 + t);
        for x in lx..=rx {
            put_blended(img, x, ty, color);
            put_blended(img, x, by, color);
        }
        for y in (ty + 1)..by {
            put_blended(img, lx, y, color);
            put_blended(img, rx, y, color);
        }
    }
}

fn draw_disc(img: &mut RgbaImage, cx: f64, cy: f64, radius: f64, color: Rgba<u8>) {
    let r = radius.max(0.5);
    let min_x = (cx - r).floor() as i32;
    let max_x = (cx + r).ceil() as i32;
    let min_y = (cy - r).floor() as i32;
    let max_y = (cy + r).ceil() as i32;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = f64::from(x) + 0.5 - cx;
            let dy = f64::from(y) + 0.5 - cy;
            if dx * dx + dy * dy <= r * r {
                put_blended(img, x, y, color);
            }
        }
    }
}

/// Stamped-disc thick line.
pub fn draw_line(
    img: &mut RgbaImage,
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    color: Rgba<u8>,
    width: f64,
) {
    let dx = x1 - x0;
    let dy = y1 - y0;
    let steps = (dx * dx + dy * dy).sqrt().max(1.0).ceil() as i32;
    let radius = (width.max(1.0) / 2.0).max(0.6);
    for step in 0..=steps {
        let t = f64::from(step) / f64::from(steps);
        draw_disc(img, x0 + dx * t, y0 + dy * t, radius, color);
    }
}

fn fill_triangle(
    img: &mut RgbaImage,
    a: (f64, f64),
    b: (f64, f64),
    c: (f64, f64),
    color: Rgba<u8>,
) {
    let min_x = a.0.min(b.0).min(c.0).floor() as i32;
    let max_x = a.0.max(b.0).max(c.0).ceil() as i32;
    let min_y = a.1.min(b.1).min(c.1).floor() as i32;
    let max_y = a.1.max(b.1).max(c.1).ceil() as i32;

    let edge = |p: (f64, f64), q: (f64, f64), x: f64, y: f64| {
        (q.0 - p.0) * (y - p.1) - (q.1 - p.1) * (x - p.0)
    };
    let area = edge(a, b, c.0, c.1);
    if area.abs() < f64::EPSILON {
        return;
    }

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let px = f64::from(x) + 0.5;
            let py = f64::from(y) + 0.5;
            // Normalizing by the signed area makes the test
            // winding-independent.
            let w0 = edge(a, b, px, py) / area;
            let w1 = edge(b, c, px, py) / area;
            let w2 = edge(c, a, px, py) / area;
            if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                put_blended(img, x, y, color);
            }
        }
    }
}

/// Vector arrow: thick shaft plus a filled triangular head at the
/// target end.
pub fn draw_arrow(
    img: &mut RgbaImage,
    from: (f64, f64),
    to: (f64, f64),
    color: Rgba<u8>,
    width: f64,
    head_len: f64,
    head_width: f64,
) {
    let angle = (to.1 - from.1).atan2(to.0 - from.0);
    let back = (
        to.0 - head_len * angle.cos(),
        to.1 - head_len * angle.sin(),
    );
    draw_line(img, from.0, from.1, back.0, back.1, color, width);

    let left_angle = angle + std::f64::consts::FRAC_PI_2;
    let right_angle = angle - std::f64::consts::FRAC_PI_2;
    let half = head_width / 2.0;
    let left = (back.0 + half * left_angle.cos(), back.1 + half * left_angle.sin());
    let right = (
        back.0 + half * right_angle.cos(),
        back.1 + half * right_angle.sin(),
    );
    fill_triangle(img, to, left, right, color);
}

/// Pixel width of `text` at the given glyph scale.
pub fn text_width(text: &str, scale: u32) -> i32 {
    text.chars().count() as i32 * GLYPH_SIZE * scale.max(1) as i32
}

pub fn text_height(scale: u32) -> i32 {
    GLYPH_SIZE * scale.max(1) as i32
}

/// 8x8 bitmap-font text, top-left anchored. Unknown glyphs fall back
/// to `?`.
pub fn draw_text(img: &mut RgbaImage, x: i32, y: i32, text: &str, color: Rgba<u8>, scale: u32) {
    let scale = scale.max(1) as i32;
    let mut cursor_x = x;
    for ch in text.chars() {
        let Some(glyph) = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?')) else {
            cursor_x += GLYPH_SIZE * scale;
            continue;
        };
        for (row_idx, row) in glyph.iter().enumerate() {
            for col_idx in 0..8 {
                if (*row >> col_idx) & 1 == 0 {
                    continue;
                }
                for sy in 0..scale {
                    for sx in 0..scale {
                        put_blended(
                            img,
                            cursor_x + col_idx * scale + sx,
                            y + row_idx as i32 * scale + sy,
                            color,
                        );
                    }
                }
            }
        }
        cursor_x += GLYPH_SIZE * scale;
    }
}

/// Alpha-blend a decoded bitmap centered at the given surface point.
pub fn blit_centered(img: &mut RgbaImage, bitmap: &RgbaImage, cx: i32, cy: i32) {
    let x0 = cx - bitmap.width() as i32 / 2;
    let y0 = cy - bitmap.height() as i32 / 2;
    for (bx, by, pixel) in bitmap.enumerate_pixels() {
        put_blended(img, x0 + bx as i32, y0 + by as i32, *pixel);
    }
}

/// Degraded surface while no floor image is available: dark backdrop
/// with a regular grid.
pub fn draw_placeholder_grid(img: &mut RgbaImage, spacing: u32) {
    let backdrop = Rgba([24, 26, 32, 255]);
    let line = Rgba([52, 56, 64, 255]);
    for pixel in img.pixels_mut() {
        *pixel = backdrop;
    }
    let spacing = spacing.max(4);
    for x in (0..img.width()).step_by(spacing as usize) {
        for y in 0..img.height() {
            img.put_pixel(x, y, line);
        }
    }
    for y in (0..img.height()).step_by(spacing as usize) {
        for x in 0..img.width() {
            img.put_pixel(x, y, line);
        }
    }
}

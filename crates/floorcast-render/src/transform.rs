//! Coordinate transforms: virtual → image-pixel → surface.

use floorcast_core::map::{Coordinate, CoordinateSystem};

/// Placement of the active floor image on the render surface.
///
/// Valid only for the floor image it was computed against; it must be
/// recomputed on surface resize, floor switch, or image-load
/// completion. Any draw without a context is a no-op.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderContext {
    pub offset_x: f64,
    pub offset_y: f64,
    pub draw_width: f64,
    pub draw_height: f64,
    pub img_width: f64,
    pub img_height: f64,
}

impl RenderContext {
    /// Fit an image into the surface preserving aspect ratio, centered
    /// (letterbox). Returns `None` when either extent is empty.
    pub fn fit(img_width: u32, img_height: u32, surface_width: u32, surface_height: u32) -> Option<Self> {
        if img_width == 0 || img_height == 0 || surface_width == 0 || surface_height == 0 {
            return None;
        }

        let scale = f64::min(
            f64::from(surface_width) / f64::from(img_width),
            f64::from(surface_height) / f64::from(img_height),
        );
        let draw_width = f64::from(img_width) * scale;
        let draw_height = f64::from(img_height) * scale;

        Some(Self {
            offset_x: (f64::from(surface_width) - draw_width) / 2.0,
            offset_y: (f64::from(surface_height) - draw_height) / 2.0,
            draw_width,
            draw_height,
            img_width: f64::from(img_width),
            img_height: f64::from(img_height),
        })
    }
}

/// Map a virtual coordinate to image-pixel space via independent
/// per-axis affine interpolation between the two anchors. X and Y
/// scale independently. `None` for a degenerate coordinate system.
pub fn virtual_to_pixel(cs: &CoordinateSystem, v: Coordinate) -> Option<(f64, f64)> {
    if cs.is_degenerate() {
        return None;
    }
    let tl = cs.top_left;
    let br = cs.bottom_right;
    let px = tl.px + (v.x - tl.x) * (br.px - tl.px) / (br.x - tl.x);
    let py = tl.py + (v.y - tl.y) * (br.py - tl.py) / (br.y - tl.y);
    Some((px, py))
}

/// Map an image-pixel coordinate onto the render surface.
pub fn pixel_to_surface(px: f64, py: f64, ctx: &RenderContext) -> (f64, f64) {
    (
        ctx.offset_x + (px / ctx.img_width) * ctx.draw_width,
        ctx.offset_y + (py / ctx.img_height) * ctx.draw_height,
    )
}

/// Composed transform: virtual → pixel → surface.
pub fn virtual_to_surface(
    cs: &CoordinateSystem,
    v: Coordinate,
    ctx: &RenderContext,
) -> Option<(f64, f64)> {
    let (px, py) = virtual_to_pixel(cs, v)?;
    Some(pixel_to_surface(px, py, ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorcast_core::map::AnchorPoint;

    fn sample_cs() -> CoordinateSystem {
        CoordinateSystem {
            top_left: AnchorPoint {
                px: 0.0,
                py: 0.0,
                x: 0.0,
                y: 0.0,
            },
            bottom_right: AnchorPoint {
                px: 1000.0,
                py: 500.0,
                x: 100.0,
                y: 50.0,
            },
        }
    }

    #[test]
    fn test_virtual_to_pixel_midpoint() {
        let (px, py) = virtual_to_pixel(&sample_cs(), Coordinate { x: 50.0, y: 25.0 }).unwrap();
        assert_eq!((px, py), (500.0, 250.0));
    }

    #[test]
    fn test_axes_scale_independently() {
        let cs = CoordinateSystem {
            top_left: AnchorPoint {
                px: 100.0,
                py: 50.0,
                x: 0.0,
                y: 0.0,
            },
            bottom_right: AnchorPoint {
                px: 300.0,
                py: 450.0,
                x: 10.0,
                y: 10.0,
            },
        };
        // 20 px per unit on X, 40 px per unit on Y.
        let (px, py) = virtual_to_pixel(&cs, Coordinate { x: 5.0, y: 5.0 }).unwrap();
        assert_eq!((px, py), (200.0, 250.0));
    }

    #[test]
    fn test_degenerate_system_is_none() {
        let mut cs = sample_cs();
        cs.bottom_right.x = cs.top_left.x;
        assert!(virtual_to_pixel(&cs, Coordinate { x: 1.0, y: 1.0 }).is_none());
    }

    #[test]
    fn test_letterbox_fit_centers() {
        // 1000x500 image into a 800x600 surface: scale 0.8, 800x400,
        // vertically centered.
        let ctx = RenderContext::fit(1000, 500, 800, 600).unwrap();
        assert_eq!(ctx.draw_width, 800.0);
        assert_eq!(ctx.draw_height, 400.0);
        assert_eq!(ctx.offset_x, 0.0);
        assert_eq!(ctx.offset_y, 100.0);
    }

    #[test]
    fn test_pixel_to_surface_uses_offsets() {
        let ctx = RenderContext::fit(1000, 500, 800, 600).unwrap();
        let (sx, sy) = pixel_to_surface(500.0, 250.0, &ctx);
        assert_eq!((sx, sy), (400.0, 300.0));
    }

    #[test]
    fn test_composed_transform() {
        let ctx = RenderContext::fit(1000, 500, 1000, 500).unwrap();
        let (sx, sy) =
            virtual_to_surface(&sample_cs(), Coordinate { x: 100.0, y: 50.0 }, &ctx).unwrap();
        assert_eq!((sx, sy), (1000.0, 500.0));
    }

    #[test]
    fn test_fit_rejects_empty_extents() {
        assert!(RenderContext::fit(0, 100, 800, 600).is_none());
        assert!(RenderContext::fit(100, 100, 0, 600).is_none());
    }
}

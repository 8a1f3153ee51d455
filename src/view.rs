// View transform module
// Maps image pixels to screen space and keeps zoom anchored

use log::warn;

/// Smallest scale a zoom may reach
pub const MIN_SCALE: f64 = 1e-3;

/// Largest scale a zoom may reach
pub const MAX_SCALE: f64 = 1e3;

/// Axis-aligned rectangle in screen space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectF {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// Scale and translation applied to the image when drawing
///
/// `offset_x`/`offset_y` is where the image's top-left corner lands on
/// screen; one image pixel covers `scale` screen units in each direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

impl ViewTransform {
    /// Transform that centres an image of `image_size` inside `viewport_size`
    pub fn centered(image_size: (u32, u32), viewport_size: (u32, u32), scale: f64) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 {
            scale.clamp(MIN_SCALE, MAX_SCALE)
        } else {
            1.0
        };
        Self {
            scale,
            offset_x: (viewport_size.0 as f64 - image_size.0 as f64 * scale) / 2.0,
            offset_y: (viewport_size.1 as f64 - image_size.1 as f64 * scale) / 2.0,
        }
    }

    /// Translate the image by a screen-space delta
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Multiply the scale by `factor` while keeping the image point under
    /// `(anchor_x, anchor_y)` at the same screen position.
    ///
    /// Returns `false` when the factor is rejected (zero, negative, NaN or
    /// infinite) or the scale is already pinned at the clamp limit.
    pub fn zoom_around_anchor(&mut self, factor: f64, anchor_x: f64, anchor_y: f64) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            warn!("Ignoring invalid zoom factor: {}", factor);
            return false;
        }

        let new_scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        if new_scale == self.scale {
            return false;
        }

        // Effective factor differs from `factor` only when the clamp bites
        let applied = new_scale / self.scale;
        self.scale = new_scale;
        self.offset_x = anchor_x - (anchor_x - self.offset_x) * applied;
        self.offset_y = anchor_y - (anchor_y - self.offset_y) * applied;
        true
    }

    pub fn image_to_screen(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.scale + self.offset_x, y * self.scale + self.offset_y)
    }

    pub fn screen_to_image(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.offset_x) / self.scale, (y - self.offset_y) / self.scale)
    }

    /// Destination rectangle of the source pixel at `(x, y)`
    pub fn pixel_rect(&self, x: u32, y: u32) -> RectF {
        let (sx, sy) = self.image_to_screen(x as f64, y as f64);
        RectF {
            x: sx,
            y: sy,
            w: self.scale,
            h: self.scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < EPS, "{} != {}", a, b);
    }

    #[test]
    fn test_pan_moves_offset() {
        let mut view = ViewTransform::default();
        view.pan(12.5, -3.0);
        assert_eq!(view.offset_x, 12.5);
        assert_eq!(view.offset_y, -3.0);
        assert_eq!(view.scale, 1.0);
    }

    #[test]
    fn test_pan_is_commutative() {
        let mut split = ViewTransform::default();
        split.pan(20.0, -20.0);
        split.pan(-7.0, 40.0);

        let mut combined = ViewTransform::default();
        combined.pan(13.0, 20.0);

        assert_eq!(split, combined);
    }

    #[test]
    fn test_zoom_keeps_anchor_fixed() {
        let cases = [
            (1.0, 0.0, 0.0, 400.0, 300.0, 1.1),
            (2.5, -120.0, 33.0, 17.0, 590.0, 1.0 / 1.1),
            (0.3, 500.0, -80.0, -40.0, -40.0, 3.0),
            (7.0, 12.0, 12.0, 12.0, 12.0, 0.25),
        ];

        for (scale, ox, oy, ax, ay, factor) in cases {
            let mut view = ViewTransform {
                scale,
                offset_x: ox,
                offset_y: oy,
            };
            let before = view.screen_to_image(ax, ay);
            assert!(view.zoom_around_anchor(factor, ax, ay));
            let after = view.screen_to_image(ax, ay);

            assert_close(before.0, after.0);
            assert_close(before.1, after.1);
            assert_close(view.scale, scale * factor);
        }
    }

    #[test]
    fn test_zoom_composes() {
        let start = ViewTransform {
            scale: 1.3,
            offset_x: 45.0,
            offset_y: -10.0,
        };

        let mut stepped = start;
        stepped.zoom_around_anchor(1.1, 200.0, 150.0);
        stepped.zoom_around_anchor(1.7, 200.0, 150.0);

        let mut single = start;
        single.zoom_around_anchor(1.1 * 1.7, 200.0, 150.0);

        assert_close(stepped.scale, single.scale);
        assert_close(stepped.offset_x, single.offset_x);
        assert_close(stepped.offset_y, single.offset_y);
    }

    #[test]
    fn test_identity_zoom_is_noop() {
        let start = ViewTransform {
            scale: 1.7,
            offset_x: 0.1,
            offset_y: 0.3,
        };
        let mut view = start;
        assert!(!view.zoom_around_anchor(1.0, 0.3, 0.7));
        assert_eq!(view, start);
    }

    #[test]
    fn test_invalid_factor_rejected() {
        let start = ViewTransform::default();
        for factor in [0.0, -1.1, f64::NAN, f64::INFINITY] {
            let mut view = start;
            assert!(!view.zoom_around_anchor(factor, 10.0, 10.0));
            assert_eq!(view, start);
        }
    }

    #[test]
    fn test_scale_is_clamped_and_anchor_holds() {
        let mut view = ViewTransform {
            scale: MAX_SCALE / 2.0,
            offset_x: -30.0,
            offset_y: 60.0,
        };
        let before = view.screen_to_image(100.0, 100.0);
        assert!(view.zoom_around_anchor(10.0, 100.0, 100.0));
        assert_eq!(view.scale, MAX_SCALE);
        let after = view.screen_to_image(100.0, 100.0);
        assert!((before.0 - after.0).abs() < 1e-6);
        assert!((before.1 - after.1).abs() < 1e-6);

        // Already pinned: further zoom-in changes nothing
        let pinned = view;
        assert!(!view.zoom_around_anchor(1.1, 5.0, 5.0));
        assert_eq!(view, pinned);

        let mut view = ViewTransform::default();
        for _ in 0..10_000 {
            view.zoom_around_anchor(1.0 / 1.1, 0.0, 0.0);
        }
        assert_eq!(view.scale, MIN_SCALE);
    }

    #[test]
    fn test_centered_scenario() {
        let mut view = ViewTransform::centered((100, 50), (800, 600), 1.0);
        assert_eq!(view.scale, 1.0);
        assert_eq!(view.offset_x, 350.0);
        assert_eq!(view.offset_y, 275.0);

        view.zoom_around_anchor(1.1, 400.0, 300.0);
        assert_close(view.scale, 1.1);
        assert_close(view.offset_x, 345.0);
        assert_close(view.offset_y, 272.5);
    }

    #[test]
    fn test_centered_rejects_bad_scale() {
        let view = ViewTransform::centered((10, 10), (20, 20), 0.0);
        assert_eq!(view.scale, 1.0);
        assert_eq!(view.offset_x, 5.0);
    }

    #[test]
    fn test_pixel_rect() {
        let view = ViewTransform {
            scale: 2.5,
            offset_x: 10.0,
            offset_y: -4.0,
        };
        let rect = view.pixel_rect(3, 2);
        assert_eq!(
            rect,
            RectF {
                x: 17.5,
                y: 1.0,
                w: 2.5,
                h: 2.5
            }
        );
    }
}

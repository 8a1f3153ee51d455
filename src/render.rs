// Rendering module
// Immediate-mode per-pixel drawing of the image through the view transform

use crate::image_loader::ImageData;
use crate::view::{RectF, ViewTransform};

/// Background colour behind the image
pub const BACKGROUND: Rgba = Rgba([0, 0, 0, 255]);

/// Straight (non-premultiplied) RGBA colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba(pub [u8; 4]);

/// Minimal drawing surface: a current colour, clear, and rectangle fill
pub trait RenderTarget {
    /// Target size in pixels
    fn size(&self) -> (u32, u32);

    fn set_draw_color(&mut self, color: Rgba);

    /// Fill the whole target with the current draw colour
    fn clear(&mut self);

    /// Fill `rect` with the current draw colour
    fn fill_rect(&mut self, rect: RectF);
}

/// Software target over an XRGB8888 buffer (little-endian B, G, R, X bytes)
pub struct Framebuffer<'a> {
    pixels: &'a mut [u32],
    width: u32,
    height: u32,
    color: u32,
}

impl<'a> Framebuffer<'a> {
    /// Wrap a `width * height * 4` byte canvas.
    ///
    /// Returns `None` if the canvas has the wrong length or is not 4-byte
    /// aligned.
    pub fn new(canvas: &'a mut [u8], width: u32, height: u32) -> Option<Self> {
        if canvas.len() != width as usize * height as usize * 4 {
            return None;
        }
        let pixels = bytemuck::try_cast_slice_mut(canvas).ok()?;
        Some(Self {
            pixels,
            width,
            height,
            color: 0,
        })
    }

    /// Pixel value at `(x, y)` as `0x00RRGGBB`
    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        self.pixels[(y * self.width + x) as usize] & 0x00ff_ffff
    }
}

/// Snap a span to pixel indices, clipped to `[0, limit)`
fn span(start: f64, len: f64, limit: u32) -> (usize, usize) {
    let lo = start.round().clamp(0.0, limit as f64) as usize;
    let hi = (start + len).round().clamp(0.0, limit as f64) as usize;
    (lo, hi)
}

impl RenderTarget for Framebuffer<'_> {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn set_draw_color(&mut self, color: Rgba) {
        let [r, g, b, _] = color.0;
        self.color = 0xff00_0000 | (r as u32) << 16 | (g as u32) << 8 | b as u32;
    }

    fn clear(&mut self) {
        self.pixels.fill(self.color);
    }

    fn fill_rect(&mut self, rect: RectF) {
        let (x0, x1) = span(rect.x, rect.w, self.width);
        let (y0, y1) = span(rect.y, rect.h, self.height);
        if x0 >= x1 {
            return;
        }

        let stride = self.width as usize;
        for y in y0..y1 {
            self.pixels[y * stride + x0..y * stride + x1].fill(self.color);
        }
    }
}

/// Whether `rect` can touch any pixel of a `width` x `height` target
fn is_visible(rect: &RectF, (width, height): (u32, u32)) -> bool {
    rect.x + rect.w >= 0.0
        && rect.y + rect.h >= 0.0
        && rect.x <= width as f64
        && rect.y <= height as f64
}

/// Draw every image pixel as a `scale`-sized rectangle, row by row
pub fn draw_image<T: RenderTarget>(target: &mut T, image: &ImageData, view: &ViewTransform) {
    let bounds = target.size();

    for y in 0..image.height {
        for x in 0..image.width {
            let rect = view.pixel_rect(x, y);
            if !is_visible(&rect, bounds) {
                continue;
            }
            target.set_draw_color(Rgba(image.pixel(x, y)));
            target.fill_rect(rect);
        }
    }
}

/// Produce one frame: clear to the background, then draw the image
pub fn render_frame<T: RenderTarget>(target: &mut T, image: &ImageData, view: &ViewTransform) {
    target.set_draw_color(BACKGROUND);
    target.clear();
    draw_image(target, image, view);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Call {
        Color(Rgba),
        Clear,
        Fill(RectF),
    }

    struct Recorder {
        size: (u32, u32),
        calls: Vec<Call>,
    }

    impl Recorder {
        fn new(width: u32, height: u32) -> Self {
            Self {
                size: (width, height),
                calls: Vec::new(),
            }
        }
    }

    impl RenderTarget for Recorder {
        fn size(&self) -> (u32, u32) {
            self.size
        }

        fn set_draw_color(&mut self, color: Rgba) {
            self.calls.push(Call::Color(color));
        }

        fn clear(&mut self) {
            self.calls.push(Call::Clear);
        }

        fn fill_rect(&mut self, rect: RectF) {
            self.calls.push(Call::Fill(rect));
        }
    }

    fn checker() -> ImageData {
        // 2x2: red, green / blue, white
        ImageData {
            width: 2,
            height: 2,
            channels: 4,
            rgba_data: vec![
                255, 0, 0, 255, 0, 255, 0, 255, //
                0, 0, 255, 255, 255, 255, 255, 255,
            ],
        }
    }

    #[test]
    fn test_frame_clears_then_draws_row_major() {
        let view = ViewTransform {
            scale: 2.0,
            offset_x: 10.0,
            offset_y: 5.0,
        };
        let mut target = Recorder::new(100, 100);
        render_frame(&mut target, &checker(), &view);

        let rect = |x, y| {
            Call::Fill(RectF {
                x,
                y,
                w: 2.0,
                h: 2.0,
            })
        };
        assert_eq!(
            target.calls,
            vec![
                Call::Color(BACKGROUND),
                Call::Clear,
                Call::Color(Rgba([255, 0, 0, 255])),
                rect(10.0, 5.0),
                Call::Color(Rgba([0, 255, 0, 255])),
                rect(12.0, 5.0),
                Call::Color(Rgba([0, 0, 255, 255])),
                rect(10.0, 7.0),
                Call::Color(Rgba([255, 255, 255, 255])),
                rect(12.0, 7.0),
            ]
        );
    }

    #[test]
    fn test_offscreen_pixels_are_skipped() {
        let view = ViewTransform {
            scale: 10.0,
            offset_x: -15.0,
            offset_y: 0.0,
        };
        let mut target = Recorder::new(100, 100);
        draw_image(&mut target, &checker(), &view);

        let fills: Vec<_> = target
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Fill(r) => Some(r.x),
                _ => None,
            })
            .collect();
        // Column 0 spans [-15, -5) and never reaches the target
        assert_eq!(fills, vec![-5.0, -5.0]);
    }

    #[test]
    fn test_framebuffer_renders_scaled_image() {
        let mut backing = vec![0u32; 8 * 6];
        let canvas: &mut [u8] = bytemuck::cast_slice_mut(backing.as_mut_slice());
        let mut fb = Framebuffer::new(canvas, 8, 6).unwrap();

        let view = ViewTransform {
            scale: 3.0,
            offset_x: 1.0,
            offset_y: 0.0,
        };
        render_frame(&mut fb, &checker(), &view);

        assert_eq!(fb.pixel(0, 0), 0x000000);
        assert_eq!(fb.pixel(1, 0), 0xff0000);
        assert_eq!(fb.pixel(3, 2), 0xff0000);
        assert_eq!(fb.pixel(4, 2), 0x00ff00);
        assert_eq!(fb.pixel(6, 2), 0x00ff00);
        assert_eq!(fb.pixel(7, 2), 0x000000);
        assert_eq!(fb.pixel(1, 3), 0x0000ff);
        assert_eq!(fb.pixel(5, 5), 0xffffff);
    }

    #[test]
    fn test_fill_rect_clips_to_bounds() {
        let mut backing = vec![0u32; 4 * 4];
        let canvas: &mut [u8] = bytemuck::cast_slice_mut(backing.as_mut_slice());
        let mut fb = Framebuffer::new(canvas, 4, 4).unwrap();

        fb.set_draw_color(Rgba([1, 2, 3, 0]));
        fb.fill_rect(RectF {
            x: -10.0,
            y: 2.0,
            w: 100.0,
            h: 100.0,
        });

        assert_eq!(fb.pixel(0, 1), 0);
        assert_eq!(fb.pixel(0, 2), 0x010203);
        assert_eq!(fb.pixel(3, 3), 0x010203);
    }

    #[test]
    fn test_framebuffer_rejects_wrong_length() {
        let mut backing = vec![0u32; 3];
        let canvas: &mut [u8] = bytemuck::cast_slice_mut(backing.as_mut_slice());
        assert!(Framebuffer::new(canvas, 2, 2).is_none());
    }
}

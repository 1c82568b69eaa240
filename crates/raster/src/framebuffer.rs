use crate::bitmap::Bitmap;
use crate::color::{Rgba, TRANSPARENT, blend_over};

/// Screen-space rectangle in (possibly fractional) pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Grow on every side by `margin` pixels.
    pub fn inflate(self, margin: f64) -> Self {
        Self {
            x: self.x - margin,
            y: self.y - margin,
            w: self.w + 2.0 * margin,
            h: self.h + 2.0 * margin,
        }
    }
}

/// Source region of a bitmap, in bitmap pixels.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SourceRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Owned off-screen RGBA8 buffer.
///
/// Edges of fractional rectangles are rounded to the nearest pixel, so two
/// rectangles sharing an edge never leave a gap or overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Resize, reallocating only when the dimensions change.
    ///
    /// Returns `true` if the buffer was reallocated.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if self.width == width && self.height == height {
            return false;
        }
        self.width = width;
        self.height = height;
        self.pixels = vec![0; width as usize * height as usize * 4];
        true
    }

    pub fn clear(&mut self, color: Rgba) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&color);
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.index(x, y);
        let p = &self.pixels[i..i + 4];
        Some([p[0], p[1], p[2], p[3]])
    }

    /// Fill a rectangle, clipped to the buffer. Returns the pixels touched.
    pub fn fill_rect(&mut self, rect: Rect, color: Rgba) -> usize {
        let Some((x0, y0, x1, y1)) = self.clip(rect) else {
            return 0;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                self.put(x, y, color);
            }
        }
        ((x1 - x0) * (y1 - y0)) as usize
    }

    pub fn hline(&mut self, x: f64, y: f64, len: f64, color: Rgba) -> usize {
        self.fill_rect(Rect::new(x, y, len, 1.0), color)
    }

    pub fn vline(&mut self, x: f64, y: f64, len: f64, color: Rgba) -> usize {
        self.fill_rect(Rect::new(x, y, 1.0, len), color)
    }

    /// Stroke the inside of `rect` with a border `width` pixels thick.
    pub fn stroke_rect(&mut self, rect: Rect, width: f64, color: Rgba) -> usize {
        let w = width.min(rect.w / 2.0).min(rect.h / 2.0).max(0.0);
        if w == 0.0 {
            return 0;
        }
        let inner_h = rect.h - 2.0 * w;
        self.fill_rect(Rect::new(rect.x, rect.y, rect.w, w), color)
            + self.fill_rect(Rect::new(rect.x, rect.y + rect.h - w, rect.w, w), color)
            + self.fill_rect(Rect::new(rect.x, rect.y + w, w, inner_h), color)
            + self.fill_rect(Rect::new(rect.x + rect.w - w, rect.y + w, w, inner_h), color)
    }

    /// Draw `src` of `bitmap` scaled into `dst`, nearest-neighbour, source-over.
    pub fn draw_bitmap(&mut self, bitmap: &Bitmap, src: SourceRect, dst: Rect) -> usize {
        let src = SourceRect {
            w: src.w.min(bitmap.width().saturating_sub(src.x)),
            h: src.h.min(bitmap.height().saturating_sub(src.y)),
            ..src
        };
        if src.w == 0 || src.h == 0 || dst.w <= 0.0 || dst.h <= 0.0 {
            return 0;
        }
        let Some((x0, y0, x1, y1)) = self.clip(dst) else {
            return 0;
        };
        let sx_per_px = src.w as f64 / dst.w;
        let sy_per_px = src.h as f64 / dst.h;
        for y in y0..y1 {
            let sy = (((y as f64 + 0.5) - dst.y) * sy_per_px).floor() as i64;
            let sy = src.y + sy.clamp(0, src.h as i64 - 1) as u32;
            for x in x0..x1 {
                let sx = (((x as f64 + 0.5) - dst.x) * sx_per_px).floor() as i64;
                let sx = src.x + sx.clamp(0, src.w as i64 - 1) as u32;
                let color = bitmap.pixel(sx, sy).unwrap_or(TRANSPARENT);
                let i = self.index(x, y);
                let under = [
                    self.pixels[i],
                    self.pixels[i + 1],
                    self.pixels[i + 2],
                    self.pixels[i + 3],
                ];
                self.put(x, y, blend_over(under, color));
            }
        }
        ((x1 - x0) * (y1 - y0)) as usize
    }

    pub fn to_bitmap(&self) -> Bitmap {
        Bitmap::from_rgba(self.width, self.height, self.pixels.clone())
            .unwrap_or_else(|_| Bitmap::solid(0, 0, TRANSPARENT))
    }

    fn clip(&self, rect: Rect) -> Option<(u32, u32, u32, u32)> {
        let clamp_x = |v: f64| v.round().clamp(0.0, self.width as f64) as u32;
        let clamp_y = |v: f64| v.round().clamp(0.0, self.height as f64) as u32;
        let (x0, x1) = (clamp_x(rect.x), clamp_x(rect.x + rect.w));
        let (y0, y1) = (clamp_y(rect.y), clamp_y(rect.y + rect.h));
        (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    #[inline]
    fn put(&mut self, x: u32, y: u32, color: Rgba) {
        let i = self.index(x, y);
        self.pixels[i..i + 4].copy_from_slice(&color);
    }
}

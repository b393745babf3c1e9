/*
 *  display/framebuffer.rs
 *
 *  SpotPix - now playing, pixel by pixel
 *  (c) 2020-26 Stuart Hunter
 *
 *  Runtime-sized RGB framebuffer shared by every device surface
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use core::convert::Infallible;
use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::mono_font::{ascii::FONT_4X6, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};
use image::imageops::FilterType;
use image::RgbImage;

/// Decoded, displayable picture (artwork, placeholder).
pub type Bitmap = RgbImage;

/// A runtime-sized RGB framebuffer for embedded-graphics.
///
/// All drawing here is a pure buffer mutation; nothing reaches a device
/// until a driver serializes the buffer on commit.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    buf: Vec<Rgb888>,
    w: usize,
    h: usize,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let (w, h) = (width as usize, height as usize);
        Self { buf: vec![Rgb888::BLACK; w * h], w, h }
    }

    pub fn width(&self) -> usize { self.w }
    pub fn height(&self) -> usize { self.h }

    pub fn as_slice(&self) -> &[Rgb888] { &self.buf }

    /// Clear to a color
    pub fn clear_color(&mut self, color: Rgb888) {
        self.buf.fill(color);
    }

    /// Color at (x,y), None when out of bounds
    pub fn pixel_at(&self, x: i32, y: i32) -> Option<Rgb888> {
        self.idx(Point::new(x, y)).map(|i| self.buf[i])
    }

    pub fn set_pixel(&mut self, at: Point, color: Rgb888) {
        if let Some(i) = self.idx(at) {
            self.buf[i] = color;
        }
    }

    /// Fill the rectangle spanned by two inclusive corners.
    pub fn fill_rect(&mut self, top_left: Point, bottom_right: Point, color: Rgb888) {
        let _ = Rectangle::with_corners(top_left, bottom_right)
            .into_styled(PrimitiveStyle::with_fill(color))
            .draw(self);
    }

    /// Draw text in the 4x6 font with `at` as the top-left of the first glyph.
    pub fn draw_text(&mut self, text: &str, at: Point, color: Rgb888) {
        let style = MonoTextStyle::new(&FONT_4X6, color);
        let _ = Text::with_baseline(text, at, style, Baseline::Top).draw(self);
    }

    /// Copy a full-frame image into the buffer, resampling when the
    /// dimensions differ (nearest neighbour keeps pixel art crisp).
    pub fn blit(&mut self, bitmap: &Bitmap) {
        let (w, h) = (self.w as u32, self.h as u32);
        let scaled;
        let src = if bitmap.width() == w && bitmap.height() == h {
            bitmap
        } else {
            scaled = image::imageops::resize(bitmap, w, h, FilterType::Nearest);
            &scaled
        };
        for (x, y, px) in src.enumerate_pixels() {
            let [r, g, b] = px.0;
            self.buf[y as usize * self.w + x as usize] = Rgb888::new(r, g, b);
        }
    }

    /// Packed RGB bytes, row-major, as the device expects them.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.buf.len() * 3);
        for c in &self.buf {
            out.extend_from_slice(&[c.r(), c.g(), c.b()]);
        }
        out
    }

    /// Map (x,y) to linear index; returns None if out of bounds
    #[inline]
    fn idx(&self, p: Point) -> Option<usize> {
        if p.x >= 0 && p.y >= 0 {
            let (x, y) = (p.x as usize, p.y as usize);
            if x < self.w && y < self.h {
                return Some(y * self.w + x);
            }
        }
        None
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(self.w as u32, self.h as u32)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, c) in pixels {
            if let Some(i) = self.idx(p) {
                self.buf[i] = c;
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.clear_color(color);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_rect_is_inclusive() {
        let mut fb = FrameBuffer::new(64, 64);
        let grey = Rgb888::new(51, 51, 51);
        fb.fill_rect(Point::new(44, 56), Point::new(62, 62), grey);

        assert_eq!(fb.pixel_at(44, 56), Some(grey));
        assert_eq!(fb.pixel_at(62, 62), Some(grey));
        assert_eq!(fb.pixel_at(63, 63), Some(Rgb888::BLACK));
        assert_eq!(fb.pixel_at(43, 56), Some(Rgb888::BLACK));
    }

    #[test]
    fn test_out_of_bounds_pixel_ignored() {
        let mut fb = FrameBuffer::new(16, 16);
        fb.set_pixel(Point::new(16, 0), Rgb888::WHITE);
        fb.set_pixel(Point::new(-1, 3), Rgb888::WHITE);
        assert!(fb.as_slice().iter().all(|c| *c == Rgb888::BLACK));
        assert_eq!(fb.pixel_at(16, 0), None);
    }

    #[test]
    fn test_blit_resamples_to_frame_size() {
        let mut fb = FrameBuffer::new(64, 64);
        let art = RgbImage::from_pixel(300, 300, image::Rgb([200, 10, 20]));
        fb.blit(&art);
        assert_eq!(fb.pixel_at(0, 0), Some(Rgb888::new(200, 10, 20)));
        assert_eq!(fb.pixel_at(63, 63), Some(Rgb888::new(200, 10, 20)));
    }

    #[test]
    fn test_rgb_bytes_layout() {
        let mut fb = FrameBuffer::new(2, 1);
        fb.set_pixel(Point::new(1, 0), Rgb888::new(1, 2, 3));
        assert_eq!(fb.to_rgb_bytes(), vec![0, 0, 0, 1, 2, 3]);
    }

    #[test]
    fn test_text_marks_pixels() {
        let mut fb = FrameBuffer::new(64, 64);
        fb.draw_text("12", Point::new(45, 57), Rgb888::WHITE);
        let lit = fb.as_slice().iter().filter(|c| **c == Rgb888::WHITE).count();
        assert!(lit > 0);
        // nothing above the glyph cell
        for x in 0..64 {
            assert_eq!(fb.pixel_at(x, 56), Some(Rgb888::BLACK));
        }
    }
}

/*
 *  display/components/placeholder.rs
 *
 *  SpotPix - now playing, pixel by pixel
 *  (c) 2020-26 Stuart Hunter
 *
 *  Static picture shown while a podcast episode plays
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

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, PrimitiveStyle, Rectangle};
use image::{Rgb, RgbImage};
use log::{info, warn};
use std::path::Path;

use crate::display::framebuffer::{Bitmap, FrameBuffer};

const PODCAST_PURPLE: Rgb888 = Rgb888::new(140, 60, 200);

/// Load the podcast placeholder from disk, falling back to a generated
/// microphone glyph when the file is missing or unreadable.
pub fn load_podcast_placeholder(path: &Path, width: u32, height: u32) -> Bitmap {
    match image::open(path) {
        Ok(img) => {
            info!("Podcast placeholder loaded from {}", path.display());
            img.to_rgb8()
        }
        Err(e) => {
            warn!("Podcast placeholder {} unavailable ({}), using built-in", path.display(), e);
            builtin_placeholder(width, height)
        }
    }
}

/// Purple field with a white microphone, scaled to the display
pub fn builtin_placeholder(width: u32, height: u32) -> Bitmap {
    let mut fb = FrameBuffer::new(width, height);
    fb.clear_color(PODCAST_PURPLE);

    let (w, h) = (width as i32, height as i32);
    let head = (w / 4).max(3) as u32;
    let head_top_left = Point::new(w / 2 - head as i32 / 2, h / 5);
    let _ = Circle::new(head_top_left, head)
        .into_styled(PrimitiveStyle::with_fill(Rgb888::WHITE))
        .draw(&mut fb);

    let stem_top = head_top_left.y + head as i32;
    let _ = Rectangle::with_corners(Point::new(w / 2 - 1, stem_top), Point::new(w / 2, stem_top + h / 6))
        .into_styled(PrimitiveStyle::with_fill(Rgb888::WHITE))
        .draw(&mut fb);

    let base_y = stem_top + h / 6;
    let _ = Rectangle::with_corners(Point::new(w / 2 - w / 8, base_y), Point::new(w / 2 + w / 8, base_y + 1))
        .into_styled(PrimitiveStyle::with_fill(Rgb888::WHITE))
        .draw(&mut fb);

    let mut img = RgbImage::new(width, height);
    for (x, y, px) in img.enumerate_pixels_mut() {
        if let Some(c) = fb.pixel_at(x as i32, y as i32) {
            *px = Rgb([c.r(), c.g(), c.b()]);
        }
    }
    img
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_has_display_size() {
        let img = builtin_placeholder(64, 64);
        assert_eq!(img.dimensions(), (64, 64));
        assert_eq!(img.get_pixel(0, 0), &Rgb([140, 60, 200]));
        assert!(img.pixels().any(|p| *p == Rgb([255, 255, 255])));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let img = load_podcast_placeholder(Path::new("/nonexistent/Podcast.png"), 32, 32);
        assert_eq!(img.dimensions(), (32, 32));
    }
}

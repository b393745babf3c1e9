/*
 *  display/traits.rs
 *
 *  SpotPix - now playing, pixel by pixel
 *  (c) 2020-26 Stuart Hunter
 *
 *  Core trait definitions for display surface abstraction
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

use async_trait::async_trait;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;

use crate::display::error::DisplayError;
use crate::display::framebuffer::{Bitmap, FrameBuffer};

/// Display capabilities and metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayCapabilities {
    /// Display width in pixels
    pub width: u32,

    /// Display height in pixels
    pub height: u32,
}

/// Minimal surface abstraction - every display driver implements this trait
///
/// Drawing primitives only mutate the driver's framebuffer. `commit` is the
/// one operation with a visible effect: it pushes whatever is pending
/// (a frame, or a blank request) to the device.
///
/// Surfaces do no locking of their own. Callers serialize whole
/// draw-then-commit sequences through [`crate::display::DeviceLock`].
#[async_trait]
pub trait DeviceSurface: Send {
    /// Returns the capabilities of this display
    fn capabilities(&self) -> &DisplayCapabilities;

    /// Returns the display dimensions as (width, height)
    fn dimensions(&self) -> (u32, u32) {
        let caps = self.capabilities();
        (caps.width, caps.height)
    }

    /// Mutable access to the pending frame. Drivers treat this as intent
    /// to push a frame on the next commit.
    fn frame_mut(&mut self) -> &mut FrameBuffer;

    /// Prepare the device (connection check, counters, brightness)
    async fn init(&mut self) -> Result<(), DisplayError> {
        Ok(())
    }

    fn pixel(&mut self, at: Point, color: Rgb888) -> Result<(), DisplayError> {
        self.frame_mut().set_pixel(at, color);
        Ok(())
    }

    /// Fill between two inclusive corners
    fn filled_rect(&mut self, top_left: Point, bottom_right: Point, color: Rgb888) -> Result<(), DisplayError> {
        self.frame_mut().fill_rect(top_left, bottom_right, color);
        Ok(())
    }

    fn text(&mut self, text: &str, at: Point, color: Rgb888) -> Result<(), DisplayError> {
        self.frame_mut().draw_text(text, at, color);
        Ok(())
    }

    /// Replace the whole frame with an image, resampled to fit
    fn image(&mut self, bitmap: &Bitmap) -> Result<(), DisplayError> {
        self.frame_mut().blit(bitmap);
        Ok(())
    }

    /// Request the device's built-in blank/idle mode on the next commit.
    /// Any later primitive cancels the request in favour of a frame push.
    fn blank(&mut self) -> Result<(), DisplayError>;

    /// Flush whatever is pending to the device
    async fn commit(&mut self) -> Result<(), DisplayError>;
}

/// Boxed surface as held by the device lock
pub type BoxedSurface = Box<dyn DeviceSurface>;

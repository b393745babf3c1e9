/*
 *  display/components/clock.rs
 *
 *  SpotPix - now playing, pixel by pixel
 *  (c) 2020-26 Stuart Hunter
 *
 *  Corner clock overlay component
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

use chrono::{FixedOffset, Local, NaiveTime, Utc};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;

use crate::display::error::DisplayError;
use crate::display::traits::DeviceSurface;

/// Block fill behind the glyphs
pub const CLOCK_BACKGROUND: Rgb888 = Rgb888::new(51, 51, 51);
/// Glyph color
pub const CLOCK_FOREGROUND: Rgb888 = Rgb888::new(255, 255, 255);

// block footprint, anchored to the bottom-right corner
const BLOCK_WIDTH: i32 = 19;
const BLOCK_HEIGHT: i32 = 14;
const CORNER_MARGIN: i32 = 1;

/// Positions of every clock element for one display size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockLayout {
    pub block_top_left: Point,
    pub block_bottom_right: Point,
    pub hours: Point,
    pub minutes: Point,
    pub meridiem: Point,
    pub colon: [Point; 2],
}

impl ClockLayout {
    /// Layout for a display of the given size; on a 64x64 panel the block
    /// spans (44,49)-(62,62) with the time on its bottom row.
    pub fn for_display(width: u32, height: u32) -> Self {
        let right = width as i32 - 1 - CORNER_MARGIN;
        let bottom = height as i32 - 1 - CORNER_MARGIN;
        let left = right - (BLOCK_WIDTH - 1);
        let top = bottom - (BLOCK_HEIGHT - 1);

        Self {
            block_top_left: Point::new(left, top),
            block_bottom_right: Point::new(right, bottom),
            hours: Point::new(left + 1, bottom - 5),
            minutes: Point::new(left + 11, bottom - 5),
            meridiem: Point::new(left + 11, top + 1),
            colon: [Point::new(left + 9, bottom - 4), Point::new(left + 9, bottom - 2)],
        }
    }
}

/// Where the wall-clock time comes from
#[derive(Debug, Clone, Copy)]
pub enum TimeSource {
    /// The host's configured local zone
    SystemLocal,
    /// A fixed offset from UTC
    Fixed(FixedOffset),
}

impl TimeSource {
    /// Build from an optional offset in minutes east of UTC
    pub fn from_offset_minutes(minutes: Option<i32>) -> Self {
        minutes
            .and_then(|m| FixedOffset::east_opt(m * 60))
            .map(TimeSource::Fixed)
            .unwrap_or(TimeSource::SystemLocal)
    }

    pub fn now(&self) -> NaiveTime {
        match self {
            TimeSource::SystemLocal => Local::now().time(),
            TimeSource::Fixed(offset) => Utc::now().with_timezone(offset).time(),
        }
    }
}

/// 12-hour clock glyph block
#[derive(Debug, Clone)]
pub struct ClockFace {
    layout: ClockLayout,
    source: TimeSource,
}

impl ClockFace {
    pub fn new(width: u32, height: u32, source: TimeSource) -> Self {
        Self {
            layout: ClockLayout::for_display(width, height),
            source,
        }
    }

    pub fn now(&self) -> NaiveTime {
        self.source.now()
    }

    /// Paint the opaque block and the time onto the surface buffer.
    /// Does not commit.
    pub fn draw(&self, device: &mut dyn DeviceSurface, time: NaiveTime) -> Result<(), DisplayError> {
        let l = &self.layout;
        let hours = time.format("%I").to_string();
        let minutes = time.format("%M").to_string();
        let meridiem = time.format("%p").to_string();

        device.filled_rect(l.block_top_left, l.block_bottom_right, CLOCK_BACKGROUND)?;
        device.pixel(l.colon[0], CLOCK_FOREGROUND)?;
        device.pixel(l.colon[1], CLOCK_FOREGROUND)?;
        device.text(&hours, l.hours, CLOCK_FOREGROUND)?;
        device.text(&minutes, l.minutes, CLOCK_FOREGROUND)?;
        device.text(&meridiem, l.meridiem, CLOCK_FOREGROUND)?;
        Ok(())
    }
}

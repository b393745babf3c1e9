/*
 *  display/mod.rs
 *
 *  SpotPix - now playing, pixel by pixel
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display subsystem - surface abstraction, drivers and drawn components
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

// Core trait definitions
pub mod traits;
pub mod error;
pub mod framebuffer;
pub mod lock;

// Display drivers
pub mod drivers;

// UI components
pub mod components;

// Re-exports for convenience
pub use traits::{DeviceSurface, DisplayCapabilities, BoxedSurface};
pub use error::DisplayError;
pub use framebuffer::{Bitmap, FrameBuffer};
pub use lock::{DeviceGuard, DeviceLock};
pub use components::clock::{ClockFace, ClockLayout, TimeSource};

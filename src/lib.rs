/*
 *  lib.rs
 *
 *  SpotPix - now playing, pixel by pixel
 *  (c) 2020-26 Stuart Hunter
 *
 *  Mirrors Spotify playback onto a Divoom Pixoo panel: cover art while a
 *  track plays, a podcast picture for episodes, a corner clock on top,
 *  and the device's own face when nothing is playing.
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

pub mod artwork;
pub mod config;
pub mod display;
pub mod error;
pub mod overlay;
pub mod reconciler;
pub mod snapshot;
pub mod spotify;

pub use artwork::{ArtworkFetcher, ArtworkSource, RetryPolicy};
pub use error::{ArtworkError, PlaybackError};
pub use overlay::{ClockOverlay, OverlayFlag};
pub use reconciler::{CycleOutcome, DisplayMode, PollIntervals, StateReconciler};
pub use snapshot::{ContentKind, PlaybackService, PlaybackSnapshot, PlaybackSnapshotSource, SnapshotSource};

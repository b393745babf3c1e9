/*
 *  error.rs
 *
 *  SpotPix - now playing, pixel by pixel
 *  (c) 2020-26 Stuart Hunter
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

use thiserror::Error;

/// Why a playback snapshot could not be produced
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Credentials could not be renewed, or were refused again after renewal
    #[error("playback authorization failed: {0}")]
    Auth(String),

    /// Network failure, timeout, 5xx or an unreadable reply
    #[error("playback query failed: {0}")]
    Transient(String),
}

/// Why cover art could not be turned into a bitmap
#[derive(Debug, Error)]
pub enum ArtworkError {
    /// The server answered with a status that is not worth retrying
    #[error("artwork request returned HTTP {0}")]
    Status(u16),

    /// Every attempt failed with a retryable condition
    #[error("artwork fetch gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },

    #[error("artwork bytes could not be decoded: {0}")]
    Decode(#[from] image::ImageError),

    #[error("artwork URL missing")]
    MissingUrl,
}

/*
 *  spotify/models.rs
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

//! Wire types for the subset of the Web API that SpotPix reads.

use serde::Deserialize;

/// `GET /v1/me/player` body
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentPlayback {
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub currently_playing_type: PlayingType,
    pub item: Option<PlaybackItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayingType {
    Track,
    Episode,
    Ad,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Track or episode object; only the fields we need
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackItem {
    /// null for local files
    pub id: Option<String>,
    pub album: Option<Album>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Album {
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Image {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Smallest rendition at least `target` pixels wide, else the widest one.
pub fn pick_artwork(images: &[Image], target: u32) -> Option<&Image> {
    images
        .iter()
        .filter(|i| i.width.is_some_and(|w| w >= target))
        .min_by_key(|i| i.width)
        .or_else(|| images.iter().max_by_key(|i| i.width.unwrap_or(0)))
}

/// Accounts service token reply
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: u64,
    /// present only when the refresh token was rotated
    pub refresh_token: Option<String>,
}

/// Accounts service error reply, e.g. `{"error":"invalid_grant"}`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,
    pub error_description: Option<String>,
}

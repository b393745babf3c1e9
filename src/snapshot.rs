/*
 *  snapshot.rs
 *
 *  SpotPix - now playing, pixel by pixel
 *  (c) 2020-26 Stuart Hunter
 *
 *  Condense the remote playback state into what the display cares about
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
use log::{debug, info, warn};

use crate::error::PlaybackError;
use crate::spotify::error::ServiceError;
use crate::spotify::models::{pick_artwork, CurrentPlayback, PlayingType};

/// What is currently playing, reduced to a display decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    None,
    Track,
    Episode,
}

/// One poll's worth of playback state.
///
/// `content_id` and `artwork_url` are only ever set for tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    pub active: bool,
    pub content_kind: ContentKind,
    pub content_id: Option<String>,
    pub artwork_url: Option<String>,
}

impl PlaybackSnapshot {
    pub fn inactive() -> Self {
        Self {
            active: false,
            content_kind: ContentKind::None,
            content_id: None,
            artwork_url: None,
        }
    }

    pub fn track(id: &str, artwork_url: Option<&str>) -> Self {
        Self {
            active: true,
            content_kind: ContentKind::Track,
            content_id: Some(id.to_string()),
            artwork_url: artwork_url.map(str::to_string),
        }
    }

    pub fn episode() -> Self {
        Self {
            active: true,
            content_kind: ContentKind::Episode,
            content_id: None,
            artwork_url: None,
        }
    }

    /// Reduce a playback reply. `None` (nothing on any device) is inactive.
    /// Artwork is chosen for a display `target_width` pixels wide.
    pub fn from_playback(playback: Option<&CurrentPlayback>, target_width: u32) -> Self {
        let Some(pb) = playback else {
            return Self::inactive();
        };

        let content_kind = match (pb.currently_playing_type, pb.item.as_ref()) {
            (PlayingType::Track, Some(_)) => ContentKind::Track,
            (PlayingType::Episode, _) => ContentKind::Episode,
            _ => ContentKind::None,
        };

        let (content_id, artwork_url) = match (content_kind, pb.item.as_ref()) {
            (ContentKind::Track, Some(item)) => {
                let url = item
                    .album
                    .as_ref()
                    .and_then(|a| pick_artwork(&a.images, target_width))
                    .map(|i| i.url.clone());
                (item.id.clone(), url)
            }
            _ => (None, None),
        };

        Self {
            active: pb.is_playing,
            content_kind,
            content_id,
            artwork_url,
        }
    }
}

/// Remote playback service; implemented by the Spotify client
#[async_trait]
pub trait PlaybackService: Send {
    /// Current playback, or `None` when no device is active
    async fn current_playback(&mut self) -> Result<Option<CurrentPlayback>, ServiceError>;

    /// Obtain a new access token from the long-lived credentials
    async fn reauthenticate(&mut self) -> Result<(), ServiceError>;
}

/// Anything that can hand the reconciler a snapshot
#[async_trait]
pub trait SnapshotSource: Send {
    async fn snapshot(&mut self) -> Result<PlaybackSnapshot, PlaybackError>;
}

/// Polls a [`PlaybackService`], renewing credentials at most once per call.
pub struct PlaybackSnapshotSource<S> {
    service: S,
    artwork_width: u32,
}

impl<S: PlaybackService> PlaybackSnapshotSource<S> {
    pub fn new(service: S, artwork_width: u32) -> Self {
        Self { service, artwork_width }
    }

    pub fn service(&self) -> &S {
        &self.service
    }
}

fn classify(e: ServiceError) -> PlaybackError {
    if e.is_auth() {
        PlaybackError::Auth(e.to_string())
    } else {
        PlaybackError::Transient(e.to_string())
    }
}

#[async_trait]
impl<S: PlaybackService> SnapshotSource for PlaybackSnapshotSource<S> {
    async fn snapshot(&mut self) -> Result<PlaybackSnapshot, PlaybackError> {
        let playback = match self.service.current_playback().await {
            Ok(pb) => pb,
            Err(ServiceError::AuthExpired) => {
                info!("Spotify authorization expired, re-authenticating");
                if let Err(e) = self.service.reauthenticate().await {
                    warn!("Re-authentication failed: {}", e);
                    return Err(classify(e));
                }
                // one retry only; a second expiry is reported, not looped on
                self.service.current_playback().await.map_err(classify)?
            }
            Err(e) => return Err(classify(e)),
        };

        let snap = PlaybackSnapshot::from_playback(playback.as_ref(), self.artwork_width);
        debug!(
            "snapshot: active={} kind={:?} id={:?}",
            snap.active, snap.content_kind, snap.content_id
        );
        Ok(snap)
    }
}

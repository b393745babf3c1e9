/*
 *  reconciler.rs
 *
 *  SpotPix - now playing, pixel by pixel
 *  (c) 2020-26 Stuart Hunter
 *
 *  Poll playback, decide what the panel should show, redraw on change
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
use log::{debug, error, info, warn};
use std::fmt;
use std::time::Duration;

use crate::artwork::ArtworkSource;
use crate::config::PollConfig;
use crate::display::{Bitmap, DeviceLock, DisplayError};
use crate::error::{ArtworkError, PlaybackError};
use crate::overlay::OverlayFlag;
use crate::snapshot::{ContentKind, PlaybackSnapshot, SnapshotSource};

/// What the panel is showing, as far as the reconciler is concerned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayMode {
    /// Nothing playing; the device's own idle face
    Cleared,
    /// Something is playing but there is no picture for it
    ClockOnly,
    Podcast,
    /// Cover art for the track with this id
    Artwork(String),
}

impl DisplayMode {
    pub fn derive(snap: &PlaybackSnapshot) -> Self {
        if !snap.active {
            return DisplayMode::Cleared;
        }
        match snap.content_kind {
            ContentKind::Track => match &snap.content_id {
                Some(id) => DisplayMode::Artwork(id.clone()),
                None => DisplayMode::ClockOnly,
            },
            ContentKind::Episode => DisplayMode::Podcast,
            ContentKind::None => DisplayMode::ClockOnly,
        }
    }

    /// The clock shows over anything that is playing
    pub fn overlay_enabled(&self) -> bool {
        !matches!(self, DisplayMode::Cleared)
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayMode::Cleared => write!(f, "cleared"),
            DisplayMode::ClockOnly => write!(f, "clock"),
            DisplayMode::Podcast => write!(f, "podcast"),
            DisplayMode::Artwork(id) => write!(f, "artwork {}", id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    pub active: Duration,
    pub idle: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            active: Duration::from_secs(2),
            idle: Duration::from_secs(10),
        }
    }
}

impl PollIntervals {
    pub fn from_config(cfg: Option<&PollConfig>) -> Self {
        let mut iv = Self::default();
        if let Some(c) = cfg {
            if let Some(s) = c.active_secs { iv.active = Duration::from_secs(s); }
            if let Some(s) = c.idle_secs { iv.idle = Duration::from_secs(s); }
        }
        iv
    }
}

/// Result of one reconcile pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Mode derived from the snapshot
    pub mode: DisplayMode,
    /// Whether the device was touched this cycle
    pub redrawn: bool,
    pub next_delay: Duration,
}

pub struct StateReconciler<S, A> {
    source: S,
    artwork: A,
    device: DeviceLock,
    overlay: OverlayFlag,
    placeholder: Bitmap,
    rendered: Option<DisplayMode>,
    intervals: PollIntervals,
}

impl<S: SnapshotSource, A: ArtworkSource> StateReconciler<S, A> {
    pub fn new(
        source: S,
        artwork: A,
        device: DeviceLock,
        overlay: OverlayFlag,
        placeholder: Bitmap,
        intervals: PollIntervals,
    ) -> Self {
        Self {
            source,
            artwork,
            device,
            overlay,
            placeholder,
            rendered: None,
            intervals,
        }
    }

    /// Mode last committed to the device; `None` before the first draw
    pub fn rendered(&self) -> Option<&DisplayMode> {
        self.rendered.as_ref()
    }

    /// Poll once and bring the panel in line with playback.
    pub async fn cycle(&mut self) -> CycleOutcome {
        let snap = match self.source.snapshot().await {
            Ok(s) => s,
            Err(PlaybackError::Auth(e)) => {
                error!("{}; treating as not playing", e);
                PlaybackSnapshot::inactive()
            }
            Err(e @ PlaybackError::Transient(_)) => {
                warn!("{}; treating as not playing", e);
                PlaybackSnapshot::inactive()
            }
        };

        let mode = DisplayMode::derive(&snap);
        self.overlay.set(mode.overlay_enabled());

        let redrawn = if self.rendered.as_ref() != Some(&mode) {
            info!("display: {} -> {}", self.rendered.as_ref().map_or("none".to_string(), |m| m.to_string()), mode);
            let result = self.render(&mode, snap.artwork_url.as_deref()).await;
            match result {
                Ok(shown) => {
                    self.rendered = Some(shown);
                }
                Err(e) => {
                    error!("Display update for {} failed: {}", mode, e);
                }
            }
            true
        } else {
            debug!("display unchanged ({})", mode);
            false
        };

        let next_delay = if mode == DisplayMode::Cleared {
            self.intervals.idle
        } else {
            self.intervals.active
        };

        CycleOutcome { mode, redrawn, next_delay }
    }

    /// Draw `mode` and commit. Returns the mode actually on the panel,
    /// which is `Cleared` when artwork could not be obtained.
    async fn render(&self, mode: &DisplayMode, artwork_url: Option<&str>) -> Result<DisplayMode, DisplayError> {
        // fetch before taking the device so the clock keeps ticking meanwhile
        let art = match mode {
            DisplayMode::Artwork(id) => {
                let fetched = match artwork_url {
                    Some(url) => self.artwork.fetch(url).await,
                    None => Err(ArtworkError::MissingUrl),
                };
                match fetched {
                    Ok(bmp) => Some(bmp),
                    Err(e) => {
                        warn!("Artwork for {} unavailable: {}", id, e);
                        None
                    }
                }
            }
            _ => None,
        };

        let mut device = self.device.acquire("reconciler").await;
        let shown = match (mode, art) {
            (DisplayMode::Cleared, _) => {
                device.blank()?;
                DisplayMode::Cleared
            }
            (DisplayMode::ClockOnly, _) => {
                let (w, h) = device.dimensions();
                device.filled_rect(Point::zero(), Point::new(w as i32 - 1, h as i32 - 1), Rgb888::BLACK)?;
                DisplayMode::ClockOnly
            }
            (DisplayMode::Podcast, _) => {
                device.image(&self.placeholder)?;
                DisplayMode::Podcast
            }
            (DisplayMode::Artwork(id), Some(bmp)) => {
                device.image(&bmp)?;
                DisplayMode::Artwork(id.clone())
            }
            (DisplayMode::Artwork(_), None) => {
                device.blank()?;
                DisplayMode::Cleared
            }
        };
        device.commit().await?;
        Ok(shown)
    }

    /// Reconcile forever
    pub async fn run(&mut self) {
        info!(
            "Reconciler polling every {:?} while playing, {:?} when idle",
            self.intervals.active, self.intervals.idle
        );
        loop {
            let outcome = self.cycle().await;
            tokio::time::sleep(outcome.next_delay).await;
        }
    }
}

/*
 *  overlay.rs
 *
 *  SpotPix - now playing, pixel by pixel
 *  (c) 2020-26 Stuart Hunter
 *
 *  Periodic corner clock drawn over whatever the reconciler shows
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

use chrono::NaiveTime;
use log::{debug, error, info};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use crate::display::{ClockFace, DeviceLock};

/// Whether the clock should be painted on the next tick.
///
/// Written by the reconciler, read by the overlay without synchronisation
/// beyond the atomic itself. The overlay reads it again once it holds the
/// device, so a clear that lands while it waits for the lock is respected.
/// A toggle made after that second read is seen one tick later.
#[derive(Debug, Clone, Default)]
pub struct OverlayFlag(Arc<AtomicBool>);

impl OverlayFlag {
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    pub fn set(&self, enabled: bool) {
        self.0.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub const DEFAULT_CLOCK_INTERVAL: Duration = Duration::from_secs(10);

pub struct ClockOverlay {
    device: DeviceLock,
    flag: OverlayFlag,
    face: ClockFace,
    interval: Duration,
}

impl ClockOverlay {
    pub fn new(device: DeviceLock, flag: OverlayFlag, face: ClockFace, interval: Duration) -> Self {
        Self { device, flag, face, interval }
    }

    /// One tick at the current wall-clock time. Returns true if a frame was pushed.
    pub async fn tick(&self) -> bool {
        self.tick_at(self.face.now()).await
    }

    /// Draw `time` if the overlay is enabled. The device is not touched at
    /// all while disabled.
    pub async fn tick_at(&self, time: NaiveTime) -> bool {
        if !self.flag.is_enabled() {
            return false;
        }

        let mut device = self.device.acquire("clock").await;
        // the reconciler may have cleared the panel while we waited
        if !self.flag.is_enabled() {
            return false;
        }
        if let Err(e) = self.face.draw(&mut *device, time) {
            error!("Clock draw failed: {}", e);
            return false;
        }
        match device.commit().await {
            Ok(()) => {
                debug!("clock {}", time.format("%I:%M %p"));
                true
            }
            Err(e) => {
                error!("Clock commit failed: {}", e);
                false
            }
        }
    }

    /// Tick forever at the configured interval
    pub async fn run(&self) {
        info!("Clock overlay running every {:?}", self.interval);
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }
}

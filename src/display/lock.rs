/*
 *  display/lock.rs
 *
 *  SpotPix - now playing, pixel by pixel
 *  (c) 2020-26 Stuart Hunter
 *
 *  Scoped exclusive access to the one display surface
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

use log::trace;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex as TokMutex, MutexGuard};

use crate::display::traits::{BoxedSurface, DeviceSurface};

/// Shared handle to the display surface.
///
/// Both the reconciler and the clock overlay draw to the same device. Each
/// of them takes the lock once, issues its primitives, commits, and only
/// then lets go, so a partial clock block can never end up in the same
/// pushed frame as a half-drawn artwork.
///
/// The guard is a tokio guard because it is held across the commit's
/// network round trip.
#[derive(Clone)]
pub struct DeviceLock {
    surface: Arc<TokMutex<BoxedSurface>>,
    acquisitions: Arc<AtomicU64>,
}

impl DeviceLock {
    pub fn new(surface: BoxedSurface) -> Self {
        Self {
            surface: Arc::new(TokMutex::new(surface)),
            acquisitions: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Wait for exclusive access. Hold the guard for the whole
    /// draw-then-commit sequence; dropping it releases the device.
    pub async fn acquire(&self, actor: &'static str) -> DeviceGuard<'_> {
        let guard = self.surface.lock().await;
        let seq = self.acquisitions.fetch_add(1, Ordering::Relaxed) + 1;
        trace!("device lock #{} acquired by {}", seq, actor);
        DeviceGuard { guard, actor, seq }
    }

    /// Total acquisitions so far
    pub fn acquisitions(&self) -> u64 {
        self.acquisitions.load(Ordering::Relaxed)
    }
}

/// Exclusive access to the surface for one draw-then-commit sequence
pub struct DeviceGuard<'a> {
    guard: MutexGuard<'a, BoxedSurface>,
    actor: &'static str,
    seq: u64,
}

impl DeviceGuard<'_> {
    pub fn actor(&self) -> &'static str {
        self.actor
    }
}

impl Deref for DeviceGuard<'_> {
    type Target = dyn DeviceSurface;

    fn deref(&self) -> &Self::Target {
        &**self.guard
    }
}

impl DerefMut for DeviceGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut **self.guard
    }
}

impl Drop for DeviceGuard<'_> {
    fn drop(&mut self) {
        trace!("device lock #{} released by {}", self.seq, self.actor);
    }
}

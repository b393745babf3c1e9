/*
 *  display/drivers/mock.rs
 *
 *  SpotPix - now playing, pixel by pixel
 *  (c) 2020-26 Stuart Hunter
 *
 *  Mock display driver for testing without hardware
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
use crate::display::traits::{DeviceSurface, DisplayCapabilities};

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// One recorded surface call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOp {
    Pixel(Rgb888),
    Rect(Rgb888),
    Text(String, Rgb888),
    Image,
    Blank,
    Commit,
}

impl MockOp {
    pub fn is_commit(&self) -> bool {
        matches!(self, MockOp::Commit)
    }
}

/// Mock display driver for testing
///
/// Simulates a display without requiring hardware. Every primitive, blank
/// and commit is appended to a shared log so tests can assert on exactly
/// what reached the surface and in which order.
#[derive(Debug, Clone)]
pub struct MockDriver {
    /// Framebuffer for drawing operations
    framebuffer: FrameBuffer,

    /// Display capabilities
    capabilities: DisplayCapabilities,

    /// Shared state for testing
    state: Arc<Mutex<MockDriverState>>,
}

/// Internal state for the mock driver (shared for inspection in tests)
#[derive(Debug, Default)]
pub struct MockDriverState {
    /// Every call, in order
    pub ops: Vec<MockOp>,

    /// Number of times init() was called
    pub init_count: usize,

    /// Number of successful commits
    pub commit_count: usize,

    /// Number of commits that delivered a blank request
    pub blank_commits: usize,

    /// Copy of the framebuffer as of the last successful frame commit
    pub last_frame: Option<FrameBuffer>,

    /// Simulate failures (for error testing)
    pub simulate_commit_failure: bool,

    /// Hold each commit this long, to widen race windows in tests
    pub commit_delay: Option<Duration>,

    blank_pending: bool,
}

impl MockDriverState {
    /// Number of recorded calls that were not commits
    pub fn draw_count(&self) -> usize {
        self.ops.iter().filter(|op| !op.is_commit()).count()
    }

    /// The recorded calls split at each commit, commit excluded.
    /// Calls after the final commit are not returned.
    pub fn committed_sequences(&self) -> Vec<Vec<MockOp>> {
        let mut out = Vec::new();
        let mut current = Vec::new();
        for op in &self.ops {
            if op.is_commit() {
                out.push(std::mem::take(&mut current));
            } else {
                current.push(op.clone());
            }
        }
        out
    }
}

impl MockDriver {
    /// Create a mock driver with specific dimensions
    pub fn new_with_size(width: u32, height: u32) -> Self {
        Self {
            framebuffer: FrameBuffer::new(width, height),
            capabilities: DisplayCapabilities {
                width,
                height,
            },
            state: Arc::new(Mutex::new(MockDriverState::default())),
        }
    }

    /// Get reference to state for inspection in tests
    pub fn state(&self) -> Arc<Mutex<MockDriverState>> {
        Arc::clone(&self.state)
    }

    /// Get pixel at position as currently buffered
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<Rgb888> {
        self.framebuffer.pixel_at(x, y)
    }

    fn lock_state(&self) -> MutexGuard<'_, MockDriverState> {
        // a panicking test thread must not hide the log from the others
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&mut self, op: MockOp) {
        let mut state = self.lock_state();
        state.blank_pending = matches!(op, MockOp::Blank);
        state.ops.push(op);
    }
}

#[async_trait]
impl DeviceSurface for MockDriver {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn frame_mut(&mut self) -> &mut FrameBuffer {
        &mut self.framebuffer
    }

    async fn init(&mut self) -> Result<(), DisplayError> {
        self.lock_state().init_count += 1;
        Ok(())
    }

    fn pixel(&mut self, at: Point, color: Rgb888) -> Result<(), DisplayError> {
        self.record(MockOp::Pixel(color));
        self.framebuffer.set_pixel(at, color);
        Ok(())
    }

    fn filled_rect(&mut self, top_left: Point, bottom_right: Point, color: Rgb888) -> Result<(), DisplayError> {
        self.record(MockOp::Rect(color));
        self.framebuffer.fill_rect(top_left, bottom_right, color);
        Ok(())
    }

    fn text(&mut self, text: &str, at: Point, color: Rgb888) -> Result<(), DisplayError> {
        self.record(MockOp::Text(text.to_string(), color));
        self.framebuffer.draw_text(text, at, color);
        Ok(())
    }

    fn image(&mut self, bitmap: &Bitmap) -> Result<(), DisplayError> {
        self.record(MockOp::Image);
        self.framebuffer.blit(bitmap);
        Ok(())
    }

    fn blank(&mut self) -> Result<(), DisplayError> {
        self.record(MockOp::Blank);
        self.framebuffer.clear_color(Rgb888::BLACK);
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DisplayError> {
        let delay = self.lock_state().commit_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let frame = self.framebuffer.clone();
        let mut state = self.lock_state();
        state.ops.push(MockOp::Commit);

        if state.simulate_commit_failure {
            return Err(DisplayError::Other("Simulated commit failure".to_string()));
        }

        state.commit_count += 1;
        if state.blank_pending {
            state.blank_commits += 1;
        } else {
            state.last_frame = Some(frame);
        }
        state.blank_pending = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_sequence() {
        let mut driver = MockDriver::new_with_size(64, 64);
        let state = driver.state();

        driver.filled_rect(Point::new(0, 0), Point::new(3, 3), Rgb888::RED).unwrap();
        driver.pixel(Point::new(5, 5), Rgb888::WHITE).unwrap();
        driver.commit().await.unwrap();

        let state = state.lock().unwrap();
        assert_eq!(state.ops, vec![MockOp::Rect(Rgb888::RED), MockOp::Pixel(Rgb888::WHITE), MockOp::Commit]);
        assert_eq!(state.commit_count, 1);
        assert_eq!(state.draw_count(), 2);
        let frame = state.last_frame.as_ref().unwrap();
        assert_eq!(frame.pixel_at(5, 5), Some(Rgb888::WHITE));
    }

    #[tokio::test]
    async fn test_mock_blank_commit() {
        let mut driver = MockDriver::new_with_size(64, 64);
        driver.pixel(Point::new(1, 1), Rgb888::WHITE).unwrap();
        driver.blank().unwrap();
        driver.commit().await.unwrap();

        assert_eq!(driver.get_pixel(1, 1), Some(Rgb888::BLACK));
        let state = driver.state();
        let state = state.lock().unwrap();
        assert_eq!(state.blank_commits, 1);
        assert!(state.last_frame.is_none());
    }

    #[tokio::test]
    async fn test_mock_simulated_failure() {
        let mut driver = MockDriver::new_with_size(64, 64);
        driver.state().lock().unwrap().simulate_commit_failure = true;
        assert!(driver.commit().await.is_err());

        driver.state().lock().unwrap().simulate_commit_failure = false;
        assert!(driver.commit().await.is_ok());
        assert_eq!(driver.state().lock().unwrap().commit_count, 1);
    }

    #[test]
    fn test_committed_sequences_split() {
        let mut state = MockDriverState::default();
        state.ops = vec![MockOp::Image, MockOp::Commit, MockOp::Blank, MockOp::Commit, MockOp::Image];
        assert_eq!(state.committed_sequences(), vec![vec![MockOp::Image], vec![MockOp::Blank]]);
    }
}

/*
 *  tests/reconciler_integration.rs
 *
 *  Reconciler and clock overlay against the recording mock panel
 *
 *  SpotPix - now playing, pixel by pixel
 *  (c) 2020-26 Stuart Hunter
 */

use async_trait::async_trait;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use image::{Rgb, RgbImage};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use spotpix::display::components::clock::{CLOCK_BACKGROUND, CLOCK_FOREGROUND};
use spotpix::display::drivers::mock::{MockDriver, MockDriverState, MockOp};
use spotpix::display::{Bitmap, ClockFace, DeviceLock, TimeSource};
use spotpix::{
    ArtworkError, ArtworkSource, ClockOverlay, ContentKind, DisplayMode, OverlayFlag, PlaybackError,
    PlaybackSnapshot, PollIntervals, SnapshotSource, StateReconciler,
};

/// Hands out a fixed script of snapshots, then repeats the last one
struct ScriptedSource {
    script: VecDeque<Result<PlaybackSnapshot, PlaybackError>>,
    last: PlaybackSnapshot,
}

impl ScriptedSource {
    fn new(script: Vec<Result<PlaybackSnapshot, PlaybackError>>) -> Self {
        Self { script: script.into(), last: PlaybackSnapshot::inactive() }
    }

    fn cycling(snaps: Vec<PlaybackSnapshot>, rounds: usize) -> Self {
        let mut script = Vec::new();
        for _ in 0..rounds {
            script.extend(snaps.iter().cloned().map(Ok));
        }
        Self::new(script)
    }
}

#[async_trait]
impl SnapshotSource for ScriptedSource {
    async fn snapshot(&mut self) -> Result<PlaybackSnapshot, PlaybackError> {
        match self.script.pop_front() {
            Some(Ok(s)) => {
                self.last = s.clone();
                Ok(s)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self.last.clone()),
        }
    }
}

/// Serves a solid colour per URL and remembers what was asked for
#[derive(Clone, Default)]
struct FakeArtwork {
    requests: Arc<Mutex<Vec<String>>>,
    failing: Arc<AtomicBool>,
}

impl FakeArtwork {
    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtworkSource for FakeArtwork {
    async fn fetch(&self, url: &str) -> Result<Bitmap, ArtworkError> {
        self.requests.lock().unwrap().push(url.to_string());
        if self.failing.load(Ordering::SeqCst) {
            return Err(ArtworkError::Exhausted { attempts: 3, last: "HTTP 503".into() });
        }
        let shade = (url.len() * 16 % 256) as u8;
        Ok(RgbImage::from_pixel(640, 640, Rgb([shade, 0, 255 - shade])))
    }
}

struct Rig {
    reconciler: StateReconciler<ScriptedSource, FakeArtwork>,
    artwork: FakeArtwork,
    flag: OverlayFlag,
    state: Arc<Mutex<MockDriverState>>,
    device: DeviceLock,
}

fn rig(source: ScriptedSource) -> Rig {
    let mock = MockDriver::new_with_size(64, 64);
    let state = mock.state();
    let device = DeviceLock::new(Box::new(mock));
    let artwork = FakeArtwork::default();
    let flag = OverlayFlag::default();
    let placeholder = RgbImage::from_pixel(64, 64, Rgb([140, 60, 200]));
    let reconciler = StateReconciler::new(
        source,
        artwork.clone(),
        device.clone(),
        flag.clone(),
        placeholder,
        PollIntervals::default(),
    );
    Rig { reconciler, artwork, flag, state, device }
}

fn take_ops(state: &Arc<Mutex<MockDriverState>>) -> Vec<MockOp> {
    std::mem::take(&mut state.lock().unwrap().ops)
}

fn ad_break() -> PlaybackSnapshot {
    PlaybackSnapshot { content_kind: ContentKind::None, ..PlaybackSnapshot::episode() }
}

#[tokio::test]
async fn test_mode_sequence_draws_only_on_change() {
    let mut r = rig(ScriptedSource::cycling(
        vec![
            PlaybackSnapshot::inactive(),
            PlaybackSnapshot::episode(),
            PlaybackSnapshot::track("A", Some("https://i.scdn.co/image/a")),
            PlaybackSnapshot::track("A", Some("https://i.scdn.co/image/a")),
            PlaybackSnapshot::track("B", Some("https://i.scdn.co/image/b")),
            PlaybackSnapshot::inactive(),
        ],
        1,
    ));
    let intervals = PollIntervals::default();

    let out = r.reconciler.cycle().await;
    assert_eq!(out.mode, DisplayMode::Cleared);
    assert!(out.redrawn);
    assert_eq!(out.next_delay, intervals.idle);
    assert!(!r.flag.is_enabled());
    assert_eq!(take_ops(&r.state), vec![MockOp::Blank, MockOp::Commit]);

    let out = r.reconciler.cycle().await;
    assert_eq!(out.mode, DisplayMode::Podcast);
    assert_eq!(out.next_delay, intervals.active);
    assert!(r.flag.is_enabled());
    assert_eq!(take_ops(&r.state), vec![MockOp::Image, MockOp::Commit]);

    let out = r.reconciler.cycle().await;
    assert_eq!(out.mode, DisplayMode::Artwork("A".into()));
    assert_eq!(take_ops(&r.state), vec![MockOp::Image, MockOp::Commit]);

    // same track again: no fetch, no device access at all
    let before = r.device.acquisitions();
    let out = r.reconciler.cycle().await;
    assert!(!out.redrawn);
    assert!(take_ops(&r.state).is_empty());
    assert_eq!(r.device.acquisitions(), before);

    let out = r.reconciler.cycle().await;
    assert_eq!(out.mode, DisplayMode::Artwork("B".into()));
    assert_eq!(take_ops(&r.state), vec![MockOp::Image, MockOp::Commit]);

    let out = r.reconciler.cycle().await;
    assert_eq!(out.mode, DisplayMode::Cleared);
    assert!(!r.flag.is_enabled());
    assert_eq!(take_ops(&r.state), vec![MockOp::Blank, MockOp::Commit]);

    assert_eq!(
        r.artwork.requests(),
        vec!["https://i.scdn.co/image/a".to_string(), "https://i.scdn.co/image/b".to_string()]
    );
}

#[tokio::test]
async fn test_repeated_idle_and_podcast_leave_device_alone() {
    let mut r = rig(ScriptedSource::new(vec![
        Ok(PlaybackSnapshot::inactive()),
        Ok(PlaybackSnapshot::inactive()),
        Ok(PlaybackSnapshot::episode()),
        Ok(PlaybackSnapshot::episode()),
    ]));
    let intervals = PollIntervals::default();

    assert!(r.reconciler.cycle().await.redrawn);
    let before = r.device.acquisitions();
    let out = r.reconciler.cycle().await;
    assert!(!out.redrawn);
    assert_eq!(out.next_delay, intervals.idle);
    assert_eq!(r.device.acquisitions(), before);

    assert!(r.reconciler.cycle().await.redrawn);
    take_ops(&r.state);
    let before = r.device.acquisitions();
    let out = r.reconciler.cycle().await;
    assert_eq!(out.mode, DisplayMode::Podcast);
    assert!(!out.redrawn);
    assert_eq!(out.next_delay, intervals.active);
    assert_eq!(r.device.acquisitions(), before);
    assert!(take_ops(&r.state).is_empty());
}

#[tokio::test]
async fn test_artwork_scaled_to_panel() {
    let mut r = rig(ScriptedSource::new(vec![Ok(PlaybackSnapshot::track("A", Some("u")))]));
    r.reconciler.cycle().await;

    let st = r.state.lock().unwrap();
    let frame = st.last_frame.as_ref().expect("artwork frame committed");
    assert_eq!((frame.width(), frame.height()), (64, 64));
    let shade = ("u".len() * 16 % 256) as u8;
    assert_eq!(frame.pixel_at(10, 10), Some(Rgb888::new(shade, 0, 255 - shade)));
}

#[tokio::test]
async fn test_fetch_failure_clears_and_retries() {
    let mut r = rig(ScriptedSource::new(vec![Ok(PlaybackSnapshot::track("A", Some("u")))]));
    r.artwork.failing.store(true, Ordering::SeqCst);

    let out = r.reconciler.cycle().await;
    assert_eq!(out.mode, DisplayMode::Artwork("A".into()));
    // overlay follows the derived mode, not the fetch outcome
    assert!(r.flag.is_enabled());
    assert_eq!(r.reconciler.rendered(), Some(&DisplayMode::Cleared));
    assert_eq!(take_ops(&r.state), vec![MockOp::Blank, MockOp::Commit]);

    r.artwork.failing.store(false, Ordering::SeqCst);
    let out = r.reconciler.cycle().await;
    assert!(out.redrawn);
    assert_eq!(r.reconciler.rendered(), Some(&DisplayMode::Artwork("A".into())));
    assert_eq!(take_ops(&r.state), vec![MockOp::Image, MockOp::Commit]);
    assert_eq!(r.artwork.requests().len(), 2);
}

#[tokio::test]
async fn test_missing_artwork_url_clears() {
    let mut r = rig(ScriptedSource::new(vec![Ok(PlaybackSnapshot::track("A", None))]));

    r.reconciler.cycle().await;
    assert_eq!(r.reconciler.rendered(), Some(&DisplayMode::Cleared));
    assert!(r.artwork.requests().is_empty());
    assert_eq!(take_ops(&r.state), vec![MockOp::Blank, MockOp::Commit]);
}

#[tokio::test]
async fn test_snapshot_errors_read_as_idle() {
    let mut r = rig(ScriptedSource::new(vec![
        Ok(PlaybackSnapshot::episode()),
        Err(PlaybackError::Transient("HTTP 502".into())),
        Ok(PlaybackSnapshot::episode()),
        Err(PlaybackError::Auth("invalid_grant".into())),
    ]));

    assert_eq!(r.reconciler.cycle().await.mode, DisplayMode::Podcast);
    assert_eq!(r.reconciler.cycle().await.mode, DisplayMode::Cleared);
    assert!(!r.flag.is_enabled());
    assert_eq!(r.reconciler.cycle().await.mode, DisplayMode::Podcast);
    assert_eq!(r.reconciler.cycle().await.mode, DisplayMode::Cleared);
}

#[tokio::test]
async fn test_clock_only_fills_black() {
    let mut r = rig(ScriptedSource::new(vec![Ok(ad_break())]));

    let out = r.reconciler.cycle().await;
    assert_eq!(out.mode, DisplayMode::ClockOnly);
    assert!(r.flag.is_enabled());
    assert_eq!(take_ops(&r.state), vec![MockOp::Rect(Rgb888::BLACK), MockOp::Commit]);
}

#[tokio::test]
async fn test_commit_failure_retried_next_cycle() {
    let mut r = rig(ScriptedSource::new(vec![Ok(PlaybackSnapshot::episode())]));
    r.state.lock().unwrap().simulate_commit_failure = true;

    let out = r.reconciler.cycle().await;
    assert!(out.redrawn);
    assert!(r.reconciler.rendered().is_none());

    r.state.lock().unwrap().simulate_commit_failure = false;
    let out = r.reconciler.cycle().await;
    assert!(out.redrawn);
    assert_eq!(r.reconciler.rendered(), Some(&DisplayMode::Podcast));
    assert_eq!(r.state.lock().unwrap().commit_count, 1);
}

fn is_clock_op(op: &MockOp) -> bool {
    matches!(op, MockOp::Rect(c) if *c == CLOCK_BACKGROUND)
        || matches!(op, MockOp::Pixel(c) | MockOp::Text(_, c) if *c == CLOCK_FOREGROUND)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_overlay_and_reconciler_never_interleave() {
    let mut r = rig(ScriptedSource::cycling(
        vec![
            PlaybackSnapshot::episode(),
            PlaybackSnapshot::track("A", Some("a")),
            ad_break(),
            PlaybackSnapshot::track("B", Some("bb")),
        ],
        10,
    ));
    r.state.lock().unwrap().commit_delay = Some(Duration::from_millis(1));

    let face = ClockFace::new(64, 64, TimeSource::SystemLocal);
    let overlay = ClockOverlay::new(r.device.clone(), r.flag.clone(), face, Duration::from_millis(1));
    let clock = tokio::spawn(async move { overlay.run().await });

    for _ in 0..40 {
        r.reconciler.cycle().await;
        tokio::task::yield_now().await;
    }
    clock.abort();
    let _ = clock.await;

    let st = r.state.lock().unwrap();
    let sequences = st.committed_sequences();
    let clock_frames = sequences.iter().filter(|s| s.iter().any(is_clock_op)).count();
    assert!(clock_frames > 0, "overlay never drew");

    for seq in &sequences {
        if seq.iter().any(is_clock_op) {
            assert_eq!(seq.len(), 6, "clock frame mixed with other drawing: {:?}", seq);
            assert!(seq.iter().all(is_clock_op));
        }
    }
}

/*
 *  main.rs
 *
 *  SpotPix - now playing, pixel by pixel
 *	(c) 2020-26 Stuart Hunter
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */

use anyhow::Context;
use env_logger::Env;
use log::{error, info, warn};
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};

use spotpix::artwork::ArtworkFetcher;
use spotpix::config;
use spotpix::display::components::placeholder::load_podcast_placeholder;
use spotpix::display::drivers::pixoo::PixooDriver;
use spotpix::display::{ClockFace, DeviceLock, DeviceSurface, TimeSource};
use spotpix::overlay::{ClockOverlay, OverlayFlag, DEFAULT_CLOCK_INTERVAL};
use spotpix::reconciler::{PollIntervals, StateReconciler};
use spotpix::snapshot::PlaybackSnapshotSource;
use spotpix::spotify::SpotifyClient;

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

const DEFAULT_PODCAST_IMAGE: &str = "Podcast.png";

/// Waits for SIGINT, SIGTERM or SIGHUP and logs which one arrived.
async fn signal_handler() -> Result<(), std::io::Error> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

/// Resolves once `signals` reports a shutdown. If the handlers could not be
/// installed this never resolves, so the service keeps running.
async fn shutdown_requested<F>(signals: F)
where
    F: std::future::Future<Output = Result<(), std::io::Error>>,
{
    if let Err(e) = signals.await {
        error!("Signal handling unavailable, running until killed: {}", e);
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (cfg, cli) = config::load().context("loading configuration")?;

    if cli.dump_config {
        print!("{}", config::dump(&cfg)?);
        return Ok(());
    }

    let level = if cli.debug { "debug" } else { cfg.log_level.as_deref().unwrap_or("info") };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();

    info!("{} - now playing, pixel by pixel", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    // device
    let pixoo_cfg = cfg.pixoo.clone().unwrap_or_default();
    let mut pixoo = PixooDriver::new(&pixoo_cfg).context("configuring Pixoo")?;
    pixoo.init().await.context("initializing Pixoo")?;
    let (width, height) = pixoo.dimensions();
    info!("Pixoo {}x{} ready", width, height);
    let device = DeviceLock::new(Box::new(pixoo));

    // playback + artwork
    let spotify_cfg = cfg.spotify.clone().unwrap_or_default();
    let spotify = SpotifyClient::new(&spotify_cfg).context("building Spotify client")?;
    let source = PlaybackSnapshotSource::new(spotify, width);
    let artwork = ArtworkFetcher::from_config(cfg.artwork.as_ref()).context("building artwork client")?;

    let placeholder_path = cfg
        .podcast_image
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PODCAST_IMAGE));
    let placeholder = load_podcast_placeholder(&placeholder_path, width, height);

    // clock
    let clock_cfg = cfg.clock.clone().unwrap_or_default();
    let clock_interval = clock_cfg
        .interval_secs
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_CLOCK_INTERVAL);
    let time_source = TimeSource::from_offset_minutes(clock_cfg.utc_offset_minutes);
    let face = ClockFace::new(width, height, time_source);

    let flag = OverlayFlag::default();
    let overlay = ClockOverlay::new(device.clone(), flag.clone(), face, clock_interval);
    let mut reconciler = StateReconciler::new(
        source,
        artwork,
        device.clone(),
        flag.clone(),
        placeholder,
        PollIntervals::from_config(cfg.poll.as_ref()),
    );

    tokio::select! {
        _ = shutdown_requested(signal_handler()) => {}
        _ = overlay.run() => {}
        _ = reconciler.run() => {}
    }

    // both loops are dropped at this point, the lock is free
    flag.set(false);
    let mut surface = device.acquire("shutdown").await;
    let cleared = match surface.blank() {
        Ok(()) => surface.commit().await,
        Err(e) => Err(e),
    };
    if let Err(e) = cleared {
        warn!("Could not blank display on exit: {}", e);
    }

    info!("Shutdown complete");
    Ok(())
}

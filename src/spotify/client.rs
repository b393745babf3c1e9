/*
 *  spotify/client.rs
 *
 *  SpotPix - now playing, pixel by pixel
 *  (c) 2020-26 Stuart Hunter
 *
 *  Web API player client
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
use log::trace;
use reqwest::{header, Client, StatusCode};
use std::time::Duration;

use crate::config::SpotifyConfig;
use crate::snapshot::PlaybackService;
use crate::spotify::auth::{SpotifyAuth, DEFAULT_ACCOUNTS_BASE};
use crate::spotify::error::ServiceError;
use crate::spotify::models::CurrentPlayback;

pub const DEFAULT_API_BASE: &str = "https://api.spotify.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Reads the user's player state
#[derive(Debug)]
pub struct SpotifyClient {
    http: Client,
    player_url: String,
    auth: SpotifyAuth,
}

impl SpotifyClient {
    pub fn new(cfg: &SpotifyConfig) -> Result<Self, ServiceError> {
        const VERSION: &str = concat!("SpotPix ", env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));

        let mut headers = header::HeaderMap::new();
        headers.insert("User-Agent", header::HeaderValue::from_static(VERSION));
        headers.insert("Accept", header::HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(3))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let api_base = cfg.api_base.as_deref().unwrap_or(DEFAULT_API_BASE);
        let accounts_base = cfg.accounts_base.as_deref().unwrap_or(DEFAULT_ACCOUNTS_BASE);
        let auth = SpotifyAuth::new(
            http.clone(),
            accounts_base,
            cfg.client_id.clone().unwrap_or_default(),
            cfg.client_secret.clone().unwrap_or_default(),
            cfg.refresh_token.clone().unwrap_or_default(),
        );

        Ok(Self {
            http,
            player_url: format!(
                "{}/v1/me/player?additional_types=episode",
                api_base.trim_end_matches('/')
            ),
            auth,
        })
    }
}

#[async_trait]
impl PlaybackService for SpotifyClient {
    async fn current_playback(&mut self) -> Result<Option<CurrentPlayback>, ServiceError> {
        // no token yet counts as expired so the first poll goes through the refresh path
        let Some(token) = self.auth.access_token() else {
            return Err(ServiceError::AuthExpired);
        };

        let res = self.http.get(&self.player_url).bearer_auth(token).send().await?;
        let status = res.status();
        trace!("GET /v1/me/player -> {}", status);

        match status {
            StatusCode::NO_CONTENT => Ok(None),
            StatusCode::UNAUTHORIZED => Err(ServiceError::AuthExpired),
            s if s.is_success() => {
                let body = res.text().await?;
                if body.trim().is_empty() {
                    return Ok(None);
                }
                serde_json::from_str::<CurrentPlayback>(&body)
                    .map(Some)
                    .map_err(|e| ServiceError::Payload(e.to_string()))
            }
            s => {
                let message = res.text().await.unwrap_or_default();
                Err(ServiceError::Status { status: s.as_u16(), message })
            }
        }
    }

    async fn reauthenticate(&mut self) -> Result<(), ServiceError> {
        self.auth.refresh().await
    }
}

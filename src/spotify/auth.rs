/*
 *  spotify/auth.rs
 *
 *  SpotPix - now playing, pixel by pixel
 *  (c) 2020-26 Stuart Hunter
 *
 *  Refresh-token grant against the accounts service
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

use log::{debug, info, warn};
use reqwest::{Client, StatusCode};

use crate::spotify::error::ServiceError;
use crate::spotify::models::{TokenErrorResponse, TokenResponse};

pub const DEFAULT_ACCOUNTS_BASE: &str = "https://accounts.spotify.com";

/// Long-lived credentials plus the current short-lived access token
#[derive(Debug)]
pub struct SpotifyAuth {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    access_token: Option<String>,
}

impl SpotifyAuth {
    pub fn new(
        client: Client,
        accounts_base: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            token_url: format!("{}/api/token", accounts_base.trim_end_matches('/')),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
            access_token: None,
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Exchange the refresh token for a fresh access token.
    ///
    /// A 400/401 from the accounts service means the credentials themselves
    /// are bad and maps to [`ServiceError::AuthRejected`]; anything else is
    /// reported as a status or transport failure.
    pub async fn refresh(&mut self) -> Result<(), ServiceError> {
        debug!("Refreshing Spotify access token");

        let res = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", self.refresh_token.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            let body = res.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<TokenErrorResponse>(&body)
                .map(|e| match e.error_description {
                    Some(d) => format!("{} ({})", e.error, d),
                    None => e.error,
                })
                .unwrap_or_else(|_| format!("HTTP {}", status.as_u16()));
            self.access_token = None;
            warn!("Spotify token refresh rejected: {}", reason);
            return Err(ServiceError::AuthRejected(reason));
        }
        if !status.is_success() {
            let message = res.text().await.unwrap_or_default();
            return Err(ServiceError::Status { status: status.as_u16(), message });
        }

        let body = res.text().await?;
        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| ServiceError::Payload(format!("token reply: {}", e)))?;

        if let Some(rotated) = token.refresh_token {
            info!("Spotify refresh token rotated");
            self.refresh_token = rotated;
        }
        self.access_token = Some(token.access_token);
        info!("Spotify access token refreshed, valid for {}s", token.expires_in);
        Ok(())
    }
}

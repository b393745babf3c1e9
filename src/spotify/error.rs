/*
 *  spotify/error.rs
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

use thiserror::Error;

/// Failures talking to the Web API or the accounts service
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The access token is missing or no longer accepted (HTTP 401)
    #[error("access token expired")]
    AuthExpired,

    /// The accounts service refused the client credentials or refresh token
    #[error("credentials rejected: {0}")]
    AuthRejected(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected payload: {0}")]
    Payload(String),
}

impl ServiceError {
    /// True for the two variants that mean "the credentials are the problem"
    pub fn is_auth(&self) -> bool {
        matches!(self, ServiceError::AuthExpired | ServiceError::AuthRejected(_))
    }
}

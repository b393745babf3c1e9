/*
 *  display/error.rs
 *
 *  SpotPix - now playing, pixel by pixel
 *  (c) 2020-26 Stuart Hunter
 *
 *  Unified error types for the display subsystem
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

use std::fmt;
use std::error::Error;

/// Unified error type for all display operations
#[derive(Debug)]
pub enum DisplayError {
    /// Device initialization failed
    InitializationFailed(String),

    /// HTTP transport to the device failed (connect, timeout, non-2xx)
    Transport(String),

    /// The device answered but reported a non-zero error code
    DeviceRejected { command: String, code: i64 },

    /// The device reply could not be parsed
    MalformedReply(String),

    /// Invalid configuration
    InvalidConfiguration(String),

    /// Generic error with message
    Other(String),
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::InitializationFailed(msg) =>
                write!(f, "Display initialization failed: {}", msg),
            DisplayError::Transport(msg) =>
                write!(f, "Display transport error: {}", msg),
            DisplayError::DeviceRejected { command, code } =>
                write!(f, "Device rejected '{}' with error_code {}", command, code),
            DisplayError::MalformedReply(msg) =>
                write!(f, "Malformed device reply: {}", msg),
            DisplayError::InvalidConfiguration(msg) =>
                write!(f, "Invalid configuration: {}", msg),
            DisplayError::Other(msg) =>
                write!(f, "{}", msg),
        }
    }
}

impl Error for DisplayError {}

impl From<reqwest::Error> for DisplayError {
    fn from(err: reqwest::Error) -> Self {
        DisplayError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for DisplayError {
    fn from(err: serde_json::Error) -> Self {
        DisplayError::MalformedReply(err.to_string())
    }
}

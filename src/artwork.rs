/*
 *  artwork.rs
 *
 *  SpotPix - now playing, pixel by pixel
 *  (c) 2020-26 Stuart Hunter
 *
 *  Cover art download with bounded retry
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
use log::{debug, info, warn};
use reqwest::{header, Client, StatusCode};
use std::time::Duration;

use crate::config::ArtworkConfig;
use crate::display::Bitmap;
use crate::error::ArtworkError;

/// How hard to try before giving up on one image
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// total attempts, first one included
    pub max_attempts: u32,
    /// wait before the second attempt; doubles after each failure
    pub base_delay: Duration,
    pub retry_statuses: Vec<u16>,
    /// ceiling applied to a server supplied Retry-After
    pub max_retry_after: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            retry_statuses: vec![429, 500, 502, 503, 504],
            max_retry_after: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(cfg: Option<&ArtworkConfig>) -> Self {
        let mut policy = Self::default();
        if let Some(c) = cfg {
            if let Some(n) = c.max_attempts { policy.max_attempts = n.max(1); }
            if let Some(s) = c.backoff_secs { policy.base_delay = Duration::from_secs(s); }
        }
        policy
    }

    /// Delay after failed attempt `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << (attempt.saturating_sub(1)).min(16))
    }

    fn should_retry(&self, status: StatusCode) -> bool {
        self.retry_statuses.contains(&status.as_u16())
    }
}

/// Something that can turn an artwork URL into pixels
#[async_trait]
pub trait ArtworkSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bitmap, ArtworkError>;
}

/// HTTP artwork download
#[derive(Debug, Clone)]
pub struct ArtworkFetcher {
    http: Client,
    policy: RetryPolicy,
}

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

impl ArtworkFetcher {
    pub fn new(policy: RetryPolicy, timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()?;
        Ok(Self { http, policy })
    }

    pub fn from_config(cfg: Option<&ArtworkConfig>) -> Result<Self, reqwest::Error> {
        let timeout = cfg.and_then(|c| c.timeout_secs).map(Duration::from_secs);
        Self::new(RetryPolicy::from_config(cfg), timeout)
    }
}

/// Outcome of a single request
enum Attempt {
    Done(Vec<u8>),
    Retry { reason: String, after: Option<Duration> },
}

impl ArtworkFetcher {
    async fn attempt(&self, url: &str) -> Result<Attempt, ArtworkError> {
        let res = match self.http.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                return Ok(Attempt::Retry { reason: e.to_string(), after: None });
            }
        };

        let status = res.status();
        if status.is_success() {
            return match res.bytes().await {
                Ok(b) => Ok(Attempt::Done(b.to_vec())),
                Err(e) => Ok(Attempt::Retry { reason: e.to_string(), after: None }),
            };
        }

        if self.policy.should_retry(status) {
            let after = res
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(|s| Duration::from_secs(s).min(self.policy.max_retry_after));
            return Ok(Attempt::Retry { reason: format!("HTTP {}", status.as_u16()), after });
        }

        Err(ArtworkError::Status(status.as_u16()))
    }
}

#[async_trait]
impl ArtworkSource for ArtworkFetcher {
    async fn fetch(&self, url: &str) -> Result<Bitmap, ArtworkError> {
        let attempts = self.policy.max_attempts.max(1);
        let mut last = String::new();

        for attempt in 1..=attempts {
            match self.attempt(url).await? {
                Attempt::Done(bytes) => {
                    debug!("artwork: {} bytes from {}", bytes.len(), url);
                    let img = image::load_from_memory(&bytes)?.to_rgb8();
                    info!("Artwork loaded ({}x{})", img.width(), img.height());
                    return Ok(img);
                }
                Attempt::Retry { reason, after } => {
                    warn!("Artwork attempt {}/{} failed: {}", attempt, attempts, reason);
                    last = reason;
                    if attempt < attempts {
                        let delay = after.unwrap_or_else(|| self.policy.backoff(attempt));
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(ArtworkError::Exhausted { attempts, last })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        let p = RetryPolicy::default();
        assert_eq!(p.backoff(1), Duration::from_secs(1));
        assert_eq!(p.backoff(2), Duration::from_secs(2));
        assert_eq!(p.backoff(3), Duration::from_secs(4));
    }

    #[test]
    fn test_retryable_statuses() {
        let p = RetryPolicy::default();
        assert!(p.should_retry(StatusCode::TOO_MANY_REQUESTS));
        assert!(p.should_retry(StatusCode::BAD_GATEWAY));
        assert!(!p.should_retry(StatusCode::NOT_FOUND));
        assert!(!p.should_retry(StatusCode::FORBIDDEN));
    }

    #[test]
    fn test_policy_from_config() {
        let cfg = ArtworkConfig { timeout_secs: Some(4), max_attempts: Some(0), backoff_secs: Some(2) };
        let p = RetryPolicy::from_config(Some(&cfg));
        assert_eq!(p.max_attempts, 1);
        assert_eq!(p.base_delay, Duration::from_secs(2));
    }
}

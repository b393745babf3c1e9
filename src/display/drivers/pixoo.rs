/*
 *  display/drivers/pixoo.rs
 *
 *  SpotPix - now playing, pixel by pixel
 *  (c) 2020-26 Stuart Hunter
 *
 *  Divoom Pixoo driver - JSON commands over the device's local HTTP API
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
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use log::{debug, info};
use reqwest::{Client, header};
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::PixooConfig;
use crate::display::error::DisplayError;
use crate::display::framebuffer::FrameBuffer;
use crate::display::traits::{DeviceSurface, DisplayCapabilities};

/// The device stops accepting animation frames once the picture id runs
/// past this, so the counter is reset on the device and restarted at 1.
pub const PIC_ID_LIMIT: u32 = 32;

/// Built-in channel indices (`Channel/SetIndex`)
pub const CHANNEL_FACES: u8 = 0;

/// A thin client for the Pixoo `/post` endpoint.
#[derive(Debug, Clone)]
pub struct PixooClient {
    url: String,
    client: Client,
}

impl PixooClient {
    /// Creates a new client inclusive of headers and timeout.
    pub fn new(address: &str, timeout: Duration) -> Result<Self, DisplayError> {
        const VERSION: &str = concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));

        let mut headers = header::HeaderMap::new();
        headers.insert("User-Agent", header::HeaderValue::from_static(VERSION));
        headers.insert("Content-Type", header::HeaderValue::from_static("application/json"));
        headers.insert("Accept", header::HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .http1_only()
            .connect_timeout(Duration::from_millis(1500))
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| DisplayError::InitializationFailed(e.to_string()))?;

        let base = if address.starts_with("http://") || address.starts_with("https://") {
            address.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", address.trim_end_matches('/'))
        };

        Ok(PixooClient { url: format!("{}/post", base), client })
    }

    /// Sends one command object and returns the device reply.
    ///
    /// Every reply carries an `error_code`; anything but 0 is a rejection.
    pub async fn send_command(&self, payload: Value) -> Result<Value, DisplayError> {
        let command = payload["Command"].as_str().unwrap_or("?").to_string();

        let response = self.client
            .post(&self.url)
            .body(payload.to_string())
            .send()
            .await?;
        response.error_for_status_ref()?;

        // the device answers with text/html content type, parse by hand
        let text = response.text().await?;
        let reply: Value = serde_json::from_str(&text)?;

        match reply.get("error_code").and_then(Value::as_i64) {
            Some(0) => Ok(reply),
            Some(code) => Err(DisplayError::DeviceRejected { command, code }),
            None => Err(DisplayError::MalformedReply(format!("'{}' reply without error_code", command))),
        }
    }
}

/// What the next commit will send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Frame,
    Blank,
}

/// Pixoo 16/32/64 surface.
#[derive(Debug)]
pub struct PixooDriver {
    client: PixooClient,
    framebuffer: FrameBuffer,
    capabilities: DisplayCapabilities,
    brightness: Option<u8>,
    pic_id: u32,
    pending: Pending,
}

impl PixooDriver {
    pub fn new(config: &PixooConfig) -> Result<Self, DisplayError> {
        let address = config.address.as_deref()
            .ok_or_else(|| DisplayError::InvalidConfiguration("pixoo address is required".into()))?;
        let size = config.size.unwrap_or(64);
        let timeout = Duration::from_secs(config.timeout_secs.unwrap_or(5));

        Ok(Self {
            client: PixooClient::new(address, timeout)?,
            framebuffer: FrameBuffer::new(size, size),
            capabilities: DisplayCapabilities {
                width: size,
                height: size,
            },
            brightness: config.brightness,
            pic_id: 0,
            pending: Pending::Frame,
        })
    }

    async fn reset_pic_id(&mut self) -> Result<(), DisplayError> {
        self.client.send_command(json!({ "Command": "Draw/ResetHttpGifId" })).await?;
        self.pic_id = 0;
        Ok(())
    }

    async fn push_frame(&mut self) -> Result<(), DisplayError> {
        self.pic_id += 1;
        if self.pic_id >= PIC_ID_LIMIT {
            debug!("Pixoo picture id reached {}, resetting", self.pic_id);
            self.reset_pic_id().await?;
            self.pic_id = 1;
        }

        let size = self.capabilities.width;
        let data = BASE64.encode(self.framebuffer.to_rgb_bytes());
        self.client.send_command(json!({
            "Command": "Draw/SendHttpGif",
            "PicNum": 1,
            "PicWidth": size,
            "PicOffset": 0,
            "PicID": self.pic_id,
            "PicSpeed": 1000,
            "PicData": data,
        })).await?;
        Ok(())
    }

    async fn show_idle_face(&mut self) -> Result<(), DisplayError> {
        self.client.send_command(json!({ "Command": "Channel/SetIndex", "SelectIndex": CHANNEL_FACES })).await?;
        self.client.send_command(json!({ "Command": "Channel/SetClockSelectId", "ClockId": 0 })).await?;
        Ok(())
    }
}

#[async_trait]
impl DeviceSurface for PixooDriver {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn frame_mut(&mut self) -> &mut FrameBuffer {
        self.pending = Pending::Frame;
        &mut self.framebuffer
    }

    async fn init(&mut self) -> Result<(), DisplayError> {
        let reply = self.client.send_command(json!({ "Command": "Draw/GetHttpGifId" })).await
            .map_err(|e| DisplayError::InitializationFailed(e.to_string()))?;
        let current = reply.get("PicId").and_then(Value::as_u64).unwrap_or(0) as u32;
        info!("Pixoo {}x{} reachable, picture id {}", self.capabilities.width, self.capabilities.height, current);
        if current >= PIC_ID_LIMIT {
            self.reset_pic_id().await?;
        } else {
            self.pic_id = current;
        }

        if let Some(level) = self.brightness {
            self.client.send_command(json!({ "Command": "Channel/SetBrightness", "Brightness": level.min(100) })).await?;
        }
        Ok(())
    }

    fn blank(&mut self) -> Result<(), DisplayError> {
        self.framebuffer.clear_color(Rgb888::BLACK);
        self.pending = Pending::Blank;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DisplayError> {
        match self.pending {
            Pending::Frame => self.push_frame().await,
            Pending::Blank => self.show_idle_face().await,
        }
    }
}

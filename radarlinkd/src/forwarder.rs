//! HTTP forwarder delivering radar readings to the collector.

use anyhow::{Context, Result};
use async_trait::async_trait;
use radarlink_core::{ForwarderConfig, RadarReading};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Sensor side reported in the `x` form field
pub const SIDE_LEFT: u8 = 1;
pub const SIDE_RIGHT: u8 = 0;

/// Destination for decoded readings
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn deliver(&self, reading: &RadarReading) -> Result<()>;
}

/// One form post to the collector: a single echo on one side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EchoForm {
    /// Sensor side (1 = left, 0 = right)
    pub x: u8,
    /// Motion indicator
    pub y: u8,
    /// Echo distance in centimeters
    pub echo_cm: f64,
}

impl EchoForm {
    /// Split a reading into the left and right posts, in that order
    pub fn from_reading(reading: &RadarReading) -> [EchoForm; 2] {
        [
            EchoForm {
                x: SIDE_LEFT,
                y: reading.motion,
                echo_cm: reading.left_distance,
            },
            EchoForm {
                x: SIDE_RIGHT,
                y: reading.motion,
                echo_cm: reading.right_distance,
            },
        ]
    }
}

/// Posts readings as `application/x-www-form-urlencoded` forms
#[derive(Debug, Clone)]
pub struct HttpForwarder {
    client: Client,
    target_url: String,
}

impl HttpForwarder {
    pub fn new(config: &ForwarderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("radarlinkd/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            target_url: config.target_url.clone(),
        })
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    /// Check that the collector accepts connections.
    ///
    /// Any HTTP response counts as reachable; only transport failures error.
    pub async fn check_reachable(&self) -> Result<()> {
        let response = self
            .client
            .get(&self.target_url)
            .send()
            .await
            .with_context(|| format!("Cannot connect to {}", self.target_url))?;

        debug!("Collector check: {}", response.status());
        Ok(())
    }

    async fn post(&self, form: &EchoForm) -> Result<()> {
        let response = self
            .client
            .post(&self.target_url)
            .form(form)
            .send()
            .await
            .with_context(|| format!("Failed to post to {}", self.target_url))?;

        let status = response.status();
        let body = body_text(response).await;

        if !status.is_success() {
            anyhow::bail!("HTTP {} from {}: {}", status, self.target_url, body);
        }

        info!("{} {}", status.as_u16(), body);
        Ok(())
    }
}

/// Response body for logging, normalized if it is JSON
async fn body_text(response: Response) -> String {
    let text = response.text().await.unwrap_or_default();
    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(value) => value.to_string(),
        Err(_) => text,
    }
}

#[async_trait]
impl RecordSink for HttpForwarder {
    async fn deliver(&self, reading: &RadarReading) -> Result<()> {
        for form in EchoForm::from_reading(reading) {
            self.post(&form).await?;
        }
        Ok(())
    }
}

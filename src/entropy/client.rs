use anyhow::{bail, Context, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::messages::{QrngRequest, QrngResponse};
use crate::config::EntropyConfig;

/// Remote source of uniformly distributed bytes
#[async_trait::async_trait]
pub trait RandomnessService: Send + Sync {
    /// Ask the service for `length` uint8 values
    async fn request(&self, length: usize) -> Result<QrngResponse>;

    /// Service name for logging
    fn name(&self) -> &str;
}

/// HTTP client for the ANU quantum random number JSON API
pub struct QrngClient {
    client: Client,
    endpoint: String,
}

impl QrngClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build QRNG HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &EntropyConfig) -> Result<Self> {
        Self::new(
            config.endpoint.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait::async_trait]
impl RandomnessService for QrngClient {
    async fn request(&self, length: usize) -> Result<QrngResponse> {
        let query = QrngRequest::uint8(length);

        debug!("Requesting {} bytes from {}", length, self.endpoint);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&query)
            .send()
            .await
            .context("QRNG request failed")?;

        let status = response.status();
        if !status.is_success() {
            bail!("QRNG endpoint returned HTTP {}", status);
        }

        response
            .json::<QrngResponse>()
            .await
            .context("QRNG response was not valid JSON")
    }

    fn name(&self) -> &str {
        "ANU QRNG"
    }
}

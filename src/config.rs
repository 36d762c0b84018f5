use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub audio: AudioConfig,
    pub entropy: EntropyConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "nabu-vault".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    /// Duration of the legacy fixed-length recording
    pub record_duration_secs: u64,
    /// Frames per chunk delivered by replay sources
    pub chunk_frames: usize,
    /// Capacity of the producer-to-consumer chunk channel
    pub channel_capacity: usize,
    /// How long `stop()` waits for the producer thread to exit
    pub stop_grace_ms: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            record_duration_secs: 10,
            chunk_frames: 1024,
            channel_capacity: 64,
            stop_grace_ms: 500,
        }
    }
}

impl AudioConfig {
    pub fn record_duration(&self) -> Duration {
        Duration::from_secs(self.record_duration_secs)
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EntropyConfig {
    /// Remote QRNG endpoint (ANU JSON API)
    pub endpoint: String,
    pub retries: u32,
    pub timeout_secs: u64,
}

impl Default for EntropyConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://qrng.anu.edu.au/API/jsonI.php".to_string(),
            retries: 3,
            timeout_secs: 10,
        }
    }
}

impl Config {
    /// Load from a config file (extension optional) overlaid by `NABU__*`
    /// environment variables, e.g. `NABU__ENTROPY__RETRIES=5`.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("NABU").separator("__"))
            .build()
            .with_context(|| format!("Failed to read config from {}", path))?;

        settings
            .try_deserialize()
            .context("Failed to deserialize config")
    }
}

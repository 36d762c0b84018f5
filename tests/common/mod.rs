// Shared fakes for integration tests
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use nabu_vault::audio::{BackendConfig, CaptureBackend, ReplayBackend};
use nabu_vault::vault::BackendBuilder;
use nabu_vault::{Config, EntropySource, QrngResponse, RandomnessService, VaultService};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Randomness service that always answers with the same data
pub struct FixedService {
    pub success: bool,
    pub data: Vec<i64>,
    pub calls: AtomicUsize,
}

impl FixedService {
    pub fn new(data: Vec<i64>) -> Arc<Self> {
        Arc::new(Self {
            success: true,
            data,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RandomnessService for FixedService {
    async fn request(&self, _length: usize) -> Result<QrngResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(QrngResponse {
            success: self.success,
            data: self.data.clone(),
        })
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Randomness service that is never reachable
#[derive(Default)]
pub struct FailingService {
    pub calls: AtomicUsize,
}

impl FailingService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RandomnessService for FailingService {
    async fn request(&self, _length: usize) -> Result<QrngResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(anyhow!("connection refused"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

pub fn test_backend_config(chunk_frames: usize) -> BackendConfig {
    BackendConfig {
        sample_rate: 44100,
        chunk_frames,
        channel_capacity: 8,
        stop_grace: Duration::from_millis(500),
    }
}

pub fn replay(samples: Vec<f32>, chunk_frames: usize) -> Box<dyn CaptureBackend> {
    Box::new(ReplayBackend::new(samples, 44100, test_backend_config(chunk_frames)))
}

/// Samples 0, 1/n, 2/n, ... so order is checkable after concatenation
pub fn ramp(n: usize) -> Vec<f32> {
    (0..n).map(|i| i as f32 / n as f32).collect()
}

pub fn sine(n: usize, sample_rate: u32, freq: f64) -> Vec<f64> {
    (0..n)
        .map(|i| 0.8 * (2.0 * std::f64::consts::PI * freq * i as f64 / sample_rate as f64).sin())
        .collect()
}

/// Vault whose recordings replay `samples` and whose keys come from `service`
pub fn vault_with(service: Arc<dyn RandomnessService>, samples: Vec<f32>) -> VaultService {
    let mut config = Config::default();
    config.audio.record_duration_secs = 1;
    config.audio.chunk_frames = 256;

    let backends: BackendBuilder = Box::new(move || Ok(replay(samples.clone(), 256)));

    VaultService::new(config, EntropySource::new(service), backends)
}

pub fn key_bytes() -> Vec<i64> {
    (0..32).map(|i| (i * 7 + 3) % 256).collect()
}

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use super::container;

/// A WAV file loaded for replay, already downmixed to mono
pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<f32>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let buffer = container::read(&bytes).context("Failed to decode WAV file")?;
        let channels = buffer.channels;
        let duration_seconds = buffer.duration_secs();

        let samples: Vec<f32> = buffer.to_mono().into_iter().map(|s| s as f32).collect();

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} frames",
            duration_seconds,
            buffer.sample_rate,
            channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: buffer.sample_rate,
            channels,
            samples,
        })
    }
}

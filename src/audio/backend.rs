use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

use super::buffer::AudioChunk;
use super::replay::ReplayBackend;
use crate::config::AudioConfig;

/// Configuration shared by all capture backends
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Requested sample rate (microphone uses the closest supported rate)
    pub sample_rate: u32,
    /// Frames per chunk for sources that choose their own block size
    pub chunk_frames: usize,
    /// Capacity of the chunk channel
    pub channel_capacity: usize,
    /// How long `stop()` waits for the producer thread
    pub stop_grace: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::from(&AudioConfig::default())
    }
}

impl From<&AudioConfig> for BackendConfig {
    fn from(audio: &AudioConfig) -> Self {
        Self {
            sample_rate: audio.sample_rate,
            chunk_frames: audio.chunk_frames.max(1),
            channel_capacity: audio.channel_capacity.max(1),
            stop_grace: audio.stop_grace(),
        }
    }
}

/// Audio capture backend
///
/// Implementations own exactly one producer thread while capturing. Chunks
/// arrive on the returned receiver in delivery order; the channel closes once
/// the producer has exited.
#[async_trait::async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Start the producer thread
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioChunk>>;

    /// Signal the producer and wait (bounded) for it to exit
    async fn stop(&mut self) -> Result<()>;

    /// Check if the producer is currently running
    fn is_capturing(&self) -> bool;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Where captured audio comes from
#[derive(Debug, Clone)]
pub enum CaptureSource {
    /// Default input device (requires the `microphone` feature)
    Microphone,
    /// Replay a 16-bit WAV file in real time
    File(PathBuf),
    /// Replay in-memory mono samples without pacing
    Samples { samples: Vec<f32>, sample_rate: u32 },
}

impl CaptureSource {
    /// Parse `microphone` or `file:<path>`
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "microphone" | "mic" => Ok(Self::Microphone),
            other => match other.strip_prefix("file:") {
                Some(path) if !path.is_empty() => Ok(Self::File(PathBuf::from(path))),
                _ => anyhow::bail!("unknown capture source '{}'", other),
            },
        }
    }
}

/// Capture backend factory
pub struct CaptureBackendFactory;

impl CaptureBackendFactory {
    pub fn create(source: CaptureSource, config: BackendConfig) -> Result<Box<dyn CaptureBackend>> {
        match source {
            CaptureSource::Microphone => {
                #[cfg(feature = "microphone")]
                {
                    use super::microphone::MicrophoneBackend;
                    Ok(Box::new(MicrophoneBackend::new(config)))
                }

                #[cfg(not(feature = "microphone"))]
                {
                    let _ = config;
                    anyhow::bail!("Microphone capture requires the `microphone` feature")
                }
            }

            CaptureSource::File(path) => Ok(Box::new(ReplayBackend::open(path, config)?)),

            CaptureSource::Samples {
                samples,
                sample_rate,
            } => Ok(Box::new(ReplayBackend::new(samples, sample_rate, config))),
        }
    }
}

// Replay capture backend: feeds pre-recorded samples through the same
// producer/channel path as a live device.

use anyhow::{bail, Result};
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::backend::{BackendConfig, CaptureBackend};
use super::buffer::AudioChunk;
use super::file::AudioFile;
use super::producer::ProducerThread;

pub struct ReplayBackend {
    config: BackendConfig,
    samples: Arc<Vec<f32>>,
    sample_rate: u32,
    /// Sleep between chunks to emulate a real-time device
    pace: Option<Duration>,
    producer: Option<ProducerThread>,
}

impl ReplayBackend {
    /// Replay in-memory mono samples as fast as the consumer accepts them
    pub fn new(samples: Vec<f32>, sample_rate: u32, config: BackendConfig) -> Self {
        Self {
            config,
            samples: Arc::new(samples),
            sample_rate,
            pace: None,
            producer: None,
        }
    }

    /// Replay a WAV file at real-time speed
    pub fn open(path: impl AsRef<Path>, config: BackendConfig) -> Result<Self> {
        let file = AudioFile::open(path)?;
        let chunk_secs = config.chunk_frames as f64 / file.sample_rate.max(1) as f64;

        Ok(Self::new(file.samples, file.sample_rate, config)
            .paced(Duration::from_secs_f64(chunk_secs)))
    }

    pub fn paced(mut self, interval: Duration) -> Self {
        self.pace = Some(interval);
        self
    }
}

#[async_trait::async_trait]
impl CaptureBackend for ReplayBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioChunk>> {
        if self.producer.is_some() {
            bail!("Already capturing");
        }

        let (tx, rx) = mpsc::channel(self.config.channel_capacity);

        let samples = Arc::clone(&self.samples);
        let sample_rate = self.sample_rate;
        let chunk_frames = self.config.chunk_frames;
        let pace = self.pace;

        info!(
            "Starting replay capture ({} samples, {}Hz, {} frames/chunk)",
            samples.len(),
            sample_rate,
            chunk_frames
        );

        let producer = ProducerThread::spawn("replay-producer", move |stop| {
            for (sequence, block) in samples.chunks(chunk_frames).enumerate() {
                if stop.load(Ordering::SeqCst) {
                    break;
                }

                let chunk = AudioChunk {
                    samples: block.to_vec(),
                    sample_rate,
                    channels: 1,
                    sequence: sequence as u64,
                };

                // Receiver gone means the session was torn down
                if tx.blocking_send(chunk).is_err() {
                    break;
                }

                if let Some(interval) = pace {
                    std::thread::sleep(interval);
                }
            }
            debug!("Replay producer finished");
        })?;

        self.producer = Some(producer);

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(mut producer) = self.producer.take() {
            producer.halt(self.config.stop_grace).await;
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.producer
            .as_ref()
            .map(|p| p.is_running())
            .unwrap_or(false)
    }

    fn name(&self) -> &str {
        "replay"
    }
}

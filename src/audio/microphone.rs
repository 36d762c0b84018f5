// Live microphone capture via cpal
//
// cpal streams are not Send, so the stream is built, played and dropped on
// the producer thread. The data callback downmixes to mono and hands chunks
// to the channel without blocking.

use anyhow::{anyhow, bail, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

use super::backend::{BackendConfig, CaptureBackend};
use super::buffer::AudioChunk;
use super::producer::ProducerThread;

const STOP_POLL_INTERVAL: Duration = Duration::from_millis(10);

pub struct MicrophoneBackend {
    config: BackendConfig,
    producer: Option<ProducerThread>,
    dropped: Arc<AtomicUsize>,
}

impl MicrophoneBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            config,
            producer: None,
            dropped: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait::async_trait]
impl CaptureBackend for MicrophoneBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioChunk>> {
        if self.producer.is_some() {
            bail!("Already capturing");
        }

        let (tx, rx) = mpsc::channel(self.config.channel_capacity);
        let (ready_tx, ready_rx) = oneshot::channel::<Result<()>>();
        let requested_rate = self.config.sample_rate;
        let dropped = Arc::clone(&self.dropped);
        dropped.store(0, Ordering::SeqCst);

        let producer = ProducerThread::spawn("microphone-producer", move |stop| {
            let stream = match open_input_stream(requested_rate, tx, dropped) {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(anyhow!("Failed to start input stream: {}", e)));
                return;
            }
            let _ = ready_tx.send(Ok(()));

            while !stop.load(Ordering::SeqCst) {
                std::thread::sleep(STOP_POLL_INTERVAL);
            }

            if let Err(e) = stream.pause() {
                warn!("Failed to pause input stream: {}", e);
            }
            // Dropping the stream drops the callback and with it the sender
            drop(stream);
        })?;

        ready_rx
            .await
            .context("Microphone producer exited before reporting readiness")??;

        self.producer = Some(producer);
        info!("Microphone capture started");

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(mut producer) = self.producer.take() {
            producer.halt(self.config.stop_grace).await;

            let dropped = self.dropped.load(Ordering::SeqCst);
            if dropped > 0 {
                warn!("{} microphone chunks dropped (channel full)", dropped);
            }
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
        "microphone"
    }
}

fn open_input_stream(
    requested_rate: u32,
    tx: mpsc::Sender<AudioChunk>,
    dropped: Arc<AtomicUsize>,
) -> Result<cpal::Stream> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .context("no default input device available")?;

    let supported = device
        .supported_input_configs()
        .context("failed to query input configs")?
        .find(|range| {
            range.min_sample_rate().0 <= requested_rate && requested_rate <= range.max_sample_rate().0
        });

    let (format, config): (SampleFormat, StreamConfig) = match supported {
        Some(range) => {
            let format = range.sample_format();
            (format, range.with_sample_rate(cpal::SampleRate(requested_rate)).into())
        }
        None => {
            let default = device.default_input_config()?;
            warn!(
                "Device does not support {}Hz, using {}Hz",
                requested_rate,
                default.sample_rate().0
            );
            (default.sample_format(), default.into())
        }
    };

    let sample_rate = config.sample_rate.0;
    let channels = usize::from(config.channels.max(1));

    info!(
        "Input device '{}': {:?} {}Hz {} channels",
        device.name().unwrap_or_else(|_| "unknown".to_string()),
        format,
        sample_rate,
        channels
    );

    let mut pump = ChunkPump {
        tx,
        dropped,
        sample_rate,
        channels,
        sequence: 0,
    };

    let err_fn = |err| error!("audio_stream_error: {}", err);

    let stream = match format {
        SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _| pump.push(data, |s| s),
            err_fn,
            None,
        )?,
        SampleFormat::F64 => device.build_input_stream(
            &config,
            move |data: &[f64], _| pump.push(data, |s| s as f32),
            err_fn,
            None,
        )?,
        SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _| pump.push(data, |s| s as f32 / 32_768.0),
            err_fn,
            None,
        )?,
        SampleFormat::U16 => device.build_input_stream(
            &config,
            move |data: &[u16], _| pump.push(data, |s| (s as f32 - 32_768.0) / 32_768.0),
            err_fn,
            None,
        )?,
        other => bail!("unsupported sample format: {:?}", other),
    };

    Ok(stream)
}

/// Callback-side state: converts one device buffer into one chunk
struct ChunkPump {
    tx: mpsc::Sender<AudioChunk>,
    dropped: Arc<AtomicUsize>,
    sample_rate: u32,
    channels: usize,
    sequence: u64,
}

impl ChunkPump {
    fn push<T: Copy>(&mut self, data: &[T], convert: impl Fn(T) -> f32) {
        let samples: Vec<f32> = data
            .chunks(self.channels)
            .map(|frame| frame.iter().map(|&s| convert(s)).sum::<f32>() / frame.len() as f32)
            .collect();

        let chunk = AudioChunk {
            samples,
            sample_rate: self.sample_rate,
            channels: 1,
            sequence: self.sequence,
        };
        self.sequence += 1;

        if self.tx.try_send(chunk).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

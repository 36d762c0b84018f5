use super::config::SessionConfig;
use super::stats::SessionStats;
use crate::audio::{AudioChunk, CaptureBackend, SampleBuffer};
use crate::error::{VaultError, VaultResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Capture session state machine.
///
/// ```text
/// idle --start()--> recording --stop()--> idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureState {
    Idle,
    Recording,
}

impl CaptureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
        }
    }
}

/// Consumer side of a running capture
struct Drain {
    task: JoinHandle<Vec<AudioChunk>>,
    halt: oneshot::Sender<()>,
}

/// A single capture: one backend, one producer thread, one ordered drain
pub struct CaptureSession {
    /// Session configuration
    config: SessionConfig,

    /// Backend owning the producer thread
    backend: Box<dyn CaptureBackend>,

    state: CaptureState,

    /// When the current recording started
    started_at: Option<DateTime<Utc>>,

    /// Running drain task, present only while recording
    drain: Option<Drain>,

    /// Chunks drained in the current recording
    chunks_received: Arc<AtomicUsize>,
}

impl CaptureSession {
    pub fn new(config: SessionConfig, backend: Box<dyn CaptureBackend>) -> Self {
        info!(
            "Creating capture session {} ({} backend)",
            config.session_id,
            backend.name()
        );

        Self {
            config,
            backend,
            state: CaptureState::Idle,
            started_at: None,
            drain: None,
            chunks_received: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn id(&self) -> &str {
        &self.config.session_id
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Start recording. Only valid while idle.
    pub async fn start(&mut self) -> VaultResult<()> {
        if self.state.is_recording() {
            warn!("Session {} is already recording", self.config.session_id);
            return Err(VaultError::SessionConflict(self.config.session_id.clone()));
        }

        info!("Starting capture session: {}", self.config.session_id);

        // A fresh channel per recording, so nothing from a previous run remains
        self.chunks_received.store(0, Ordering::SeqCst);

        let chunk_rx = self.backend.start().await.map_err(VaultError::Capture)?;

        let (halt_tx, halt_rx) = oneshot::channel();
        let task = tokio::spawn(drain_chunks(
            chunk_rx,
            halt_rx,
            Arc::clone(&self.chunks_received),
        ));

        self.drain = Some(Drain {
            task,
            halt: halt_tx,
        });
        self.state = CaptureState::Recording;
        self.started_at = Some(Utc::now());

        info!("Capture session {} recording", self.config.session_id);

        Ok(())
    }

    /// Stop recording and return everything captured, in capture order.
    ///
    /// The producer is signalled first; the drain completes once the producer
    /// has exited (channel closed) or the grace period has passed. The session
    /// is idle afterwards regardless of the outcome.
    pub async fn stop(&mut self) -> VaultResult<SampleBuffer> {
        if self.state.is_idle() {
            return Err(VaultError::InvalidTransition {
                action: "stop",
                state: self.state.label(),
            });
        }

        info!("Stopping capture session: {}", self.config.session_id);

        let backend_result = self.backend.stop().await;
        self.state = CaptureState::Idle;

        let chunks = match self.drain.take() {
            Some(drain) => self.finish_drain(drain).await?,
            None => Vec::new(),
        };

        if let Err(e) = backend_result {
            error!("Backend failed to stop cleanly: {:#}", e);
            return Err(VaultError::Capture(e));
        }

        info!(
            "Capture session {} stopped: {} chunks",
            self.config.session_id,
            chunks.len()
        );

        SampleBuffer::from_chunks(chunks)
    }

    async fn finish_drain(&self, drain: Drain) -> VaultResult<Vec<AudioChunk>> {
        let Drain { mut task, halt } = drain;

        let joined = match tokio::time::timeout(self.config.stop_grace, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                warn!(
                    "Producer for {} did not close its channel within {:?}; forcing drain",
                    self.config.session_id, self.config.stop_grace
                );
                let _ = halt.send(());
                task.await
            }
        };

        joined.map_err(|e| VaultError::Capture(anyhow::anyhow!("drain task failed: {}", e)))
    }

    /// Get current session statistics
    pub fn stats(&self) -> SessionStats {
        let duration_secs = self
            .started_at
            .map(|t| Utc::now().signed_duration_since(t).num_milliseconds() as f64 / 1000.0)
            .unwrap_or(0.0);

        SessionStats {
            session_id: self.config.session_id.clone(),
            state: self.state,
            backend: self.backend.name().to_string(),
            started_at: self.started_at,
            duration_secs,
            chunks_received: self.chunks_received.load(Ordering::SeqCst),
        }
    }
}

/// Receive chunks in order until the producer closes the channel or a halt
/// is requested, then take whatever is still buffered.
async fn drain_chunks(
    mut chunk_rx: mpsc::Receiver<AudioChunk>,
    mut halt: oneshot::Receiver<()>,
    received: Arc<AtomicUsize>,
) -> Vec<AudioChunk> {
    let mut chunks = Vec::new();

    loop {
        tokio::select! {
            biased;
            maybe_chunk = chunk_rx.recv() => match maybe_chunk {
                Some(chunk) => {
                    debug!("Drained chunk {} ({} samples)", chunk.sequence, chunk.samples.len());
                    chunks.push(chunk);
                    received.fetch_add(1, Ordering::SeqCst);
                }
                None => break,
            },
            _ = &mut halt => {
                chunk_rx.close();
                while let Some(chunk) = chunk_rx.recv().await {
                    chunks.push(chunk);
                    received.fetch_add(1, Ordering::SeqCst);
                }
                break;
            }
        }
    }

    chunks
}

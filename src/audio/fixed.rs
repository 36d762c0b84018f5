//! Legacy fixed-duration capture
//!
//! Runs a backend for a set time and returns everything it delivered. It
//! does not touch any session state.

use std::time::Duration;
use tracing::info;

use super::backend::CaptureBackend;
use super::buffer::{AudioChunk, SampleBuffer};
use crate::error::{VaultError, VaultResult};

/// Capture from `backend` for `duration` and return the contiguous buffer
pub async fn record_for(
    backend: &mut dyn CaptureBackend,
    duration: Duration,
) -> VaultResult<SampleBuffer> {
    info!(
        "Recording {:.1}s from {} backend",
        duration.as_secs_f64(),
        backend.name()
    );

    let mut rx = backend.start().await.map_err(VaultError::Capture)?;

    let mut chunks: Vec<AudioChunk> = Vec::new();
    let deadline = tokio::time::sleep(duration);
    tokio::pin!(deadline);

    // A source may run dry before the deadline
    loop {
        tokio::select! {
            maybe_chunk = rx.recv() => match maybe_chunk {
                Some(chunk) => chunks.push(chunk),
                None => break,
            },
            _ = &mut deadline => break,
        }
    }

    backend.stop().await.map_err(VaultError::Capture)?;

    rx.close();
    while let Some(chunk) = rx.recv().await {
        chunks.push(chunk);
    }

    let buffer = SampleBuffer::from_chunks(chunks)?;

    info!(
        "Recording complete: {} samples, peak {:.3}",
        buffer.len(),
        buffer.peak()
    );

    Ok(buffer)
}

//! Mono 16-bit PCM WAV container

use std::io::Cursor;
use tracing::info;

use super::buffer::{SampleBuffer, SampleFormat};
use crate::error::{VaultError, VaultResult};

const PCM_SCALE: f64 = 32767.0;

/// Quantize a normalized sample to 16-bit PCM
pub fn quantize(sample: f64) -> i16 {
    (sample * PCM_SCALE)
        .round()
        .clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

/// Serialize a buffer as a single-channel 16-bit WAV at `sample_rate`.
///
/// Multi-channel buffers are averaged down to mono first.
pub fn write(buffer: &SampleBuffer, sample_rate: u32) -> VaultResult<Vec<u8>> {
    if buffer.is_empty() {
        return Err(VaultError::ContainerWriteFailure(
            "sample buffer is empty".to_string(),
        ));
    }

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mono = buffer.to_mono();
    let mut cursor = Cursor::new(Vec::with_capacity(44 + mono.len() * 2));

    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(container_error)?;
        for &sample in &mono {
            writer.write_sample(quantize(sample)).map_err(container_error)?;
        }
        writer.finalize().map_err(container_error)?;
    }

    let bytes = cursor.into_inner();
    if bytes.is_empty() {
        return Err(VaultError::ContainerWriteFailure(
            "serializer produced zero bytes".to_string(),
        ));
    }

    info!(
        "WAV written: {} samples at {}Hz ({} bytes)",
        mono.len(),
        sample_rate,
        bytes.len()
    );

    Ok(bytes)
}

/// Parse a 16-bit integer WAV back into normalized samples
pub fn read(bytes: &[u8]) -> VaultResult<SampleBuffer> {
    let reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| VaultError::InvalidInput(format!("not a WAV container: {}", e)))?;

    let spec = reader.spec();
    if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
        return Err(VaultError::InvalidInput(format!(
            "unsupported WAV encoding: {} bit {:?}",
            spec.bits_per_sample, spec.sample_format
        )));
    }

    let samples = reader
        .into_samples::<i16>()
        .map(|s| s.map(|v| v as f64 / PCM_SCALE))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| VaultError::InvalidInput(format!("truncated WAV data: {}", e)))?;

    Ok(SampleBuffer::new(
        samples,
        spec.sample_rate,
        spec.channels,
        SampleFormat::Int16,
    ))
}

fn container_error(e: hound::Error) -> VaultError {
    VaultError::ContainerWriteFailure(e.to_string())
}

//! Reconstructs playable samples from decrypted bytes
//!
//! Consistent metadata selects the decode path directly. Without it the bytes
//! are probed in a fixed order: float64, then int16, then unsigned 8-bit PCM.
//! The result is always rescaled and clipped into [-1.0, 1.0].

mod metadata;

pub use metadata::{ElementFormat, FormatMetadata};

use tracing::{debug, info, warn};

use crate::audio::{SampleBuffer, SampleFormat};
use crate::error::{VaultError, VaultResult};

/// Float64 interpretations with a peak at or above this are rejected as noise
pub const IMPLAUSIBLE_AMPLITUDE: f64 = 1e10;

/// A byte buffer interpreted as one concrete sample encoding
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedPayload {
    Float64(Vec<f64>),
    Int16(Vec<i16>),
    RawPcm(Vec<u8>),
}

impl DecodedPayload {
    pub fn format(&self) -> SampleFormat {
        match self {
            Self::Float64(_) => SampleFormat::Float64,
            Self::Int16(_) => SampleFormat::Int16,
            Self::RawPcm(_) => SampleFormat::RawPcm8,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Float64(v) => v.len(),
            Self::Int16(v) => v.len(),
            Self::RawPcm(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Map to floating point using the encoding's nominal full scale
    pub fn normalize(&self) -> Vec<f64> {
        match self {
            Self::Float64(v) => v.clone(),
            Self::Int16(v) => v.iter().map(|&s| s as f64 / 32767.0).collect(),
            Self::RawPcm(v) => v.iter().map(|&s| s as f64 / 128.0 - 1.0).collect(),
        }
    }
}

/// Decode `bytes` into a normalized sample buffer.
///
/// `default_sample_rate` applies when the metadata carries none.
pub fn resolve(
    bytes: &[u8],
    metadata: Option<&FormatMetadata>,
    default_sample_rate: u32,
) -> VaultResult<SampleBuffer> {
    if bytes.is_empty() {
        return Err(VaultError::FormatDetectionFailure(
            "payload is empty".to_string(),
        ));
    }

    let sample_rate = metadata
        .and_then(|m| m.sample_rate)
        .filter(|&rate| rate > 0)
        .unwrap_or(default_sample_rate);

    let (payload, channels) = match metadata {
        Some(meta) => decode_with_metadata(bytes, meta),
        None => (classify(bytes), 1),
    };

    // Declared layout too wide for the bytes present: probe instead
    let (payload, channels) = match payload {
        Some(p) if !p.is_empty() => (Some(p), channels),
        _ => {
            debug!("declared layout yields no whole elements, probing");
            (classify(bytes), 1)
        }
    };

    let payload = payload
        .filter(|p| !p.is_empty())
        .ok_or_else(|| {
            VaultError::FormatDetectionFailure(format!(
                "no interpretation of {} bytes yields samples",
                bytes.len()
            ))
        })?;

    let format = payload.format();
    let mut samples = payload.normalize();
    let peak = normalize_peak(&mut samples);

    info!(
        "Resolved {} bytes as {:?}: {} samples, {}Hz, {} channel(s), peak {:.3}",
        bytes.len(),
        format,
        samples.len(),
        sample_rate,
        channels,
        peak
    );

    Ok(SampleBuffer::new(samples, sample_rate, channels, format))
}

/// Probe `bytes` in fixed order and return the first plausible reading
pub fn classify(bytes: &[u8]) -> Option<DecodedPayload> {
    let floats = decode_f64(bytes);
    if !floats.is_empty() {
        match plausibility(&floats) {
            Ok(()) => return Some(DecodedPayload::Float64(floats)),
            Err(reason) => debug!("float64 rejected: {}", reason),
        }
    }

    let ints = decode_i16(bytes);
    if !ints.is_empty() {
        return Some(DecodedPayload::Int16(ints));
    }

    if !bytes.is_empty() {
        return Some(DecodedPayload::RawPcm(bytes.to_vec()));
    }

    None
}

fn decode_with_metadata(bytes: &[u8], meta: &FormatMetadata) -> (Option<DecodedPayload>, u16) {
    let Some(width) = meta.format.width() else {
        return (classify(bytes), 1);
    };

    let Some(count) = meta.element_count() else {
        if meta.format == ElementFormat::Float64 {
            debug!("float64 metadata without shape, probing");
            return (classify(bytes), 1);
        }
        return (Some(decode_as(meta.format, bytes)), 1);
    };

    match count.checked_mul(width) {
        Some(expected) if bytes.len() >= expected => {
            if bytes.len() > expected {
                debug!(
                    "Ignoring {} trailing bytes beyond declared shape",
                    bytes.len() - expected
                );
            }
            (Some(decode_as(meta.format, &bytes[..expected])), meta.channels())
        }
        _ => {
            warn!(
                "Metadata declares {:?} shape {:?} but only {} bytes present; decoding without reshape",
                meta.format,
                meta.shape,
                bytes.len()
            );
            (Some(decode_as(meta.format, bytes)), 1)
        }
    }
}

fn decode_as(format: ElementFormat, bytes: &[u8]) -> DecodedPayload {
    match format {
        ElementFormat::Int16 => DecodedPayload::Int16(decode_i16(bytes)),
        ElementFormat::Float64 | ElementFormat::Bytes => DecodedPayload::Float64(decode_f64(bytes)),
    }
}

fn decode_f64(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(8)
        .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
        .collect()
}

fn decode_i16(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect()
}

fn plausibility(samples: &[f64]) -> Result<(), String> {
    let mut peak = 0.0_f64;
    for &s in samples {
        if !s.is_finite() {
            return Err("non-finite value".to_string());
        }
        peak = peak.max(s.abs());
    }

    if peak >= IMPLAUSIBLE_AMPLITUDE {
        return Err(format!("peak {:e} is implausible", peak));
    }
    Ok(())
}

/// Rescale so the peak is at most 1.0, then hard-clip. Returns the final peak.
fn normalize_peak(samples: &mut [f64]) -> f64 {
    let peak = samples
        .iter()
        .filter(|s| s.is_finite())
        .fold(0.0_f64, |acc, s| acc.max(s.abs()));

    if peak > 1.0 {
        for s in samples.iter_mut() {
            *s /= peak;
        }
    }

    let mut clipped_peak = 0.0_f64;
    for s in samples.iter_mut() {
        // NaN from a forced float64 decode becomes silence
        *s = if s.is_nan() { 0.0 } else { s.clamp(-1.0, 1.0) };
        clipped_peak = clipped_peak.max(s.abs());
    }

    clipped_peak
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f64_bytes(values: &[f64]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_classify_unit_range_float64() {
        let bytes = f64_bytes(&[0.0, 0.5, -0.5, 1.0, -1.0]);
        assert!(matches!(classify(&bytes), Some(DecodedPayload::Float64(_))));
    }

    #[test]
    fn test_classify_rejects_nan_float64() {
        let bytes = f64_bytes(&[f64::NAN, 0.5]);
        assert!(matches!(classify(&bytes), Some(DecodedPayload::Int16(_))));
    }

    #[test]
    fn test_classify_single_byte_is_raw_pcm() {
        assert_eq!(classify(&[200]), Some(DecodedPayload::RawPcm(vec![200])));
    }

    #[test]
    fn test_classify_empty_is_none() {
        assert_eq!(classify(&[]), None);
    }

    #[test]
    fn test_raw_pcm_midpoint_is_silence() {
        assert_eq!(DecodedPayload::RawPcm(vec![128]).normalize(), vec![0.0]);
        assert_eq!(DecodedPayload::RawPcm(vec![0]).normalize(), vec![-1.0]);
    }

    #[test]
    fn test_normalize_peak_rescales_then_clips() {
        let mut samples = vec![2.0, -1.0, 0.5];
        let peak = normalize_peak(&mut samples);

        assert_eq!(samples, vec![1.0, -0.5, 0.25]);
        assert_eq!(peak, 1.0);
    }

    #[test]
    fn test_normalize_peak_leaves_unit_range_alone() {
        let mut samples = vec![0.25, -0.75];
        normalize_peak(&mut samples);
        assert_eq!(samples, vec![0.25, -0.75]);
    }

    #[test]
    fn test_int16_min_is_rescaled_into_range() {
        let buffer = resolve(&i16::MIN.to_le_bytes(), Some(&FormatMetadata {
            format: ElementFormat::Int16,
            shape: vec![1],
            sample_rate: None,
        }), 8000)
        .unwrap();

        assert_eq!(buffer.samples, vec![-1.0]);
        assert_eq!(buffer.source_format, SampleFormat::Int16);
    }
}

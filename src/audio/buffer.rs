use serde::{Deserialize, Serialize};

use crate::error::{VaultError, VaultResult};

/// Numeric format the samples had before normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleFormat {
    Float64,
    Float32,
    Int16,
    RawPcm8,
}

impl SampleFormat {
    /// Width in bytes of one source element
    pub fn element_width(self) -> usize {
        match self {
            Self::Float64 => 8,
            Self::Float32 => 4,
            Self::Int16 => 2,
            Self::RawPcm8 => 1,
        }
    }
}

/// One block of samples delivered by a capture callback
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Normalized samples, interleaved if `channels > 1`
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Delivery order assigned by the producer
    pub sequence: u64,
}

/// Contiguous normalized audio in [-1.0, 1.0]
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    pub samples: Vec<f64>,
    pub sample_rate: u32,
    pub channels: u16,
    pub source_format: SampleFormat,
}

impl SampleBuffer {
    pub fn new(samples: Vec<f64>, sample_rate: u32, channels: u16, source_format: SampleFormat) -> Self {
        Self {
            samples,
            sample_rate,
            channels: channels.max(1),
            source_format,
        }
    }

    /// Concatenate chunks in arrival order.
    ///
    /// All chunks must share one sample rate and channel count; zero chunks or
    /// zero samples is [`VaultError::NoDataCaptured`].
    pub fn from_chunks(chunks: Vec<AudioChunk>) -> VaultResult<Self> {
        let Some(first) = chunks.first() else {
            return Err(VaultError::NoDataCaptured);
        };
        let (sample_rate, channels) = (first.sample_rate, first.channels);

        let total: usize = chunks.iter().map(|c| c.samples.len()).sum();
        let mut samples = Vec::with_capacity(total);

        for chunk in chunks {
            if chunk.sample_rate != sample_rate || chunk.channels != channels {
                return Err(VaultError::Capture(anyhow::anyhow!(
                    "chunk {} is {}Hz/{}ch, expected {}Hz/{}ch",
                    chunk.sequence,
                    chunk.sample_rate,
                    chunk.channels,
                    sample_rate,
                    channels
                )));
            }
            samples.extend(chunk.samples.into_iter().map(f64::from));
        }

        if samples.is_empty() {
            return Err(VaultError::NoDataCaptured);
        }

        Ok(Self::new(samples, sample_rate, channels, SampleFormat::Float32))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn peak(&self) -> f64 {
        self.samples.iter().fold(0.0_f64, |acc, s| acc.max(s.abs()))
    }

    /// Little-endian float64 bytes, the plaintext layout of the cipher pipeline
    pub fn to_f64_le_bytes(&self) -> Vec<u8> {
        self.samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    /// Mono view of the buffer, averaging each interleaved frame
    pub fn to_mono(&self) -> Vec<f64> {
        if self.channels <= 1 {
            return self.samples.clone();
        }

        let channels = self.channels as usize;
        self.samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f64>() / channels as f64)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(sequence: u64, samples: Vec<f32>) -> AudioChunk {
        AudioChunk {
            samples,
            sample_rate: 44100,
            channels: 1,
            sequence,
        }
    }

    #[test]
    fn test_from_chunks_preserves_order() {
        let buffer = SampleBuffer::from_chunks(vec![
            chunk(0, vec![0.5, 0.25]),
            chunk(1, vec![-0.5]),
            chunk(2, vec![0.0, 1.0]),
        ])
        .unwrap();

        assert_eq!(buffer.samples, vec![0.5, 0.25, -0.5, 0.0, 1.0]);
        assert_eq!(buffer.sample_rate, 44100);
        assert_eq!(buffer.source_format, SampleFormat::Float32);
    }

    #[test]
    fn test_from_chunks_empty_is_no_data() {
        assert!(matches!(
            SampleBuffer::from_chunks(Vec::new()),
            Err(VaultError::NoDataCaptured)
        ));
        assert!(matches!(
            SampleBuffer::from_chunks(vec![chunk(0, Vec::new())]),
            Err(VaultError::NoDataCaptured)
        ));
    }

    #[test]
    fn test_from_chunks_rejects_rate_change() {
        let mut odd = chunk(1, vec![0.1]);
        odd.sample_rate = 16000;

        assert!(matches!(
            SampleBuffer::from_chunks(vec![chunk(0, vec![0.1]), odd]),
            Err(VaultError::Capture(_))
        ));
    }

    #[test]
    fn test_stereo_to_mono_averages_frames() {
        let buffer = SampleBuffer::new(vec![1.0, 0.0, -0.5, -0.5], 8000, 2, SampleFormat::Float64);

        assert_eq!(buffer.frames(), 2);
        assert_eq!(buffer.to_mono(), vec![0.5, -0.5]);
    }

    #[test]
    fn test_f64_le_layout() {
        let buffer = SampleBuffer::new(vec![0.25], 44100, 1, SampleFormat::Float64);
        assert_eq!(buffer.to_f64_le_bytes(), 0.25_f64.to_le_bytes().to_vec());
    }

    #[test]
    fn test_duration_and_peak() {
        let buffer = SampleBuffer::new(vec![0.1, -0.8, 0.3, 0.0], 4, 1, SampleFormat::Int16);
        assert!((buffer.duration_secs() - 1.0).abs() < f64::EPSILON);
        assert!((buffer.peak() - 0.8).abs() < f64::EPSILON);
    }
}

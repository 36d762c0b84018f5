use serde::{Deserialize, Serialize};

use crate::audio::SampleBuffer;

/// Element format declared alongside a ciphertext
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementFormat {
    #[serde(alias = "f64")]
    Float64,
    #[serde(alias = "i16")]
    Int16,
    /// Undifferentiated bytes; decoding falls back to probing
    #[serde(alias = "uint8")]
    Bytes,
}

impl ElementFormat {
    /// Byte width of one element, if the format has a fixed width
    pub fn width(self) -> Option<usize> {
        match self {
            Self::Float64 => Some(8),
            Self::Int16 => Some(2),
            Self::Bytes => None,
        }
    }
}

/// Optional description of a plaintext payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatMetadata {
    pub format: ElementFormat,
    #[serde(default)]
    pub shape: Vec<usize>,
    #[serde(default, alias = "sampleRate")]
    pub sample_rate: Option<u32>,
}

impl FormatMetadata {
    pub fn float64(shape: Vec<usize>, sample_rate: u32) -> Self {
        Self {
            format: ElementFormat::Float64,
            shape,
            sample_rate: Some(sample_rate),
        }
    }

    /// Metadata describing `buffer` serialized as float64
    pub fn for_buffer(buffer: &SampleBuffer) -> Self {
        let shape = if buffer.channels > 1 {
            vec![buffer.frames(), buffer.channels as usize]
        } else {
            vec![buffer.len()]
        };
        Self::float64(shape, buffer.sample_rate)
    }

    /// Product of the shape; `None` when empty, zero or overflowing
    pub fn element_count(&self) -> Option<usize> {
        if self.shape.is_empty() {
            return None;
        }
        self.shape
            .iter()
            .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
            .filter(|&n| n > 0)
    }

    /// Channel count implied by a `[frames, channels]` shape
    pub fn channels(&self) -> u16 {
        match self.shape.as_slice() {
            [_, channels] => u16::try_from(*channels).ok().filter(|&c| c > 0).unwrap_or(1),
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_camel_case_rate() {
        let json = r#"{"format": "float64", "shape": [8], "sampleRate": 44100}"#;
        let meta: FormatMetadata = serde_json::from_str(json).unwrap();

        assert_eq!(meta.format, ElementFormat::Float64);
        assert_eq!(meta.shape, vec![8]);
        assert_eq!(meta.sample_rate, Some(44100));
    }

    #[test]
    fn test_element_count() {
        assert_eq!(FormatMetadata::float64(vec![4, 2], 8000).element_count(), Some(8));
        assert_eq!(FormatMetadata::float64(vec![], 8000).element_count(), None);
        assert_eq!(FormatMetadata::float64(vec![0], 8000).element_count(), None);
        assert_eq!(
            FormatMetadata::float64(vec![usize::MAX, 2], 8000).element_count(),
            None
        );
    }

    #[test]
    fn test_channels_from_shape() {
        assert_eq!(FormatMetadata::float64(vec![100], 8000).channels(), 1);
        assert_eq!(FormatMetadata::float64(vec![100, 2], 8000).channels(), 2);
        assert_eq!(FormatMetadata::float64(vec![100, 0], 8000).channels(), 1);
    }
}

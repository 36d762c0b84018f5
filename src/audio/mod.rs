pub mod backend;
pub mod buffer;
pub mod container;
pub mod file;
pub mod fixed;
pub mod producer;
pub mod replay;

#[cfg(feature = "microphone")]
pub mod microphone;

pub use backend::{BackendConfig, CaptureBackend, CaptureBackendFactory, CaptureSource};
pub use buffer::{AudioChunk, SampleBuffer, SampleFormat};
pub use file::AudioFile;
pub use fixed::record_for;
pub use producer::ProducerThread;
pub use replay::ReplayBackend;

pub mod audio;
pub mod cipher;
pub mod config;
pub mod entropy;
pub mod error;
pub mod http;
pub mod resolver;
pub mod session;
pub mod vault;

pub use audio::{
    AudioChunk, AudioFile, BackendConfig, CaptureBackend, CaptureBackendFactory, CaptureSource,
    ReplayBackend, SampleBuffer, SampleFormat,
};
pub use config::Config;
pub use entropy::{EntropySource, QrngClient, QrngResponse, RandomnessService};
pub use error::{VaultError, VaultResult};
pub use http::{create_router, AppState};
pub use resolver::{DecodedPayload, ElementFormat, FormatMetadata};
pub use session::{CaptureSession, CaptureState, SessionConfig, SessionManager, SessionStats};
pub use vault::{DecryptRequest, EncryptedRecording, VaultService};

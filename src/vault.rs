//! Encryption pipeline facade
//!
//! Composes capture, key acquisition, the payload cipher, format resolution
//! and WAV serialization into the operations the transport exposes.

use anyhow::Result;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::info;
use zeroize::Zeroizing;

use crate::audio::{
    container, record_for, BackendConfig, CaptureBackend, CaptureBackendFactory, CaptureSource,
    SampleBuffer,
};
use crate::cipher;
use crate::config::Config;
use crate::entropy::{EntropySource, KeyProvenance};
use crate::error::{VaultError, VaultResult};
use crate::resolver::{self, ElementFormat, FormatMetadata};
use crate::session::{SessionConfig, SessionManager, SessionStats};

/// Result of every encrypting operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedRecording {
    /// Hex ciphertext
    pub encrypted_data: String,
    /// Hex key; the only copy, never stored server-side
    pub aes_key: String,
    /// Layout of the plaintext
    pub metadata: FormatMetadata,
}

/// Ciphertext plus the key and optional layout needed to reverse it
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DecryptRequest {
    pub encrypted_data: Option<String>,
    pub aes_key: Option<String>,
    #[serde(default)]
    pub metadata: Option<FormatMetadata>,
}

/// Builds a capture backend for each recording
pub type BackendBuilder = Box<dyn Fn() -> Result<Box<dyn CaptureBackend>> + Send + Sync>;

pub struct VaultService {
    config: Config,
    entropy: EntropySource,
    sessions: SessionManager,
    backends: BackendBuilder,
}

impl VaultService {
    pub fn new(config: Config, entropy: EntropySource, backends: BackendBuilder) -> Self {
        Self {
            config,
            entropy,
            sessions: SessionManager::new(),
            backends,
        }
    }

    /// Service with the remote QRNG client and a factory-built capture source
    pub fn from_config(config: Config, source: CaptureSource) -> Result<Self> {
        let entropy = EntropySource::from_config(&config.entropy)?;
        let backend_config = BackendConfig::from(&config.audio);

        let backends: BackendBuilder = Box::new(move || {
            CaptureBackendFactory::create(source.clone(), backend_config.clone())
        });

        Ok(Self::new(config, entropy, backends))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    fn backend(&self) -> VaultResult<Box<dyn CaptureBackend>> {
        (self.backends)().map_err(VaultError::Capture)
    }

    /// Fixed-duration recording, encrypted under a fresh key
    pub async fn record(&self) -> VaultResult<EncryptedRecording> {
        let mut backend = self.backend()?;
        let buffer = record_for(backend.as_mut(), self.config.audio.record_duration()).await?;
        self.encrypt_buffer(&buffer).await
    }

    /// Start a streaming capture session; returns its id
    pub async fn start_session(&self, session_id: Option<String>) -> VaultResult<String> {
        let backend = self.backend()?;
        let session_id = session_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(SessionConfig::generate_id);
        let config = SessionConfig::new(session_id, &BackendConfig::from(&self.config.audio));

        self.sessions.start(config, backend).await
    }

    /// Stop a session and encrypt what it captured
    pub async fn stop_session(&self, session_id: &str) -> VaultResult<EncryptedRecording> {
        let buffer = self.sessions.stop(session_id).await?;
        self.encrypt_buffer(&buffer).await
    }

    pub async fn session_stats(&self, session_id: &str) -> VaultResult<SessionStats> {
        self.sessions.stats(session_id).await
    }

    /// Encrypt a sample buffer as little-endian float64 under a fresh key
    pub async fn encrypt_buffer(&self, buffer: &SampleBuffer) -> VaultResult<EncryptedRecording> {
        let plaintext = buffer.to_f64_le_bytes();
        self.seal(&plaintext, FormatMetadata::for_buffer(buffer)).await
    }

    /// Encrypt caller-supplied raw audio bytes (base64, float64 LE by default)
    pub async fn encrypt_audio(
        &self,
        audio_b64: &str,
        sample_rate: Option<u32>,
    ) -> VaultResult<EncryptedRecording> {
        let plaintext = base64::engine::general_purpose::STANDARD
            .decode(audio_b64.trim())
            .map_err(|e| VaultError::InvalidInput(format!("audio is not valid base64: {}", e)))?;

        if plaintext.is_empty() {
            return Err(VaultError::InvalidInput("missing audio payload".to_string()));
        }

        let sample_rate = sample_rate.unwrap_or(self.config.audio.sample_rate);
        let metadata = if plaintext.len() % 8 == 0 {
            FormatMetadata::float64(vec![plaintext.len() / 8], sample_rate)
        } else {
            FormatMetadata {
                format: ElementFormat::Bytes,
                shape: Vec::new(),
                sample_rate: Some(sample_rate),
            }
        };

        self.seal(&plaintext, metadata).await
    }

    async fn seal(&self, plaintext: &[u8], metadata: FormatMetadata) -> VaultResult<EncryptedRecording> {
        // One key per plaintext; the counter always starts at the same value
        let (key, provenance) = self
            .entropy
            .fetch_with_provenance(cipher::KEY_LEN, self.config.entropy.retries)
            .await;
        let key = Zeroizing::new(key);

        if provenance == KeyProvenance::LocalFallback {
            info!("Encrypting with locally generated key");
        }

        let ciphertext = cipher::encrypt(plaintext, &key)?;

        info!(
            "Encrypted {} bytes ({:?}, shape {:?})",
            ciphertext.len(),
            metadata.format,
            metadata.shape
        );

        Ok(EncryptedRecording {
            encrypted_data: hex::encode(&ciphertext),
            aes_key: hex::encode(key.as_slice()),
            metadata,
        })
    }

    /// Reverse the cipher and return the raw plaintext bytes.
    ///
    /// Empty ciphertext decrypts to empty plaintext; format resolution rejects it.
    pub fn decrypt_raw(&self, request: &DecryptRequest) -> VaultResult<Vec<u8>> {
        let ciphertext = decode_hex_field(request.encrypted_data.as_deref(), "encrypted_data")?;
        let key = Zeroizing::new(decode_hex_field(request.aes_key.as_deref(), "aes_key")?);

        let plaintext = cipher::decrypt(&ciphertext, &key)?;
        info!("Decrypted {} bytes", plaintext.len());

        Ok(plaintext)
    }

    /// Decrypt and reconstruct samples
    pub fn decrypt(&self, request: &DecryptRequest) -> VaultResult<SampleBuffer> {
        let plaintext = self.decrypt_raw(request)?;
        resolver::resolve(
            &plaintext,
            request.metadata.as_ref(),
            self.config.audio.sample_rate,
        )
    }

    /// Decrypt and emit a playable mono 16-bit WAV
    pub fn decrypt_to_wav(&self, request: &DecryptRequest) -> VaultResult<Vec<u8>> {
        let buffer = self.decrypt(request)?;
        container::write(&buffer, buffer.sample_rate)
    }
}

fn decode_hex_field(value: Option<&str>, field: &str) -> VaultResult<Vec<u8>> {
    let value = value
        .map(str::trim)
        .ok_or_else(|| VaultError::InvalidInput(format!("missing {}", field)))?;

    hex::decode(value).map_err(|e| VaultError::InvalidInput(format!("{} is not valid hex: {}", field, e)))
}

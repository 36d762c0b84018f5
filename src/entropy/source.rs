use anyhow::Result;
use rand::rngs::OsRng;
use rand::RngCore;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::client::{QrngClient, RandomnessService};
use super::messages::QrngResponse;
use crate::config::EntropyConfig;

/// Where a batch of key material came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyProvenance {
    Remote,
    LocalFallback,
}

/// Outcome of a single remote attempt
#[derive(Debug)]
enum Attempt {
    Accepted(Vec<u8>),
    Rejected(String),
}

/// Remote-first entropy with an OS CSPRNG fallback
#[derive(Clone)]
pub struct EntropySource {
    service: Arc<dyn RandomnessService>,
}

impl EntropySource {
    pub fn new(service: Arc<dyn RandomnessService>) -> Self {
        Self { service }
    }

    pub fn from_config(config: &EntropyConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(QrngClient::from_config(config)?)))
    }

    /// Fetch exactly `size` bytes, trying the remote service up to `retries`
    /// times before falling back to local entropy. Never fails.
    pub async fn fetch(&self, size: usize, retries: u32) -> Vec<u8> {
        self.fetch_with_provenance(size, retries).await.0
    }

    pub async fn fetch_with_provenance(&self, size: usize, retries: u32) -> (Vec<u8>, KeyProvenance) {
        if size == 0 {
            return (Vec::new(), KeyProvenance::LocalFallback);
        }

        info!(
            "Fetching {} bytes of key material from {}",
            size,
            self.service.name()
        );

        for attempt in 1..=retries {
            match self.attempt(size).await {
                Attempt::Accepted(bytes) => {
                    info!(
                        "Attempt {}/{} succeeded: {}...",
                        attempt,
                        retries,
                        preview(&bytes)
                    );
                    return (bytes, KeyProvenance::Remote);
                }
                Attempt::Rejected(reason) => {
                    warn!("Attempt {}/{} failed: {}", attempt, retries, reason);
                }
            }
        }

        warn!(
            "{} unavailable after {} attempts, falling back to local entropy",
            self.service.name(),
            retries
        );

        let bytes = local_entropy(size);
        info!("Generated local entropy: {}...", preview(&bytes));

        (bytes, KeyProvenance::LocalFallback)
    }

    async fn attempt(&self, size: usize) -> Attempt {
        match self.service.request(size).await {
            Ok(response) => validate(response, size),
            Err(e) => {
                error!("Randomness request error: {:#}", e);
                Attempt::Rejected(format!("{:#}", e))
            }
        }
    }
}

fn validate(response: QrngResponse, size: usize) -> Attempt {
    if !response.success {
        return Attempt::Rejected("service reported success=false".to_string());
    }

    if response.data.len() != size {
        return Attempt::Rejected(format!(
            "expected {} values, got {}",
            size,
            response.data.len()
        ));
    }

    let bytes: Option<Vec<u8>> = response
        .data
        .iter()
        .map(|&value| u8::try_from(value).ok())
        .collect();

    match bytes {
        Some(bytes) => Attempt::Accepted(bytes),
        None => Attempt::Rejected("value outside uint8 range".to_string()),
    }
}

fn local_entropy(size: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; size];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// First 10 bytes in hex; full keys never reach the log
fn preview(bytes: &[u8]) -> String {
    hex::encode(&bytes[..bytes.len().min(10)])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(success: bool, data: Vec<i64>) -> QrngResponse {
        QrngResponse { success, data }
    }

    #[test]
    fn test_validate_accepts_exact_length() {
        match validate(response(true, vec![0, 127, 255]), 3) {
            Attempt::Accepted(bytes) => assert_eq!(bytes, vec![0, 127, 255]),
            Attempt::Rejected(reason) => panic!("unexpected rejection: {}", reason),
        }
    }

    #[test]
    fn test_validate_rejects_failure_flag() {
        assert!(matches!(
            validate(response(false, vec![1, 2]), 2),
            Attempt::Rejected(_)
        ));
    }

    #[test]
    fn test_validate_rejects_short_data() {
        assert!(matches!(
            validate(response(true, vec![1, 2]), 3),
            Attempt::Rejected(_)
        ));
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert!(matches!(
            validate(response(true, vec![1, 256]), 2),
            Attempt::Rejected(_)
        ));
        assert!(matches!(
            validate(response(true, vec![-1, 2]), 2),
            Attempt::Rejected(_)
        ));
    }

    #[test]
    fn test_preview_truncates() {
        assert_eq!(preview(&[0xab; 32]).len(), 20);
        assert_eq!(preview(&[0x01, 0x02]), "0102");
    }
}

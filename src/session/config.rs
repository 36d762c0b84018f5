use std::time::Duration;

use crate::audio::BackendConfig;

/// Configuration for a capture session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Unique session identifier (e.g., "session-7f3c...")
    pub session_id: String,

    /// How long `stop()` waits for the drain to finish after signalling the
    /// producer before forcing the channel closed
    pub stop_grace: Duration,
}

impl SessionConfig {
    pub fn new(session_id: impl Into<String>, backend: &BackendConfig) -> Self {
        Self {
            session_id: session_id.into(),
            stop_grace: backend.stop_grace,
        }
    }

    /// Generate a fresh identifier
    pub fn generate_id() -> String {
        format!("session-{}", uuid::Uuid::new_v4())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(Self::generate_id(), &BackendConfig::default())
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::session::CaptureState;

/// Statistics about a capture session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: String,

    /// Current state of the session
    pub state: CaptureState,

    /// Name of the capture backend
    pub backend: String,

    /// When the current (or last) recording started
    pub started_at: Option<DateTime<Utc>>,

    /// Seconds since `started_at`
    pub duration_secs: f64,

    /// Chunks drained so far in the current recording
    pub chunks_received: usize,
}

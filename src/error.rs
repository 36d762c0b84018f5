use thiserror::Error;

/// Errors surfaced by the vault core.
///
/// Every variant is returned to the caller as-is; the HTTP layer maps them
/// onto status codes. Entropy failures never appear here because the local
/// fallback always recovers them.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("cipher precondition violated: key must be {expected} bytes, got {actual}")]
    CipherPrecondition { expected: usize, actual: usize },

    #[error("no audio captured")]
    NoDataCaptured,

    #[error("session {0} is already recording")]
    SessionConflict(String),

    #[error("invalid transition: cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("session {0} not found")]
    SessionNotFound(String),

    #[error("format detection failed: {0}")]
    FormatDetectionFailure(String),

    #[error("container write failed: {0}")]
    ContainerWriteFailure(String),

    #[error("capture backend failed: {0:#}")]
    Capture(#[source] anyhow::Error),
}

pub type VaultResult<T> = Result<T, VaultError>;

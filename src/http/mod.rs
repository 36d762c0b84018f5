//! HTTP API over the vault core
//!
//! This module provides a REST API for the encryption pipeline:
//! - POST /api/record - Fixed-duration recording, encrypted
//! - POST /api/record/start - Start a capture session
//! - POST /api/record/stop/:id - Stop a session and encrypt its audio
//! - GET /api/record/:id/status - Query session status
//! - POST /api/encrypt - Encrypt caller-supplied raw audio
//! - POST /api/decrypt - Decrypt to a WAV attachment
//! - POST /api/decrypt/raw - Decrypt to base64 samples
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;

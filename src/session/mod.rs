//! Capture session management
//!
//! This module provides the `CaptureSession` state machine that manages:
//! - Starting and stopping a capture backend's producer thread
//! - Draining audio chunks in arrival order while recording
//! - Assembling the drained chunks into one contiguous sample buffer
//!
//! `SessionManager` keys live sessions by identifier so several captures can
//! run side by side.

mod config;
mod manager;
mod session;
mod stats;

pub use config::SessionConfig;
pub use manager::SessionManager;
pub use session::{CaptureSession, CaptureState};
pub use stats::SessionStats;

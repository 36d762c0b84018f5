use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use super::config::SessionConfig;
use super::session::CaptureSession;
use super::stats::SessionStats;
use crate::audio::{CaptureBackend, SampleBuffer};
use crate::error::{VaultError, VaultResult};

/// Live capture sessions keyed by session id
#[derive(Clone, Default)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<String, Arc<Mutex<CaptureSession>>>>>,
    /// Ids whose backend is still starting
    starting: Arc<StdMutex<HashSet<String>>>,
}

/// Holds an id in the starting set until dropped
struct Reservation {
    starting: Arc<StdMutex<HashSet<String>>>,
    session_id: String,
}

impl Drop for Reservation {
    fn drop(&mut self) {
        let mut starting = self.starting.lock().unwrap_or_else(|e| e.into_inner());
        starting.remove(&self.session_id);
    }
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and start a session; returns its id.
    ///
    /// An id that is registered or still starting is a conflict. The backend
    /// starts without holding the session map, and a session whose backend
    /// fails to start is never registered.
    pub async fn start(
        &self,
        config: SessionConfig,
        backend: Box<dyn CaptureBackend>,
    ) -> VaultResult<String> {
        let session_id = config.session_id.clone();
        let reservation = self.reserve(&session_id).await?;

        let mut session = CaptureSession::new(config, backend);
        session.start().await?;

        let mut sessions = self.sessions.write().await;
        sessions.insert(session_id.clone(), Arc::new(Mutex::new(session)));
        drop(reservation);

        info!("Registered session {} ({} active)", session_id, sessions.len());

        Ok(session_id)
    }

    async fn reserve(&self, session_id: &str) -> VaultResult<Reservation> {
        let sessions = self.sessions.read().await;
        let mut starting = self.starting.lock().unwrap_or_else(|e| e.into_inner());

        if sessions.contains_key(session_id) || !starting.insert(session_id.to_string()) {
            return Err(VaultError::SessionConflict(session_id.to_string()));
        }

        Ok(Reservation {
            starting: Arc::clone(&self.starting),
            session_id: session_id.to_string(),
        })
    }

    /// Stop a session, unregister it and return its samples
    pub async fn stop(&self, session_id: &str) -> VaultResult<SampleBuffer> {
        let session = {
            let mut sessions = self.sessions.write().await;
            sessions.remove(session_id)
        }
        .ok_or_else(|| VaultError::SessionNotFound(session_id.to_string()))?;

        let mut session = session.lock().await;
        session.stop().await
    }

    pub async fn stats(&self, session_id: &str) -> VaultResult<SessionStats> {
        let session = {
            let sessions = self.sessions.read().await;
            sessions.get(session_id).cloned()
        }
        .ok_or_else(|| VaultError::SessionNotFound(session_id.to_string()))?;

        let session = session.lock().await;
        Ok(session.stats())
    }

    pub async fn active_ids(&self) -> Vec<String> {
        let sessions = self.sessions.read().await;
        let mut ids: Vec<String> = sessions.keys().cloned().collect();
        ids.sort();
        ids
    }
}

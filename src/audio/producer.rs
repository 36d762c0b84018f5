use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

/// A capture producer running on its own OS thread
///
/// The thread polls a shared stop flag. Its exit (normal or panic) drops the
/// exit sender, which is how `halt` observes it without blocking the runtime.
pub struct ProducerThread {
    name: String,
    stop_flag: Arc<AtomicBool>,
    exited: Option<oneshot::Receiver<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ProducerThread {
    pub fn spawn<F>(name: impl Into<String>, body: F) -> Result<Self>
    where
        F: FnOnce(Arc<AtomicBool>) + Send + 'static,
    {
        let name = name.into();
        let stop_flag = Arc::new(AtomicBool::new(false));
        let (exit_tx, exit_rx) = oneshot::channel::<()>();

        let flag = Arc::clone(&stop_flag);
        let handle = std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let _exit = exit_tx;
                body(flag);
            })
            .with_context(|| format!("Failed to spawn producer thread {}", name))?;

        info!("Producer thread {} started", name);

        Ok(Self {
            name,
            stop_flag,
            exited: Some(exit_rx),
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Signal the producer and wait up to `grace` for it to exit.
    ///
    /// Returns `true` when the thread exited within the grace period.
    pub async fn halt(&mut self, grace: Duration) -> bool {
        self.stop_flag.store(true, Ordering::SeqCst);

        let Some(exited) = self.exited.take() else {
            return true;
        };

        // Err means the sender was dropped, i.e. the thread finished
        if tokio::time::timeout(grace, exited).await.is_err() {
            warn!(
                "Producer thread {} still running after {:?}; detaching",
                self.name, grace
            );
            self.handle.take();
            return false;
        }

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Producer thread {} panicked", self.name);
            }
        }

        info!("Producer thread {} exited", self.name);
        true
    }
}

impl Drop for ProducerThread {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }
}

//! Cancellable backend requests.

use std::future::Future;

use parking_lot::Mutex;
use tokio::task::AbortHandle;
use tracing::debug;

use super::PluginError;

/// Tracks the one backend request a plugin has in flight.
///
/// Each request runs as its own tokio task. Starting a new request aborts the
/// previous one, and [`InFlight::cancel`] aborts whatever is running.
#[derive(Debug, Default)]
pub struct InFlight {
    current: Mutex<Option<AbortHandle>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `request` to completion unless it is aborted first.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Cancelled`] if the request was aborted, or the
    /// request's own error.
    pub async fn run<F, T>(&self, request: F) -> Result<T, PluginError>
    where
        F: Future<Output = Result<T, PluginError>> + Send + 'static,
        T: Send + 'static,
    {
        let task = tokio::spawn(request);
        if let Some(previous) = self.current.lock().replace(task.abort_handle()) {
            debug!("aborting previous request");
            previous.abort();
        }

        match task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(PluginError::Cancelled),
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        }
    }

    /// Aborts the running request, if any. Returns true if one was aborted.
    pub fn cancel(&self) -> bool {
        match self.current.lock().take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }
}

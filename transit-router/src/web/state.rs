//! Application state for the web layer.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::domain::Query;
use crate::router::{CancelHandle, Router, RouterServices};

/// Shared application state.
///
/// The server runs a single query session, created on the first plan
/// request and reused afterwards.
#[derive(Clone)]
pub struct AppState {
    services: RouterServices,

    /// The session; held for the whole duration of a fetch
    session: Arc<tokio::sync::Mutex<Option<Router>>>,

    /// Reaches the session's active plugin while a fetch holds the session
    cancel: Arc<Mutex<Option<CancelHandle>>>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(services: RouterServices) -> Self {
        Self {
            services,
            session: Arc::default(),
            cancel: Arc::default(),
        }
    }

    pub(super) fn session(&self) -> &tokio::sync::Mutex<Option<Router>> {
        &self.session
    }

    /// Creates the session router for a first query.
    pub(super) fn new_router(&self, query: Query) -> Router {
        let router = Router::new(self.services.clone(), query);
        *self.cancel.lock() = Some(router.cancel_handle());
        router
    }

    /// Cancels the session's request in flight. Returns false if there is
    /// no session or no provider was selected yet.
    pub(super) fn cancel(&self) -> bool {
        let handle = self.cancel.lock().clone();
        handle.is_some_and(|h| h.cancel())
    }
}

//! Application state shared across handlers.

use std::sync::Arc;

use crate::db::NonogramRepository;
use crate::services::RelayDelivery;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. The gateway worker holds the
/// same collaborators through its own `ReviewWorkflow`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    repository: Arc<dyn NonogramRepository>,
    delivery: Arc<dyn RelayDelivery>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(repository: Arc<dyn NonogramRepository>, delivery: Arc<dyn RelayDelivery>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                repository,
                delivery,
            }),
        }
    }

    /// Get the Nonogram store.
    #[must_use]
    pub fn repository(&self) -> &dyn NonogramRepository {
        self.inner.repository.as_ref()
    }

    /// Get the relay delivery strategy.
    #[must_use]
    pub fn delivery(&self) -> &dyn RelayDelivery {
        self.inner.delivery.as_ref()
    }
}

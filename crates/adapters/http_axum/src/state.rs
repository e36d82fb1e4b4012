//! Shared application state for axum handlers.

use std::sync::Arc;

use castkeep_app::controller::CastController;
use castkeep_app::ports::{CastTransport, StateStore};
use castkeep_app::settings::RuntimeSettings;

/// Application state shared across all axum handlers.
///
/// Generic over the transport and state-store types to avoid dynamic
/// dispatch. `Clone` is implemented manually so the underlying types
/// themselves do not need to be `Clone` — only the `Arc` wrappers are
/// cloned.
pub struct AppState<T, S> {
    /// The casting state machine, for diagnostic snapshots.
    pub controller: Arc<CastController<T, S>>,
    /// Runtime-mutable global settings.
    pub settings: Arc<RuntimeSettings>,
}

impl<T, S> Clone for AppState<T, S> {
    fn clone(&self) -> Self {
        Self {
            controller: Arc::clone(&self.controller),
            settings: Arc::clone(&self.settings),
        }
    }
}

impl<T, S> AppState<T, S>
where
    T: CastTransport + Clone + Send + Sync + 'static,
    S: StateStore + Send + Sync + 'static,
{
    /// Create a new application state from pre-wrapped `Arc` handles.
    ///
    /// The controller and settings are shared with the scheduler, so they
    /// arrive here already wrapped.
    pub fn new(controller: Arc<CastController<T, S>>, settings: Arc<RuntimeSettings>) -> Self {
        Self {
            controller,
            settings,
        }
    }
}

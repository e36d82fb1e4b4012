//! JSON REST API route assembly.

pub mod devices;
pub mod settings;

use axum::Router;
use axum::routing::get;

use castkeep_app::ports::{CastTransport, StateStore};

use crate::state::AppState;

/// All `/api` routes.
pub fn routes<T, S>() -> Router<AppState<T, S>>
where
    T: CastTransport + Clone + Send + Sync + 'static,
    S: StateStore + Send + Sync + 'static,
{
    Router::new()
        .route("/devices", get(devices::list))
        .route("/devices/{name}", get(devices::get))
        .route(
            "/settings",
            get(settings::get).put(settings::update),
        )
}

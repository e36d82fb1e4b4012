//! JSON REST handlers for device diagnostics.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use castkeep_app::diagnostics::DeviceReport;
use castkeep_app::ports::{CastTransport, StateStore};

use crate::state::AppState;

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<DeviceReport>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<DeviceReport>),
    NotFound,
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
            Self::NotFound => StatusCode::NOT_FOUND.into_response(),
        }
    }
}

/// `GET /api/devices`
pub async fn list<T, S>(State(state): State<AppState<T, S>>) -> ListResponse
where
    T: CastTransport + Clone + Send + Sync + 'static,
    S: StateStore + Send + Sync + 'static,
{
    let reports = state.controller.snapshot().await;
    ListResponse::Ok(Json(reports))
}

/// `GET /api/devices/{name}`
pub async fn get<T, S>(
    State(state): State<AppState<T, S>>,
    Path(name): Path<String>,
) -> GetResponse
where
    T: CastTransport + Clone + Send + Sync + 'static,
    S: StateStore + Send + Sync + 'static,
{
    match state.controller.device_report(&name).await {
        Some(report) => GetResponse::Ok(Json(report)),
        None => GetResponse::NotFound,
    }
}

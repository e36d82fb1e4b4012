//! JSON REST handlers for the runtime-mutable global settings.

use std::time::Duration;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use castkeep_app::ports::{CastTransport, StateStore};
use castkeep_domain::error::ValidationError;
use castkeep_domain::gate::EntityGate;
use castkeep_domain::time::{TimeWindow, parse_hhmm};

use crate::error::ApiError;
use crate::state::AppState;

/// Current settings as exposed over the API.
#[derive(Debug, Serialize, Deserialize)]
pub struct SettingsResponse {
    pub cast_interval_secs: u64,
    /// Global window start, `HH:MM`.
    pub global_start: String,
    /// Global window end, `HH:MM`.
    pub global_end: String,
    pub gate_entity: Option<String>,
    pub gate_state: Option<String>,
}

/// Partial update of the settings. Omitted fields are left unchanged;
/// an empty `gate_entity` removes the global gate entity.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateSettingsRequest {
    pub cast_interval_secs: Option<u64>,
    pub global_start: Option<String>,
    pub global_end: Option<String>,
    pub gate_entity: Option<String>,
    pub gate_state: Option<String>,
}

/// `GET /api/settings`
pub async fn get<T, S>(State(state): State<AppState<T, S>>) -> Json<SettingsResponse>
where
    T: CastTransport + Clone + Send + Sync + 'static,
    S: StateStore + Send + Sync + 'static,
{
    Json(render(&state))
}

/// `PUT /api/settings`
pub async fn update<T, S>(
    State(state): State<AppState<T, S>>,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<SettingsResponse>, ApiError>
where
    T: CastTransport + Clone + Send + Sync + 'static,
    S: StateStore + Send + Sync + 'static,
{
    if let Some(seconds) = request.cast_interval_secs {
        if seconds == 0 {
            return Err(ValidationError::ZeroInterval.into());
        }
        state.settings.set_cast_interval(Duration::from_secs(seconds));
        tracing::info!(seconds, "cast interval updated");
    }

    if request.global_start.is_some() || request.global_end.is_some() {
        let current = state.settings.global_gate().window;
        let start = match &request.global_start {
            Some(value) => parse_hhmm(value).map_err(ApiError::from)?,
            None => current.start,
        };
        let end = match &request.global_end {
            Some(value) => parse_hhmm(value).map_err(ApiError::from)?,
            None => current.end,
        };
        let window = TimeWindow::new(start, end);
        state.settings.set_global_window(window);
        tracing::info!(%window, "global casting window updated");
    }

    if let Some(entity_id) = &request.gate_entity {
        if entity_id.is_empty() {
            state.settings.set_global_gate_entity(None);
            tracing::info!("global gate entity removed");
        } else {
            let required = request.gate_state.as_deref().unwrap_or("on");
            let gate = EntityGate::new(entity_id, required).map_err(ApiError::from)?;
            tracing::info!(entity = %entity_id, state = required, "global gate entity updated");
            state.settings.set_global_gate_entity(Some(gate));
        }
    }

    Ok(Json(render(&state)))
}

fn render<T, S>(state: &AppState<T, S>) -> SettingsResponse {
    let settings = state.settings.snapshot();
    let gate = settings.global_gate.gate;
    SettingsResponse {
        cast_interval_secs: settings.cast_interval.as_secs(),
        global_start: settings.global_gate.window.start.format("%H:%M").to_string(),
        global_end: settings.global_gate.window.end.format("%H:%M").to_string(),
        gate_entity: gate.as_ref().map(|g| g.entity_id.clone()),
        gate_state: gate.map(|g| g.required_state),
    }
}

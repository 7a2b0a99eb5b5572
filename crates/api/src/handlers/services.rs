//! Handlers for supervised background services.

use std::collections::BTreeMap;
use std::path::PathBuf;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use panrig_core::registry::StopOutcome;
use panrig_core::types::{Pid, Timestamp};
use serde::Serialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// One catalog entry, with its running instance if any.
#[derive(Debug, Serialize)]
pub struct ServiceView {
    pub name: String,
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<PathBuf>,
    pub pid: Option<Pid>,
    pub started_at: Option<Timestamp>,
}

/// Result of launching or stopping one service.
#[derive(Debug, Serialize)]
pub struct ServicePid {
    pub name: String,
    pub pid: Pid,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /services
///
/// The catalog joined with what is currently running.
pub async fn list_services(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ServiceView>>>> {
    let mut running: BTreeMap<_, _> = state
        .registry
        .list()
        .await
        .into_iter()
        .map(|s| (s.name.clone(), s))
        .collect();

    let mut views: Vec<ServiceView> = state
        .catalog
        .iter()
        .map(|(name, spec)| {
            let live = running.remove(name);
            ServiceView {
                name: name.to_string(),
                command: spec.command.to_string(),
                working_directory: spec.working_directory.clone(),
                pid: live.as_ref().map(|s| s.pid),
                started_at: live.map(|s| s.started_at),
            }
        })
        .collect();

    // Tracked names no longer in the catalog still show up.
    views.extend(running.into_values().map(|s| ServiceView {
        name: s.name,
        command: String::new(),
        working_directory: None,
        pid: Some(s.pid),
        started_at: Some(s.started_at),
    }));

    Ok(Json(DataResponse { data: views }))
}

/// GET /services/status
///
/// Flat `{name: pid}` map of tracked services.
pub async fn service_status(State(state): State<AppState>) -> Json<BTreeMap<String, Pid>> {
    Json(state.registry.status_snapshot().await)
}

/// POST /services/{name}/launch
///
/// Terminate any running instance, then start a new one.
pub async fn launch_service(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<(StatusCode, Json<DataResponse<ServicePid>>)> {
    let pid = state.catalog.launch(&state.registry, &name).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: ServicePid { name, pid },
        }),
    ))
}

/// POST /services/{name}/stop
pub async fn stop_service(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<DataResponse<ServicePid>>> {
    let pid = state.registry.stop(&name).await?;
    Ok(Json(DataResponse {
        data: ServicePid { name, pid },
    }))
}

/// POST /services/stop-all
///
/// Always 200; per-name failures are reported in the body.
pub async fn stop_all_services(
    State(state): State<AppState>,
) -> Json<DataResponse<BTreeMap<String, StopOutcome>>> {
    Json(DataResponse {
        data: state.registry.stop_all().await,
    })
}

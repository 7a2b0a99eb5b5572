//! Route definitions for supervised background services.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::services;
use crate::state::AppState;

/// Routes mounted at `/services`.
///
/// ```text
/// GET  /                 -> list_services
/// GET  /status           -> service_status
/// POST /stop-all         -> stop_all_services
/// POST /{name}/launch    -> launch_service
/// POST /{name}/stop      -> stop_service
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(services::list_services))
        .route("/status", get(services::service_status))
        .route("/stop-all", post(services::stop_all_services))
        .route("/{name}/launch", post(services::launch_service))
        .route("/{name}/stop", post(services::stop_service))
}

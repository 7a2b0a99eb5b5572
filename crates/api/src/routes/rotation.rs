//! Route definitions for camera pan control.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::rotation;
use crate::state::AppState;

/// Routes mounted at `/rotation`.
///
/// ```text
/// POST /move        -> move_camera
/// POST /reset       -> reset_camera
/// GET  /positions   -> get_positions
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/move", post(rotation::move_camera))
        .route("/reset", post(rotation::reset_camera))
        .route("/positions", get(rotation::get_positions))
}

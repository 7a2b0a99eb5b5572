//! Handlers for camera pan control.
//!
//! Moves and resets answer with the freshly captured JPEG for the moved
//! camera. The move itself runs detached from the request.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use panrig_core::position::ServoConfig;
use panrig_core::types::Degrees;
use serde::Deserialize;

use super::run_detached;
use crate::error::AppResult;
use crate::response::{DataResponse, JpegImage};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Body of `POST /rotation/move`.
#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub camera_id: i64,
    pub step_size: Degrees,
    pub direction: String,
}

/// Body of `POST /rotation/reset`.
#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub camera_id: i64,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /rotation/move
pub async fn move_camera(
    State(state): State<AppState>,
    payload: Result<Json<MoveRequest>, JsonRejection>,
) -> AppResult<JpegImage> {
    let Json(input) = payload?;
    let positions = Arc::clone(&state.positions);

    let outcome = run_detached(async move {
        positions
            .move_camera(input.camera_id, input.step_size, &input.direction)
            .await
    })
    .await?;

    Ok(JpegImage {
        bytes: outcome.image.bytes,
        position: outcome.position,
    })
}

/// POST /rotation/reset
pub async fn reset_camera(
    State(state): State<AppState>,
    payload: Result<Json<ResetRequest>, JsonRejection>,
) -> AppResult<JpegImage> {
    let Json(input) = payload?;
    let positions = Arc::clone(&state.positions);

    let outcome = run_detached(async move { positions.reset_camera(input.camera_id).await }).await?;

    Ok(JpegImage {
        bytes: outcome.image.bytes,
        position: outcome.position,
    })
}

/// GET /rotation/positions
pub async fn get_positions(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<ServoConfig>>> {
    let config = state.positions.positions().await?;
    Ok(Json(DataResponse { data: config }))
}

//! Handlers for one-shot calibration jobs.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use panrig_core::calibration::{CalibrationJob, JobReport};

use super::run_detached;
use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

async fn run_job(state: &AppState, job: CalibrationJob) -> AppResult<Json<DataResponse<JobReport>>> {
    let runner = Arc::clone(&state.calibration);
    let report = run_detached(async move { runner.run(job).await }).await?;
    Ok(Json(DataResponse { data: report }))
}

/// POST /calibration/capture
pub async fn capture_images(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<JobReport>>> {
    run_job(&state, CalibrationJob::CaptureImages).await
}

/// POST /calibration/calibrate
pub async fn run_calibration(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<JobReport>>> {
    run_job(&state, CalibrationJob::Calibrate).await
}

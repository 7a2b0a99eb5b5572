use axum::routing::post;
use axum::Router;

use crate::handlers::calibration;
use crate::state::AppState;

/// Routes mounted at `/calibration`.
///
/// ```text
/// POST /capture     -> capture_images
/// POST /calibrate   -> run_calibration
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/capture", post(calibration::capture_images))
        .route("/calibrate", post(calibration::run_calibration))
}

pub mod calibration;
pub mod health;
pub mod home;
pub mod rotation;
pub mod services;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /rotation/move                      move one camera by a step (POST)
/// /rotation/reset                     move one camera to 0 (POST)
/// /rotation/positions                 persisted positions (GET)
///
/// /services                           launchable catalog (GET)
/// /services/status                    running services, name -> pid (GET)
/// /services/stop-all                  stop every running service (POST)
/// /services/{name}/launch             replace and start (POST)
/// /services/{name}/stop               stop one (POST)
///
/// /calibration/capture                capture calibration images (POST)
/// /calibration/calibrate              run stereo calibration (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/rotation", rotation::router())
        .nest("/services", services::router())
        .nest("/calibration", calibration::router())
}

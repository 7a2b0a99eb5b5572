use axum::routing::get;
use axum::Router;

use crate::handlers::home;
use crate::state::AppState;

/// Root-level welcome page.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(home::welcome))
}

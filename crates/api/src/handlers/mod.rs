pub mod calibration;
pub mod home;
pub mod rotation;
pub mod services;

use std::future::Future;

use crate::error::{AppError, AppResult};

/// Run `work` on its own task and wait for it.
///
/// The work keeps going if the request future is dropped (client gone,
/// request timeout), so external programs are never abandoned halfway.
pub(crate) async fn run_detached<F, T, E>(work: F) -> AppResult<T>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Into<AppError> + Send + 'static,
{
    tokio::spawn(work)
        .await
        .map_err(|e| AppError::InternalError(format!("background task failed: {e}")))?
        .map_err(Into::into)
}

//! Tests for `AppError` → HTTP response mapping.
//!
//! These tests verify that each `AppError` variant produces the correct HTTP
//! status code, error code, and message. They do NOT need an HTTP server --
//! they call `IntoResponse` directly on `AppError` values.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use panrig_api::error::AppError;
use panrig_core::error::CoreError;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::NotFound {
        entity: "service",
        key: "test3".to_string(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "service 'test3' not found");
}

#[tokio::test]
async fn validation_error_returns_400() {
    let err = AppError::Core(CoreError::Validation("Invalid direction: \"up\"".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "Invalid direction: \"up\"");
}

#[tokio::test]
async fn supervision_error_returns_409() {
    let err = AppError::Core(CoreError::Supervision {
        name: "test1".into(),
        reason: "Operation not permitted".into(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "SUPERVISION_ERROR");
    assert_eq!(
        json["error"],
        "Service 'test1' already running, cannot restart: Operation not permitted"
    );
}

#[tokio::test]
async fn hardware_errors_return_502() {
    for (err, code) in [
        (
            CoreError::Actuation {
                camera: 1,
                reason: "exit 1".into(),
            },
            "ACTUATION_ERROR",
        ),
        (
            CoreError::Capture {
                camera: 2,
                reason: "exit 1".into(),
            },
            "CAPTURE_ERROR",
        ),
    ] {
        let (status, json) = error_to_response(AppError::Core(err)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["code"], code);
    }
}

#[tokio::test]
async fn persistence_error_returns_500_with_code() {
    let err = AppError::Core(CoreError::Persistence("disk full".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "PERSISTENCE_ERROR");
    assert_eq!(json["error"], "Persistence failed: disk full");
}

#[tokio::test]
async fn internal_error_returns_500_and_sanitizes_message() {
    let err = AppError::InternalError("background task panicked at src/foo.rs".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

#[tokio::test]
async fn core_internal_error_is_sanitized() {
    let err = AppError::Core(CoreError::Internal("lock poisoned".into()));

    let (_, json) = error_to_response(err).await;

    assert_eq!(json["error"], "An internal error occurred");
}

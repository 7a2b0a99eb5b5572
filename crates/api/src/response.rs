//! Shared response envelope types for API handlers.
//!
//! JSON responses use a `{ "data": ... }` envelope. The flat service status
//! map and the image responses of the rotation endpoints are the exceptions.

use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderName;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Header carrying the camera's new angle alongside an image body.
pub const CAMERA_POSITION_HEADER: HeaderName = HeaderName::from_static("x-camera-position");

/// JPEG body returned after a camera move.
#[derive(Debug)]
pub struct JpegImage {
    pub bytes: Vec<u8>,
    pub position: i32,
}

impl IntoResponse for JpegImage {
    fn into_response(self) -> Response {
        (
            [
                (CONTENT_TYPE, "image/jpeg".to_string()),
                (CAMERA_POSITION_HEADER, self.position.to_string()),
            ],
            self.bytes,
        )
            .into_response()
    }
}

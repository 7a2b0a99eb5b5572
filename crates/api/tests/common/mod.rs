#![allow(dead_code)]

use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use panrig_api::config::ServerConfig;
use panrig_api::router::build_app_router;
use panrig_api::state::AppState;
use panrig_core::scripting::command::CommandLine;

/// Actuator that appends its arguments to `rotate.log`.
pub const LOGGING_ACTUATOR: &str = "echo \"$@\" >> \"$(dirname \"$0\")/rotate.log\"\n";

/// Capture script that writes a distinct fake JPEG per camera.
pub const FAKE_CAPTURE: &str = "mkdir -p \"$2/cam1\" \"$2/cam2\"\n\
printf 'jpeg-cam1' > \"$2/cam1/$4\"\n\
printf 'jpeg-cam2' > \"$2/cam2/$4\"\n";

/// Initial servo record: cam1 at 75 on pin 12, cam2 at 0 on pin 13.
pub const INITIAL_SERVO: &str = r#"{
  "cam1": { "pin": 12, "current_position": 75 },
  "cam2": { "pin": 13, "current_position": 0 }
}"#;

/// Scratch directory holding fake programs, the servo file, and the
/// service catalog for one test.
pub struct TestRig {
    pub dir: TempDir,
    pub config: ServerConfig,
}

impl TestRig {
    /// Rig with a working actuator and capture program.
    pub fn new() -> Self {
        Self::with_scripts(LOGGING_ACTUATOR, FAKE_CAPTURE)
    }

    pub fn with_scripts(actuator: &str, capture: &str) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();

        let servo_config_path = root.join("servo_config.json");
        std::fs::write(&servo_config_path, INITIAL_SERVO).expect("seed servo config");

        let services_file = root.join("services.json");
        std::fs::write(
            &services_file,
            r#"{
                "sleeper": { "program": "sleep", "args": ["30"] },
                "napper": { "program": "sleep", "args": ["30"] },
                "ghost": { "program": "/nonexistent/ghost" }
            }"#,
        )
        .expect("write services");

        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["http://localhost:5173".to_string()],
            request_timeout_secs: 30,
            servo_config_path,
            actuator_program: bash_script(root, "rotate.sh", actuator),
            capture_command: bash_script(root, "take_picture.sh", capture),
            rotation_image_dir: root.join("rotation_images"),
            rotation_image_file: "rotation.jpeg".to_string(),
            step_timeout_secs: Some(10),
            services_file: Some(services_file),
            calibration_capture_command: bash_script(
                root,
                "capture_calibration.sh",
                "echo captured 12 pairs\n",
            ),
            calibration_command: bash_script(
                root,
                "stereo_calibration.sh",
                "echo reprojection error too high >&2\nexit 1\n",
            ),
            calibration_timeout_secs: Some(10),
        };

        Self { dir, config }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Build the full router and keep a handle on its state.
    pub fn app(&self) -> (Router, AppState) {
        let state = AppState::from_config(self.config.clone()).expect("state");
        (build_app_router(state.clone()), state)
    }

    /// Current contents of the servo file.
    pub fn servo(&self) -> serde_json::Value {
        let raw = std::fs::read_to_string(&self.config.servo_config_path).expect("read servo");
        serde_json::from_str(&raw).expect("parse servo")
    }

    /// Lines the logging actuator recorded, one per call.
    pub fn rotate_calls(&self) -> Vec<String> {
        std::fs::read_to_string(self.path("rotate.log"))
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

/// Write `body` to `dir/name` and run it through `bash`.
pub fn bash_script(dir: &Path, name: &str, body: &str) -> CommandLine {
    let path = dir.join(name);
    std::fs::write(&path, body).expect("write script");
    CommandLine::new("bash").arg(path.to_string_lossy())
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    post_raw(app, uri, &body.to_string()).await
}

pub async fn post_raw(app: Router, uri: &str, body: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

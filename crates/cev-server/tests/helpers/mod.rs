//! Test helpers for CEV server integration tests
//!
//! - A migrated SQLite database in a temporary directory
//! - The full application router over that database
//! - Multipart upload request builders and response readers

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use cev_server::{
    api::{self, AppState},
    config::Config,
    db::{self, DatasetStore, RetentionPolicy},
    features::shared::principal::{USERNAME_HEADER, USER_ID_HEADER},
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "cev-test-boundary";

pub const TEST_USER_ID: &str = "u-1";
pub const TEST_USERNAME: &str = "alice";

/// The three-row example used throughout the tests.
pub const SAMPLE_CSV: &str = "\
Equipment Name,Type,Flowrate,Pressure,Temperature
A,Pump,10.0,2.0,25.0
B,Valve,20.0,4.0,30.0
C,Pump,30.0,6.0,35.0
";

/// An application over a fresh database. The directory lives as long as the app.
pub struct TestApp {
    _dir: TempDir,
    pub store: DatasetStore,
    pub router: Router,
    pub config: Config,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(configure: impl FnOnce(&mut Config)) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");

        let mut config = Config::default();
        config.database.url = format!("sqlite://{}", dir.path().join("cev-test.db").display());
        config.database.max_connections = 8;
        configure(&mut config);

        let pool = db::create_pool(&config.database)
            .await
            .expect("Failed to create test pool");
        db::run_migrations(&pool).await.expect("Failed to run migrations");

        let retention = RetentionPolicy::from_limit(config.datasets.retention_limit)
            .expect("retention limit must be non-zero");
        let store = DatasetStore::new(pool, retention);
        let router = api::create_router(AppState { store: store.clone() }, &config);

        Self {
            _dir: dir,
            store,
            router,
            config,
        }
    }

    /// Send a request and return status, headers and raw body.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");

        (status, headers, body.to_vec())
    }

    /// Send a request and parse the body as JSON.
    pub async fn send_json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, _, body) = self.send(request).await;
        let json = serde_json::from_slice(&body).expect("Response body is not JSON");
        (status, json)
    }

    /// Upload `content` as `file_name` and return the parsed response.
    pub async fn upload(&self, file_name: &str, content: &str) -> (StatusCode, Value) {
        self.send_json(upload_request(file_name, content.as_bytes())).await
    }

    /// Upload a file that must succeed and return the new dataset id.
    pub async fn upload_ok(&self, file_name: &str) -> i64 {
        let (status, body) = self.upload(file_name, SAMPLE_CSV).await;
        assert_eq!(status, StatusCode::CREATED, "upload failed: {body}");
        body["data"]["id"].as_i64().expect("dataset id")
    }
}

/// Multipart body with a single `file` field.
pub fn multipart_body(file_name: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: text/csv\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// An authenticated upload request.
pub fn upload_request(file_name: &str, content: &[u8]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/datasets/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(USER_ID_HEADER, TEST_USER_ID)
        .header(USERNAME_HEADER, TEST_USERNAME)
        .body(Body::from(multipart_body(file_name, content)))
        .unwrap()
}

/// An authenticated request without a body.
pub fn authed(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(USER_ID_HEADER, TEST_USER_ID)
        .header(USERNAME_HEADER, TEST_USERNAME)
        .body(Body::empty())
        .unwrap()
}

/// A request with no principal headers.
pub fn anonymous(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

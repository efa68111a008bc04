//! Depot API Integration Tests
//!
//! Runs the real router on an ephemeral port and drives it over HTTP.

use chrono::{Local, NaiveDateTime, Timelike};
use depot_server::{routes, AppState, Config};
use reqwest::{multipart, StatusCode};
use serde_json::{json, Value};
use std::path::PathBuf;
use tempfile::TempDir;
use tokio::net::TcpListener;

const PNG_BYTES: [u8; 16] = [
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
];

struct TestApp {
    base_url: String,
    client: reqwest::Client,
    log_dir: PathBuf,
    upload_dir: PathBuf,
    _tmp: TempDir,
}

impl TestApp {
    async fn spawn() -> Self {
        let defaults = Config::from_lookup(|_| None).unwrap();
        Self::spawn_with_limit(defaults.max_upload_bytes).await
    }

    async fn spawn_with_limit(max_upload_bytes: usize) -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let upload_dir = tmp.path().join("uploaded_images");
        let log_dir = tmp.path().join("logs");

        let config = Config {
            upload_dir: upload_dir.clone(),
            log_dir: log_dir.clone(),
            max_upload_bytes,
            ..Config::from_lookup(|_| None).unwrap()
        };
        config.ensure_directories().await.unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = routes::create_router(AppState::new(config));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            client: reqwest::Client::new(),
            log_dir,
            upload_dir,
            _tmp: tmp,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> reqwest::Response {
        let part = multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = multipart::Form::new().part("file", part);
        self.client
            .post(self.url("/upload/"))
            .multipart(form)
            .send()
            .await
            .unwrap()
    }

    async fn log(&self, channel: i64, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/log/{}/", channel)))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn last_record(&self, channel: i64) -> reqwest::Response {
        self.client
            .get(self.url(&format!("/last_record/{}", channel)))
            .send()
            .await
            .unwrap()
    }
}

// ============================================
// Images
// ============================================

#[tokio::test]
async fn test_upload_then_get_returns_identical_bytes() {
    let app = TestApp::spawn().await;

    let response = app.upload("a.png", PNG_BYTES.to_vec()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"filename": "a.png"}));

    let response = app.client.get(app.url("/get/a.png")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/png");
    assert_eq!(response.headers()["content-length"], "16");
    assert_eq!(response.bytes().await.unwrap().as_ref(), &PNG_BYTES[..]);

    assert!(app.upload_dir.join("a.png").is_file());
}

#[tokio::test]
async fn test_upload_overwrites_same_filename() {
    let app = TestApp::spawn().await;

    app.upload("photo.jpg", b"first".to_vec()).await;
    app.upload("photo.jpg", b"second upload".to_vec()).await;

    let response = app.client.get(app.url("/get/photo.jpg")).send().await.unwrap();
    assert_eq!(response.headers()["content-type"], "image/jpeg");
    assert_eq!(response.bytes().await.unwrap().as_ref(), b"second upload");
}

#[tokio::test]
async fn test_get_streams_large_image() {
    let app = TestApp::spawn().await;
    let big: Vec<u8> = (0..3_000_000u32).map(|i| (i % 253) as u8).collect();
    std::fs::write(app.upload_dir.join("big.tiff"), &big).unwrap();

    let response = app.client.get(app.url("/get/big.tiff")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/tiff");
    assert_eq!(response.content_length(), Some(big.len() as u64));
    assert_eq!(response.bytes().await.unwrap().as_ref(), &big[..]);
}

#[tokio::test]
async fn test_upload_over_limit_is_413() {
    let app = TestApp::spawn_with_limit(1024).await;

    let response = app.upload("huge.png", vec![0u8; 10 * 1024]).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "PAYLOAD_TOO_LARGE");
    assert_eq!(body["code"], 413);

    let leftovers = std::fs::read_dir(&app.upload_dir).unwrap().count();
    assert_eq!(leftovers, 0);

    let stats: Value = app
        .client
        .get(app.url("/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["uploads_total"], 0);
    assert_eq!(stats["uploads_in_flight"], 0);
}

#[tokio::test]
async fn test_get_missing_image_is_404() {
    let app = TestApp::spawn().await;

    let response = app.client.get(app.url("/get/missing.png")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], 404);
}

#[tokio::test]
async fn test_upload_rejects_path_traversal() {
    let app = TestApp::spawn().await;

    let response = app.upload("../escape.png", PNG_BYTES.to_vec()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(!app.upload_dir.parent().unwrap().join("escape.png").exists());

    let response = app.upload(".hidden", PNG_BYTES.to_vec()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_rejects_encoded_traversal() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/get/..%2Flogs%2Flogs_1.txt"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_without_file_field_is_400() {
    let app = TestApp::spawn().await;

    let form = multipart::Form::new().text("note", "no file here");
    let response = app
        .client
        .post(app.url("/upload/"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Invalid request: Missing multipart field 'file'");
}

// ============================================
// Channel log
// ============================================

#[tokio::test]
async fn test_log_then_last_record() {
    let app = TestApp::spawn().await;

    let before = Local::now().naive_local().with_nanosecond(0).unwrap();
    let response = app.log(7, json!({"temp": 21.5})).await;
    let after = Local::now().naive_local();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"message": "Log entry added successfully."}));

    let response = app.last_record(7).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"], "{'temp': 21.5}");

    let timestamp: NaiveDateTime = serde_json::from_value(body["timestamp"].clone()).unwrap();
    assert!(timestamp >= before && timestamp <= after);
}

#[tokio::test]
async fn test_last_record_for_unknown_channel_is_404() {
    let app = TestApp::spawn().await;

    let response = app.last_record(999).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Log file not found");
}

#[tokio::test]
async fn test_last_record_for_empty_log_is_404() {
    let app = TestApp::spawn().await;
    std::fs::write(app.log_dir.join("logs_12.txt"), "").unwrap();

    let response = app.last_record(12).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "No records found for the specified channel_id");
}

#[tokio::test]
async fn test_last_record_tracks_latest_append() {
    let app = TestApp::spawn().await;

    for (i, status) in ["idle", "heating", "cooling"].iter().enumerate() {
        app.log(3, json!({"status": status, "step": i})).await;
        let lines = std::fs::read_to_string(app.log_dir.join("logs_3.txt"))
            .unwrap()
            .lines()
            .count();
        assert_eq!(lines, i + 1);
    }

    let body: Value = app.last_record(3).await.json().await.unwrap();
    assert_eq!(body["data"], "{'status': 'cooling', 'step': 2}");
}

#[tokio::test]
async fn test_log_accepts_path_without_trailing_slash() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/log/-4"))
        .json(&json!({"ok": true, "missing": null}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = app.last_record(-4).await.json().await.unwrap();
    assert_eq!(body["data"], "{'ok': True, 'missing': None}");
}

#[tokio::test]
async fn test_log_rejects_non_object_body() {
    let app = TestApp::spawn().await;

    let response = app.log(1, json!([1, 2, 3])).await;
    assert!(response.status().is_client_error());
    assert!(!app.log_dir.join("logs_1.txt").exists());
}

#[tokio::test]
async fn test_non_integer_channel_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/last_record/seven"))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_malformed_last_line_is_500() {
    let app = TestApp::spawn().await;
    std::fs::write(app.log_dir.join("logs_8.txt"), "not a record\n").unwrap();

    let response = app.last_record(8).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "MALFORMED_RECORD");
}

// ============================================
// Service endpoints
// ============================================

#[tokio::test]
async fn test_health_ready_and_stats() {
    let app = TestApp::spawn().await;

    let health: Value = app
        .client
        .get(app.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["healthy"], true);
    assert_eq!(health["service_id"], "depot-server");

    let response = app.client.get(app.url("/ready")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    app.upload("s.gif", vec![1, 2, 3]).await;
    app.log(5, json!({"n": 1})).await;
    app.last_record(5).await;
    app.last_record(6).await;

    let stats: Value = app
        .client
        .get(app.url("/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["uploads_total"], 1);
    assert_eq!(stats["upload_bytes_total"], 3);
    assert_eq!(stats["appends_total"], 1);
    assert_eq!(stats["lookups_total"], 2);
    assert_eq!(stats["not_found_total"], 1);
    assert_eq!(stats["append_latency_ms"]["count"], 1);
}

#[tokio::test]
async fn test_cors_preflight_is_permitted() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .request(reqwest::Method::OPTIONS, app.url("/log/1/"))
        .header("Origin", "http://dashboard.example")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://dashboard.example"
    );
}

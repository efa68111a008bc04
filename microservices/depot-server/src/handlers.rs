//! HTTP handlers for the depot API

use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use depot_core::{ChannelId, HealthStatus, ImageName, ReadinessStatus};
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Instant;
use tracing::info;

use crate::channel_log::LogRecord;
use crate::image_store::content_type;
use crate::stats::StatsResponse;
use crate::{AppState, Error, Result};

/// Multipart field carrying the uploaded file
pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ============================================
// Health & Metrics Handlers
// ============================================

pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(state.health())
}

pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadinessStatus>) {
    let status = state.ready().await;
    let code = if status.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.metrics.snapshot(state.uptime_secs()))
}

// ============================================
// Image Handlers
// ============================================

pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .ok_or_else(|| Error::InvalidRequest("Upload field 'file' has no filename".into()))?
            .to_string();
        let name = ImageName::parse(filename)?;

        let _in_flight = state.metrics.track_upload();
        let written = state.images.store(&name, field).await?;

        state.metrics.uploads.inc();
        state.metrics.upload_bytes.add(written);
        info!(filename = %name, bytes = written, "Image uploaded");

        return Ok(Json(UploadResponse {
            filename: name.to_string(),
        }));
    }

    Err(Error::InvalidRequest(format!(
        "Missing multipart field '{}'",
        UPLOAD_FIELD
    )))
}

pub async fn get_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response> {
    let name = ImageName::parse(filename)?;
    let image = state
        .images
        .retrieve(&name)
        .await
        .inspect_err(|e| count_not_found(&state, e))?;

    state.metrics.downloads.inc();
    let headers = [
        (header::CONTENT_TYPE, content_type(&name).to_string()),
        (header::CONTENT_LENGTH, image.len.to_string()),
    ];
    Ok((headers, Body::from_stream(image.into_stream())).into_response())
}

// ============================================
// Channel Log Handlers
// ============================================

pub async fn log_message(
    State(state): State<AppState>,
    Path(channel_id): Path<i64>,
    Json(data): Json<Map<String, Value>>,
) -> Result<Json<MessageResponse>> {
    let channel = ChannelId::new(channel_id);
    let started = Instant::now();

    let record = state.channels.append(channel, &data).await?;

    state
        .metrics
        .append_latency_ms
        .record(started.elapsed().as_secs_f64() * 1000.0);
    state.metrics.appends.inc();
    info!(%channel, timestamp = %record.timestamp, "Log entry added");

    Ok(Json(MessageResponse {
        message: "Log entry added successfully.".to_string(),
    }))
}

pub async fn last_record(
    State(state): State<AppState>,
    Path(channel_id): Path<i64>,
) -> Result<Json<LogRecord>> {
    let channel = ChannelId::new(channel_id);
    state.metrics.lookups.inc();

    let record = state
        .channels
        .last_record(channel)
        .await
        .inspect_err(|e| count_not_found(&state, e))?;

    Ok(Json(record))
}

fn count_not_found(state: &AppState, err: &Error) {
    if err.is_not_found() {
        state.metrics.not_found.inc();
    }
}

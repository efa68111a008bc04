//! Error types for the depot server

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use depot_core::{ChannelId, DepotError};
use serde_json::json;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Depot server error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("File not found: {0}")]
    ImageNotFound(String),

    #[error("Log file not found")]
    LogNotFound(ChannelId),

    #[error("No records found for the specified channel_id")]
    NoRecords(ChannelId),

    #[error("Malformed record in channel {channel}: {reason}")]
    MalformedLogLine {
        channel: ChannelId,
        line: String,
        reason: String,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] DepotError),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::ImageNotFound(_) | Error::LogNotFound(_) | Error::NoRecords(_) => {
                StatusCode::NOT_FOUND
            }
            Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Error::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Error::MalformedLogLine { .. } | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Core(e) => StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Error::ImageNotFound(_) | Error::LogNotFound(_) | Error::NoRecords(_) => "NOT_FOUND",
            Error::MalformedLogLine { .. } => "MALFORMED_RECORD",
            Error::InvalidRequest(_) => "VALIDATION_ERROR",
            Error::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            Error::Io(_) => "STORAGE_ERROR",
            Error::Core(e) => e.error_code(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == StatusCode::NOT_FOUND
    }
}

impl From<MultipartError> for Error {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Error::PayloadTooLarge(err.body_text())
        } else {
            Error::InvalidRequest(err.body_text())
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = if status.is_server_error() {
            match &self {
                Error::MalformedLogLine { channel, line, reason } => {
                    tracing::error!(%channel, line = %line, reason = %reason, "Malformed record in channel log");
                }
                other => tracing::error!("Internal error: {:?}", other),
            }
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "detail": detail,
            "error": self.error_code(),
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}

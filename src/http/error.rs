//! Request failure taxonomy and its JSON rendering.
//!
//! Every expected failure is converted to a structured client response at
//! the point of detection; nothing is silently swallowed. Unexpected
//! faults become a generic 500 rather than crashing the process.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::routing::DecodeError;

/// Failures surfaced to the client.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Malformed path, bad dimensions, or unknown action.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Source host rejected by the allow-list. Deliberately generic:
    /// the client learns nothing about the configured patterns.
    #[error("Host is not allowed")]
    HostNotAllowed,

    /// Source image unreachable or undownloadable.
    #[error("Unable to download the requested image {url}")]
    Fetch { url: String },

    /// No MIME type could be derived from the source URL.
    #[error("Unsupported file type")]
    UnsupportedFileType,

    /// Unreachable branch or gateway fault.
    #[error("Internal server error")]
    Internal(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let ProxyError::Internal(detail) = &self {
            tracing::error!(detail = %detail, "Request failed unexpectedly");
        }
        let body = Json(json!({
            "code": status.as_u16(),
            "result": self.to_string(),
        }));
        (status, body).into_response()
    }
}

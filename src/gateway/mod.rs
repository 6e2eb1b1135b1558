//! Image transform gateway.
//!
//! # Data Flow
//! ```text
//! source URL
//!     → client.rs (fetch raw bytes over HTTP)
//!     → transform.rs (decode, resize/fit/identify, re-encode)
//!     → response body
//! ```
//!
//! # Design Decisions
//! - The dispatcher talks to a trait, not to reqwest or the image
//!   codecs; tests can substitute the whole gateway
//! - Pixel work runs on the blocking pool, never on the request task
//! - Transformed output is re-encoded in the source format

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub mod client;
pub mod transform;

pub use client::ImageClient;

/// Metadata reported by the `identify` operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    /// MIME type of the decoded image (e.g. "image/jpeg").
    pub format: String,
    pub width: u32,
    pub height: u32,
    /// Size of the original encoded payload in bytes.
    pub bytes: usize,
}

/// Errors produced by the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The source image could not be downloaded.
    #[error("download failed for {url}: {reason}")]
    Download { url: String, reason: String },

    /// The payload is not a decodable image.
    #[error("image decode failed: {0}")]
    Decode(String),

    /// Re-encoding the transformed image failed.
    #[error("image encode failed: {0}")]
    Encode(String),

    /// The blocking transform task was cancelled or panicked.
    #[error("transform task failed: {0}")]
    Task(String),
}

/// Fetch and pixel operations used by the request dispatcher.
#[async_trait]
pub trait TransformGateway: Send + Sync {
    /// Download the raw bytes of the source image.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, GatewayError>;

    /// Scale to exactly `width`×`height`, ignoring aspect ratio.
    async fn resize(&self, bytes: Vec<u8>, width: u32, height: u32)
        -> Result<Vec<u8>, GatewayError>;

    /// Scale preserving aspect ratio so the result fits within
    /// `width`×`height`.
    async fn fit(&self, bytes: Vec<u8>, width: u32, height: u32)
        -> Result<Vec<u8>, GatewayError>;

    /// Report format and dimensions without transforming.
    async fn identify(&self, bytes: Vec<u8>) -> Result<ImageInfo, GatewayError>;
}

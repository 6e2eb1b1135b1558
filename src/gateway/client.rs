//! Production gateway: reqwest fetch plus blocking-pool transforms.

use std::time::Duration;

use async_trait::async_trait;

use crate::gateway::{transform, GatewayError, ImageInfo, TransformGateway};

/// Gateway implementation backed by an HTTP client and the local image
/// codecs.
#[derive(Debug, Clone)]
pub struct ImageClient {
    http: reqwest::Client,
}

impl ImageClient {
    /// Build a client with a bounded fetch timeout and a redirect cap.
    /// The origin is not retried; a slow or looping origin fails the
    /// request instead of pinning it.
    pub fn new(fetch_timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .timeout(fetch_timeout)
            .build()?;
        Ok(Self { http })
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, GatewayError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, GatewayError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| GatewayError::Task(e.to_string()))?
}

#[async_trait]
impl TransformGateway for ImageClient {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, GatewayError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| GatewayError::Download {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Download {
                url: url.to_string(),
                reason: format!("origin returned {}", status),
            });
        }

        let bytes = response.bytes().await.map_err(|e| GatewayError::Download {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(bytes.to_vec())
    }

    async fn resize(
        &self,
        bytes: Vec<u8>,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, GatewayError> {
        run_blocking(move || transform::resize(&bytes, width, height)).await
    }

    async fn fit(&self, bytes: Vec<u8>, width: u32, height: u32) -> Result<Vec<u8>, GatewayError> {
        run_blocking(move || transform::fit(&bytes, width, height)).await
    }

    async fn identify(&self, bytes: Vec<u8>) -> Result<ImageInfo, GatewayError> {
        run_blocking(move || transform::identify(&bytes)).await
    }
}

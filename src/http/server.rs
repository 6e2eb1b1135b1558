//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create Axum Router with the transform handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Dispatch requests: method check → path decode → host check →
//!   fetch → content-type resolution → transform → response assembly
//! - Observability (metrics, request IDs)

use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Semaphore};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::gateway::{ImageClient, TransformGateway};
use crate::http::error::ProxyError;
use crate::http::mime;
use crate::observability::metrics;
use crate::routing::{decode_path, Action, TransformRequest};
use crate::security::HostAllowList;

/// One year, in the source's original milliseconds.
const CACHE_ONE_YEAR: &str = "max-age=31557600000";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub allow_list: Arc<HostAllowList>,
    pub gateway: Arc<dyn TransformGateway>,
    /// Bounds concurrent upstream fetch/transform operations
    /// (`imageable.max_listeners`).
    pub upstream_ops: Arc<Semaphore>,
}

/// Error type for server construction.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid whitelist pattern: {0}")]
    Whitelist(#[from] regex::Error),

    #[error("failed to build fetch client: {0}")]
    FetchClient(#[from] reqwest::Error),
}

/// HTTP server for the image proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the production gateway.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let gateway = Arc::new(ImageClient::new(Duration::from_secs(
            config.timeouts.fetch_secs,
        ))?);
        Self::with_gateway(config, gateway)
    }

    /// Create a server with a custom gateway implementation.
    pub fn with_gateway(
        config: ProxyConfig,
        gateway: Arc<dyn TransformGateway>,
    ) -> Result<Self, ServerError> {
        let allow_list = Arc::new(HostAllowList::from_config(&config.imageable.whitelist)?);
        let state = AppState {
            config: Arc::new(config.clone()),
            allow_list,
            gateway,
            upstream_ops: Arc::new(Semaphore::new(config.imageable.max_listeners)),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(image_handler))
            .route("/", any(image_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            platform = %self.config.platform,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Main transform handler. Wraps [`handle_transform`] so that every
/// outcome, including errors, is recorded in the request metrics.
async fn image_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();

    // The action label is only for metrics; decode proper happens (and
    // is validated) in handle_transform.
    let action_label = request
        .uri()
        .path()
        .split('/')
        .nth(3)
        .and_then(|s| Action::from_str(s).ok())
        .map(|action| action.as_str())
        .unwrap_or("unknown");

    let response = match handle_transform(&state, request).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    };

    metrics::record_request(action_label, response.status().as_u16(), start_time);
    response
}

/// The dispatch state machine. Strictly sequential; the first failure
/// terminates the request.
async fn handle_transform(
    state: &AppState,
    request: Request<Body>,
) -> Result<Response, ProxyError> {
    // 1. Method check
    if request.method() != Method::GET {
        return Ok((
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, "GET")],
            "Method Not Allowed",
        )
            .into_response());
    }

    // 2./3. Decode and bounds-check the path
    let platform = state
        .config
        .active_platform()
        .ok_or_else(|| ProxyError::Internal("active platform not configured".to_string()))?;
    let decoded = decode_path(
        request.uri().path(),
        state.config.imageable.image_size_limit,
        &platform.img_url,
    )?;

    // 4. Host check; rejected URLs are never fetched
    if !state.allow_list.is_image_source_allowed(&decoded.source_url) {
        tracing::warn!(url = %decoded.source_url, "Source host rejected by allow-list");
        metrics::record_host_rejection();
        return Err(ProxyError::HostNotAllowed);
    }

    tracing::info!(
        url = %decoded.source_url,
        action = decoded.action.as_str(),
        width = decoded.width,
        height = decoded.height,
        "Transform request"
    );

    // Backpressure: one permit per in-flight upstream operation
    let _permit = state
        .upstream_ops
        .clone()
        .acquire_owned()
        .await
        .expect("Semaphore closed unexpectedly");

    // 5. Fetch the source image
    let bytes = match state.gateway.fetch(&decoded.source_url).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::debug!(url = %decoded.source_url, error = %err, "Origin fetch failed");
            return Err(ProxyError::Fetch {
                url: decoded.source_url,
            });
        }
    };

    // 6. Content-type resolution. Runs after the fetch: a request whose
    // type cannot be resolved still costs the origin round-trip.
    let content_type = mime::content_type_for(&decoded.source_url)
        .ok_or(ProxyError::UnsupportedFileType)?;

    // 7. Transform dispatch
    dispatch_transform(state, decoded, content_type, bytes).await
}

async fn dispatch_transform(
    state: &AppState,
    decoded: TransformRequest,
    content_type: &'static str,
    bytes: Vec<u8>,
) -> Result<Response, ProxyError> {
    let TransformRequest { width, height, action, .. } = decoded;

    match action {
        Action::Resize => {
            let body = state
                .gateway
                .resize(bytes, width, height)
                .await
                .map_err(|e| ProxyError::Internal(e.to_string()))?;
            Ok(transform_response(Some(content_type), body))
        }
        Action::Fit => {
            let body = state
                .gateway
                .fit(bytes, width, height)
                .await
                .map_err(|e| ProxyError::Internal(e.to_string()))?;
            Ok(transform_response(Some(content_type), body))
        }
        // Crop is not implemented in this revision and intentionally
        // falls through to identify.
        Action::Crop | Action::Identify => {
            let info = state
                .gateway
                .identify(bytes)
                .await
                .map_err(|e| ProxyError::Internal(e.to_string()))?;
            let body = serde_json::to_vec(&info)
                .map_err(|e| ProxyError::Internal(e.to_string()))?;
            Ok(transform_response(None, body))
        }
    }
}

/// Assemble a successful transform response. Every success carries the
/// one-year cache header; the content-type header is omitted for
/// identify-style results.
fn transform_response(content_type: Option<&'static str>, body: Vec<u8>) -> Response {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CACHE_CONTROL, CACHE_ONE_YEAR);
    if let Some(ct) = content_type {
        builder = builder.header(header::CONTENT_TYPE, ct);
    }
    // Static status and header values; construction cannot fail.
    builder.body(Body::from(body)).unwrap()
}

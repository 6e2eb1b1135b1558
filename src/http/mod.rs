//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, method check)
//!     → routing::decoder (typed TransformRequest)
//!     → security::allowlist (host gate)
//!     → gateway (fetch + transform)
//!     → server.rs (cache headers, content type)
//!     → Send to client
//! ```

pub mod error;
pub mod mime;
pub mod server;

pub use error::ProxyError;
pub use server::{AppState, HttpServer};

//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration for the image proxy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, connection cap).
    pub listener: ListenerConfig,

    /// Name of the active platform entry in `platforms`.
    pub platform: String,

    /// Per-platform settings, keyed by platform name.
    pub platforms: HashMap<String, PlatformConfig>,

    /// Image transformation limits and host whitelist.
    pub imageable: ImageableConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ProxyConfig {
    /// Settings for the active platform, if configured.
    pub fn active_platform(&self) -> Option<&PlatformConfig> {
        self.platforms.get(&self.platform)
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        let mut platforms = HashMap::new();
        platforms.insert(
            "default".to_string(),
            PlatformConfig {
                img_url: "https://cdn.example.com".to_string(),
            },
        );
        Self {
            listener: ListenerConfig::default(),
            platform: "default".to_string(),
            platforms,
            imageable: ImageableConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Per-platform settings.
///
/// The request path carries only the image path relative to the platform's
/// image CDN; `img_url` is the base the relative path is joined to.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlatformConfig {
    /// Base URL for source images (e.g., "https://cdn.example.com").
    pub img_url: String,
}

/// Image transformation limits and source-host whitelist.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ImageableConfig {
    /// Maximum accepted width/height for a transform request.
    pub image_size_limit: u32,

    /// Cap on concurrent upstream fetch/transform operations.
    pub max_listeners: usize,

    /// Named host allow-lists. Each entry maps a list name
    /// (e.g. "allowed_hosts", "trusted_hosts") to host patterns, each
    /// compiled as a regular expression at startup.
    pub whitelist: HashMap<String, Vec<String>>,
}

impl Default for ImageableConfig {
    fn default() -> Self {
        Self {
            image_size_limit: 2048,
            max_listeners: 50,
            whitelist: HashMap::new(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Origin image fetch timeout in seconds. The upstream has no SLA,
    /// so the fetch is bounded even though nothing else retries it.
    pub fetch_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            fetch_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

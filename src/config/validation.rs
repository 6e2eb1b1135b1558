//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the active platform exists and its base URL is usable
//! - Validate value ranges (limits > 0, timeouts > 0)
//! - Compile whitelist patterns so bad regexes fail at startup
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use regex::Regex;
use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem found in the configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a valid socket address")]
    InvalidBindAddress(String),

    #[error("platform '{0}' has no entry under [platforms]")]
    UnknownPlatform(String),

    #[error("platforms.{platform}.img_url '{url}' is not a valid URL: {reason}")]
    InvalidImgUrl {
        platform: String,
        url: String,
        reason: String,
    },

    #[error("imageable.image_size_limit must be greater than 0")]
    ZeroSizeLimit,

    #[error("imageable.max_listeners must be greater than 0")]
    ZeroMaxListeners,

    #[error("whitelist pattern '{pattern}' in list '{list}' does not compile: {reason}")]
    BadWhitelistPattern {
        list: String,
        pattern: String,
        reason: String,
    },

    #[error("timeouts.{0} must be greater than 0")]
    ZeroTimeout(&'static str),
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.active_platform().is_none() {
        errors.push(ValidationError::UnknownPlatform(config.platform.clone()));
    }

    for (name, platform) in &config.platforms {
        match Url::parse(&platform.img_url) {
            Ok(url) if url.host_str().is_none() => {
                errors.push(ValidationError::InvalidImgUrl {
                    platform: name.clone(),
                    url: platform.img_url.clone(),
                    reason: "URL has no host".to_string(),
                });
            }
            Ok(_) => {}
            Err(e) => {
                errors.push(ValidationError::InvalidImgUrl {
                    platform: name.clone(),
                    url: platform.img_url.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if config.imageable.image_size_limit == 0 {
        errors.push(ValidationError::ZeroSizeLimit);
    }

    if config.imageable.max_listeners == 0 {
        errors.push(ValidationError::ZeroMaxListeners);
    }

    for (list, patterns) in &config.imageable.whitelist {
        for pattern in patterns {
            if let Err(e) = Regex::new(pattern) {
                errors.push(ValidationError::BadWhitelistPattern {
                    list: list.clone(),
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }
    if config.timeouts.fetch_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("fetch_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

//! Source-host allow-list matching.
//!
//! # Responsibilities
//! - Compile configured host patterns once at startup
//! - Decide whether a source URL's host is covered by a named list
//! - Apply per-list default policy when a list is not configured
//!
//! # Design Decisions
//! - Every pattern is a regex matching anywhere in the host (unanchored)
//! - A URL whose host cannot be extracted never matches
//! - Lists are immutable after construction

use std::collections::HashMap;

use regex::Regex;
use url::Url;

/// List gating whether the proxy will fetch a source URL at all.
/// Absent list means every host is permitted.
pub const ALLOWED_HOSTS: &str = "allowed_hosts";

/// List reserved for stricter trust decisions. Absent list means no
/// host is trusted.
pub const TRUSTED_HOSTS: &str = "trusted_hosts";

/// Named collections of pre-compiled host matchers.
#[derive(Debug, Clone, Default)]
pub struct HostAllowList {
    lists: HashMap<String, Vec<Regex>>,
}

impl HostAllowList {
    /// Compile every configured pattern.
    ///
    /// Config validation rejects bad patterns before this runs, so a
    /// compile failure here means the list was built from an unvalidated
    /// source.
    pub fn from_config(
        whitelist: &HashMap<String, Vec<String>>,
    ) -> Result<Self, regex::Error> {
        let mut lists = HashMap::new();
        for (name, patterns) in whitelist {
            let compiled = patterns
                .iter()
                .map(|p| Regex::new(p))
                .collect::<Result<Vec<_>, _>>()?;
            lists.insert(name.clone(), compiled);
        }
        Ok(Self { lists })
    }

    /// Whether `url`'s host is covered by the named list.
    ///
    /// Returns `default_if_unconfigured` when no list with that name
    /// exists. A malformed URL, or one without a host, matches nothing.
    pub fn is_allowed(&self, url: &str, list_name: &str, default_if_unconfigured: bool) -> bool {
        let Some(patterns) = self.lists.get(list_name) else {
            return default_if_unconfigured;
        };

        let host = match Url::parse(url) {
            Ok(parsed) => match parsed.host_str() {
                Some(host) => host.to_string(),
                None => return false,
            },
            Err(_) => return false,
        };

        patterns.iter().any(|p| p.is_match(&host))
    }

    /// Whether the proxy may fetch this source URL (default permit).
    pub fn is_image_source_allowed(&self, url: &str) -> bool {
        self.is_allowed(url, ALLOWED_HOSTS, true)
    }

    /// Whether this source URL's host is explicitly trusted (default
    /// deny). Reserved for policy decisions stricter than fetching.
    pub fn is_image_source_trusted(&self, url: &str) -> bool {
        self.is_allowed(url, TRUSTED_HOSTS, false)
    }
}

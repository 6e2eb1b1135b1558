//! Security subsystem: source-host allow-listing.
//!
//! The proxy fetches attacker-influenced URLs; the allow-list is the
//! gate between decoding a request and touching the network.

pub mod allowlist;

pub use allowlist::{HostAllowList, ALLOWED_HOSTS, TRUSTED_HOSTS};

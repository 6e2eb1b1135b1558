//! Request decoding subsystem.
//!
//! Turns an untrusted, positionally encoded request path into a typed
//! [`TransformRequest`] or a structured validation failure.

pub mod decoder;

pub use decoder::{decode_path, Action, DecodeError, TransformRequest};

//! Request path decoding.
//!
//! # Responsibilities
//! - Parse the positional path `/<width>/<height>/<action>/<rest...>`
//! - Validate numeric ranges against the configured size limit
//! - Join the remaining segments onto the platform base URL
//!
//! # Design Decisions
//! - Pure function of (path, limit, base URL); no side effects
//! - Tagged error variants instead of string-index arithmetic
//! - An unknown action is reported with the same usage hint as a
//!   structurally broken path

use std::str::FromStr;

use thiserror::Error;

/// A transform operation requested by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Resize,
    Fit,
    Crop,
    Identify,
}

impl Action {
    /// Stable lowercase name, used for logging and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Resize => "resize",
            Action::Fit => "fit",
            Action::Crop => "crop",
            Action::Identify => "identify",
        }
    }
}

impl FromStr for Action {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resize" => Ok(Action::Resize),
            "fit" => Ok(Action::Fit),
            "crop" => Ok(Action::Crop),
            "identify" => Ok(Action::Identify),
            _ => Err(()),
        }
    }
}

/// A fully decoded and range-checked transform request.
///
/// Created fresh per inbound request and discarded once the response is
/// sent; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformRequest {
    pub width: u32,
    pub height: u32,
    pub action: Action,
    /// Absolute URL of the source image.
    pub source_url: String,
}

/// Validation failure while decoding a request path.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Too few segments, non-numeric dimensions, or an unknown action.
    #[error(
        "Please provide following parameters: \
         /<width>/<height>/<action:crop,fit,resize,identify>/<relative_url>"
    )]
    MalformedPath,

    /// Width or height outside the configured range.
    #[error("Width and height must have a value between 0 and {limit}")]
    DimensionsOutOfRange { limit: u32 },
}

/// Decode a request path into a [`TransformRequest`].
///
/// The path is split on `/`; with the leading empty segment that makes
/// segment 1 the width, 2 the height, 3 the action, and everything after
/// that the source image path relative to `img_base_url`.
pub fn decode_path(
    path: &str,
    size_limit: u32,
    img_base_url: &str,
) -> Result<TransformRequest, DecodeError> {
    let segments: Vec<&str> = path.split('/').collect();
    if segments.len() < 4 {
        return Err(DecodeError::MalformedPath);
    }

    let width: i64 = segments[1].parse().map_err(|_| DecodeError::MalformedPath)?;
    let height: i64 = segments[2].parse().map_err(|_| DecodeError::MalformedPath)?;
    let action = Action::from_str(segments[3]).map_err(|_| DecodeError::MalformedPath)?;

    let limit = i64::from(size_limit);
    if width > limit || width < 0 || height > limit || height < 0 {
        return Err(DecodeError::DimensionsOutOfRange { limit: size_limit });
    }

    let source_url = format!("{}/{}", img_base_url, segments[4..].join("/"));

    Ok(TransformRequest {
        width: width as u32,
        height: height as u32,
        action,
        source_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://cdn.example.com";

    #[test]
    fn test_decode_valid_path() {
        let req = decode_path("/100/200/resize/path/to/pic.jpg", 2000, BASE).unwrap();
        assert_eq!(req.width, 100);
        assert_eq!(req.height, 200);
        assert_eq!(req.action, Action::Resize);
        assert_eq!(req.source_url, "https://cdn.example.com/path/to/pic.jpg");
    }

    #[test]
    fn test_decode_all_actions() {
        for (name, action) in [
            ("resize", Action::Resize),
            ("fit", Action::Fit),
            ("crop", Action::Crop),
            ("identify", Action::Identify),
        ] {
            let path = format!("/10/10/{}/pic.png", name);
            assert_eq!(decode_path(&path, 100, BASE).unwrap().action, action);
        }
    }

    #[test]
    fn test_too_few_segments() {
        assert_eq!(
            decode_path("/100/100", 2000, BASE),
            Err(DecodeError::MalformedPath)
        );
        assert_eq!(decode_path("/", 2000, BASE), Err(DecodeError::MalformedPath));
    }

    #[test]
    fn test_non_numeric_dimensions() {
        assert_eq!(
            decode_path("/abc/100/resize/pic.jpg", 2000, BASE),
            Err(DecodeError::MalformedPath)
        );
        assert_eq!(
            decode_path("/100/10.5/resize/pic.jpg", 2000, BASE),
            Err(DecodeError::MalformedPath)
        );
    }

    #[test]
    fn test_unknown_action() {
        assert_eq!(
            decode_path("/100/100/rotate/pic.jpg", 2000, BASE),
            Err(DecodeError::MalformedPath)
        );
    }

    #[test]
    fn test_dimensions_out_of_range() {
        assert_eq!(
            decode_path("/5000/100/resize/pic.jpg", 2000, BASE),
            Err(DecodeError::DimensionsOutOfRange { limit: 2000 })
        );
        assert_eq!(
            decode_path("/100/-1/resize/pic.jpg", 2000, BASE),
            Err(DecodeError::DimensionsOutOfRange { limit: 2000 })
        );
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(decode_path("/2000/0/resize/pic.jpg", 2000, BASE).is_ok());
    }

    #[test]
    fn test_range_error_names_limit() {
        let err = decode_path("/5000/100/resize/pic.jpg", 2000, BASE).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Width and height must have a value between 0 and 2000"
        );
    }

    #[test]
    fn test_usage_hint_lists_actions() {
        let err = decode_path("/x", 2000, BASE).unwrap_err();
        assert!(err.to_string().contains("crop,fit,resize,identify"));
    }
}

//! Error types for fetching, rule compilation and configuration loading.
//!
//! Extraction itself has no error type: a compiled rule always produces a
//! (possibly empty) sequence of records, and structural misses are reported
//! through [`crate::models::ExtractionGap`] instead.

use std::fmt;
use thiserror::Error;

/// Why a single fetch attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Connection, DNS, TLS or body-read failure.
    Network,
    /// The request did not complete within the client timeout.
    Timeout,
    /// The server answered with a non-2xx status.
    Status(u16),
    /// The server answered 2xx with an empty body.
    EmptyBody,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchErrorKind::Network => f.write_str("network"),
            FetchErrorKind::Timeout => f.write_str("timeout"),
            FetchErrorKind::Status(code) => write!(f, "status {code}"),
            FetchErrorKind::EmptyBody => f.write_str("empty body"),
        }
    }
}

/// A failed fetch. Never fatal: the pipeline turns it into an empty, stale result.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            FetchErrorKind::Timeout
        } else if let Some(status) = e.status() {
            FetchErrorKind::Status(status.as_u16())
        } else {
            FetchErrorKind::Network
        };
        Self::new(kind, e.to_string())
    }
}

/// A rule that cannot be compiled into selectors and patterns.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("invalid anchor pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("rule for {site}/{feed} is invalid: {source}")]
    Rule {
        site: String,
        feed: String,
        #[source]
        source: ExtractError,
    },

    #[error("feed {site}/{feed} is configured more than once")]
    DuplicateFeed { site: String, feed: String },

    #[error("site {site} has base_url {url:?}, expected an absolute http(s) URL")]
    BaseUrl { site: String, url: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display_includes_kind() {
        let e = FetchError::new(FetchErrorKind::Status(503), "service unavailable");
        assert_eq!(e.to_string(), "status 503: service unavailable");
    }

    #[test]
    fn test_invalid_pattern_display() {
        let source = regex::Regex::new("(").unwrap_err();
        let e = ExtractError::InvalidPattern {
            pattern: "(".to_string(),
            source,
        };
        assert!(e.to_string().starts_with("invalid anchor pattern `(`"));
    }
}

//! Error types for request building, dispatch, and response decoding.
//!
//! # Design
//! One enum covers the whole pipeline so callers match on a single type.
//! Builder-time failures (typed body serialization) are recorded on the
//! `Request` and surface from `Client::dispatch` before any network call.
//! Middleware errors are returned to the caller unchanged.

use thiserror::Error;

use crate::body::BodyFormat;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error produced by caller code (middleware, custom transports).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
    /// Base URL plus endpoint did not form a valid absolute URL.
    #[error("invalid url `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The assembled request was rejected (bad header name or value, bad method).
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] ureq::http::Error),

    /// A typed body setter could not serialize its value.
    #[error("failed to encode {format} body: {message}")]
    Encode { format: BodyFormat, message: String },

    /// Reading the caller's body stream or the response body failed.
    #[error("failed to read body: {0}")]
    BodyRead(String),

    /// A middleware aborted the dispatch.
    #[error("middleware rejected request: {0}")]
    Middleware(#[source] BoxError),

    /// The request context was cancelled.
    #[error("request cancelled")]
    Cancelled,

    /// The request context deadline passed before the call completed.
    #[error("request deadline exceeded")]
    DeadlineExceeded,

    /// The transport gave up waiting for the server.
    #[error("request timed out")]
    Timeout,

    /// Network-level failure reported by the transport.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    /// The response body did not match the requested shape.
    #[error("failed to decode {format} body: {message}")]
    Decode { format: BodyFormat, message: String },

    #[error("invalid proxy `{proxy}`: {message}")]
    InvalidProxy { proxy: String, message: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Wrap an arbitrary caller error as a middleware rejection.
    pub fn middleware(err: impl Into<BoxError>) -> Self {
        Error::Middleware(err.into())
    }

    /// Wrap an arbitrary error as a transport failure.
    pub fn transport(err: impl Into<BoxError>) -> Self {
        Error::Transport(err.into())
    }

    /// True for errors raised by the request context rather than the network.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled | Error::DeadlineExceeded)
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Timeout(_) => Error::Timeout,
            other => Error::Transport(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middleware_wraps_string_messages() {
        let err = Error::middleware("missing token");
        assert_eq!(err.to_string(), "middleware rejected request: missing token");
    }

    #[test]
    fn encode_error_names_the_format() {
        let err = Error::Encode {
            format: BodyFormat::Yaml,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "failed to encode YAML body: boom");
    }

    #[test]
    fn cancellation_errors_are_classified() {
        assert!(Error::Cancelled.is_cancellation());
        assert!(Error::DeadlineExceeded.is_cancellation());
        assert!(!Error::Timeout.is_cancellation());
    }
}

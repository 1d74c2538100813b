//! Error types surfaced by the remote-store clients.
//!
//! All of these are fatal; they travel through `anyhow::Result` and can be
//! recovered by downcast when a caller needs to distinguish them.

use reqwest::StatusCode;
use std::fmt;

/// A remote call answered with a non-success HTTP status. Carries the request
/// URL and the response body verbatim; no structured error parsing is done.
#[derive(Debug, Clone)]
pub struct TransportError {
    pub url: String,
    pub status: StatusCode,
    pub body: String,
}

impl TransportError {
    pub fn new(url: impl Into<String>, status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status,
            body: body.into(),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Error executing request {} ({}):\n{}",
            self.url, self.status, self.body
        )
    }
}

impl std::error::Error for TransportError {}

/// A name-based lookup (graph or service) found no match in the current
/// remote listing.
#[derive(Debug, Clone)]
pub struct NotFoundError {
    pub message: String,
}

impl NotFoundError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for NotFoundError {}

/// A bounded polling loop (job completion or service sync) ran out of
/// attempts before the remote side reached the expected state.
#[derive(Debug, Clone)]
pub struct TimeoutError {
    pub message: String,
}

impl TimeoutError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for TimeoutError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TimeoutError {}

/// Input was rejected before any remote call was made: content without
/// graphs, or a profile with no configured dataset mapping.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

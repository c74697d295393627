//! Error types for the image studio core.
//!
//! Provides a hierarchy of error types using `thiserror` for ergonomic error handling.

use std::io;
use thiserror::Error;

/// Validation errors for transformation parameters.
///
/// Raised and caught at the parameter-store boundary. A rejected value
/// leaves the store untouched and never reaches the service boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Dimension outside the accepted pixel range
    #[error("Invalid dimension: {0}. Must be between 1 and 10000")]
    Dimension(u32),
    /// Quality outside 1-100
    #[error("Invalid quality value: {0}. Must be between 1 and 100")]
    Quality(u32),
    /// Scale percentage outside 1-100
    #[error("Invalid scale value: {0}%. Must be between 1 and 100")]
    Scale(u32),
}

/// Main error type for the studio core.
///
/// Service and network failures are surfaced to the session-level error
/// slot; resource errors indicate a handle lifecycle bug rather than a
/// user-facing condition.
#[derive(Error, Debug)]
pub enum StudioError {
    /// Parameter validation failed
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The transform service returned a non-success response or a
    /// malformed payload
    #[error("Transform service error: {0}")]
    Service(String),

    /// The request could not complete (connect failure, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Resource handle invariant violated
    #[error("Resource error: {0}")]
    Resource(String),

    /// Source image header could not be read
    #[error("Image error: {0}")]
    Image(String),

    /// File IO error
    #[error("IO error: {0}")]
    IO(String),
}

/// Convenience result type for studio operations.
pub type StudioResult<T> = Result<T, StudioError>;

impl StudioError {
    pub fn service<T: Into<String>>(msg: T) -> Self {
        Self::Service(msg.into())
    }

    pub fn network<T: Into<String>>(msg: T) -> Self {
        Self::Network(msg.into())
    }

    pub fn resource<T: Into<String>>(msg: T) -> Self {
        Self::Resource(msg.into())
    }

    pub fn image<T: Into<String>>(msg: T) -> Self {
        Self::Image(msg.into())
    }
}

impl From<io::Error> for StudioError {
    fn from(err: io::Error) -> Self {
        Self::IO(err.to_string())
    }
}

// Transport-level failures are network errors; a body that cannot be
// decoded means the service replied with something malformed.
impl From<reqwest::Error> for StudioError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Service(format!("Malformed service response: {err}"))
        } else {
            Self::Network(err.to_string())
        }
    }
}

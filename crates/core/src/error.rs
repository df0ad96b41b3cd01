//! Unified error type for filter operations.
//!
//! Request-time failures are discriminated here for the log, but all of them
//! collapse to one client-visible outcome: an internal server error. The
//! host never learns which stage failed.

use thiserror::Error;
use xflow_traits::ResourceError;

#[derive(Error, Debug)]
pub enum FilterError {
    /// Bad directive syntax or an unloadable preload source. Load-time only;
    /// a scope that produces this is rejected before any request runs.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The request body could not be parsed into a document.
    #[error("Parse error: {0}")]
    Parse(String),

    /// No transformation program could be determined for the request.
    #[error("Stylesheet resolution error: {0}")]
    Resolution(String),

    /// The program failed to execute against the document.
    #[error("Transform error: {0}")]
    Transform(String),

    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Externally visible outcome of a filter invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStatus {
    Ok,
    InternalServerError,
}

impl FilterError {
    /// Every request-time failure maps to the same client-visible status;
    /// the discriminated cause goes to the log only.
    pub fn status(&self) -> FilterStatus {
        FilterStatus::InternalServerError
    }
}

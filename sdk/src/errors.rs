//! Error types and handling
//!
//! This module provides the error type returned by capability providers.
//! Every error raised while running a pipeline implements the
//! `PipelineErrorExt` trait, which provides a user-friendly hint and tells
//! the engine whether the error must abort the whole run.
//!
//! # Classes
//!
//! - **Step-level**: a provider failed for one step. The engine records the
//!   message and moves on to the next step.
//! - **Fatal**: the deployment itself is broken (no provider wired up for a
//!   capability family, malformed plan). The engine aborts the run.
//!
//! Every `CapabilityError` is step-level.

use thiserror::Error;

/// Trait for pipeline error extensions
///
/// Provides additional context for errors surfaced to callers of the engine.
pub trait PipelineErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint is safe to display to end users and does not contain
    /// provider internals or file paths.
    fn user_hint(&self) -> &str;

    /// Returns whether the error aborts the whole plan execution
    ///
    /// Non-fatal errors are recorded against the failing step and execution
    /// continues with the next step.
    fn is_fatal(&self) -> bool;
}

/// Error raised by a capability provider
///
/// # Examples
///
/// ```
/// use sdk::errors::{CapabilityError, PipelineErrorExt};
///
/// let error = CapabilityError::MissingParameter("file_path".to_string());
/// assert_eq!(error.to_string(), "Missing parameter: file_path");
/// assert!(!error.is_fatal());
/// ```
#[derive(Debug, Error)]
pub enum CapabilityError {
    // Input errors
    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    // Lookup errors
    #[error("Not found: {0}")]
    NotFound(String),

    // Network errors
    #[error("Network error: {0}")]
    Network(String),

    // Content errors
    #[error("Unsupported or corrupt format: {0}")]
    Format(String),

    // Anything else the provider wants to report
    #[error("Provider error: {0}")]
    Provider(String),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineErrorExt for CapabilityError {
    fn user_hint(&self) -> &str {
        match self {
            Self::MissingParameter(_) => "A previous step did not produce the input this step needs",
            Self::InvalidParameter(_) => "The step received a value it cannot use",
            Self::NotFound(_) => "Nothing matched the request. Try different keywords",
            Self::Network(_) => "Network operation failed. Check your connection",
            Self::Format(_) => "The downloaded file could not be read",
            Self::Provider(_) => "Provider operation failed",
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_fatal(&self) -> bool {
        false
    }
}

//! Engine error types
//!
//! Two classes of error exist while running a plan:
//!
//! - `OrchestratorError`: fatal. The run is aborted and no partial result is
//!   returned. Raised when a capability family has no provider at all, when
//!   an externally supplied plan is structurally invalid, or when the
//!   question/intent stage fails.
//! - `StepError`: non-fatal. Recorded in the result's `errors` list and the
//!   executor moves on to the next step.

use sdk::errors::{CapabilityError, PipelineErrorExt};
use thiserror::Error;

/// Fatal, run-aborting errors
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("No provider is registered for the '{family}' capability family")]
    MissingProvider { family: String },

    #[error("Malformed plan: {0}")]
    MalformedPlan(String),

    #[error("Question must be a non-empty string")]
    InvalidQuestion,

    #[error("Intent extraction failed: {0}")]
    IntentExtraction(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineErrorExt for OrchestratorError {
    fn user_hint(&self) -> &str {
        match self {
            Self::MissingProvider { .. } => {
                "The deployment is missing a required provider. Check which providers are registered"
            }
            Self::MalformedPlan(_) => "The plan must be a list of step objects",
            Self::InvalidQuestion => "Ask a question in plain words",
            Self::IntentExtraction(_) => "The question could not be understood. Try rephrasing it",
            Self::Config(_) => "Check your config.toml file for errors",
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_fatal(&self) -> bool {
        true
    }
}

/// Non-fatal, per-step errors
#[derive(Debug, Error)]
pub enum StepError {
    #[error("Unknown capability '{0}'")]
    UnknownCapability(String),

    #[error("Provider '{family}' has no '{handler}' handler")]
    HandlerNotFound { family: String, handler: String },

    #[error(transparent)]
    Capability(#[from] CapabilityError),
}

impl PipelineErrorExt for StepError {
    fn user_hint(&self) -> &str {
        match self {
            Self::UnknownCapability(_) => "The plan asked for an operation that does not exist",
            Self::HandlerNotFound { .. } => "This variant of the operation is not available",
            Self::Capability(e) => e.user_hint(),
        }
    }

    fn is_fatal(&self) -> bool {
        false
    }
}

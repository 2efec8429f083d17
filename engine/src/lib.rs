//! Datapilot Engine Library
//!
//! Plans and executes data pipelines (search, download, parse, enrich,
//! visualize, summarize) against pluggable capability providers. It is used
//! by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Planning and execution
pub mod conductor;

/// Engine error types
pub mod errors;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;

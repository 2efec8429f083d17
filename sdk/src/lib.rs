//! Datapilot SDK
//!
//! Shared library providing the capability contracts, data types and error
//! types used between the Datapilot engine and capability providers
//! (dataset search, download, parsing, enrichment, rendering, summarization).

/// Capability traits and the closure adapter
pub mod capability;

/// Error types and handling
pub mod errors;

/// Capability input/output types
pub mod types;

// Re-export commonly used types
pub use capability::{
    CapabilityResult, Downloader, Enricher, FnHandler, IntentExtractor, Parser, SearchProvider,
    Summarizer, Visualizer,
};
pub use errors::{CapabilityError, PipelineErrorExt};
pub use types::{
    string_list, Dataset, DownloadRequest, DownloadedFile, ResourceLink, SearchQuery, StepInput,
};

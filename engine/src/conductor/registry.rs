//! Capability Registry
//!
//! Maps logical capability names onto provider handlers. Each family has one
//! optional entry: search, download and summarize take a single provider;
//! parse, enrich and visualize take a package keyed by variant.
//!
//! A family with no entry at all is a broken deployment and aborts the run.
//! A package that lacks one variant only fails the step asking for it.

use crate::conductor::types::{Capability, Enrichment, ParseFormat, VisualKind};
use crate::errors::{OrchestratorError, StepError};
use sdk::capability::{Downloader, Enricher, Parser, SearchProvider, Summarizer, Visualizer};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// A resolved handler, ready to be invoked
#[derive(Clone)]
pub enum Handler {
    Search(Arc<dyn SearchProvider>),
    Download(Arc<dyn Downloader>),
    Parse(Arc<dyn Parser>),
    Enrich(Arc<dyn Enricher>),
    Visualize(Arc<dyn Visualizer>),
    Summarize(Arc<dyn Summarizer>),
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let family = match self {
            Handler::Search(_) => "search",
            Handler::Download(_) => "download",
            Handler::Parse(_) => "parse",
            Handler::Enrich(_) => "enrich",
            Handler::Visualize(_) => "visualize",
            Handler::Summarize(_) => "summarize",
        };
        f.debug_tuple("Handler").field(&family).finish()
    }
}

/// Outcome of a lookup: the outer error aborts the run, the inner one fails
/// only the current step
pub type Resolution = Result<Result<Handler, StepError>, OrchestratorError>;

/// Registry of capability providers
///
/// Only families that are `Some` can be dispatched to. The registry is
/// read-only once built and can be shared across concurrent executions.
#[derive(Default, Clone)]
pub struct CapabilityRegistry {
    pub search: Option<Arc<dyn SearchProvider>>,
    pub download: Option<Arc<dyn Downloader>>,
    pub parse: Option<HashMap<ParseFormat, Arc<dyn Parser>>>,
    pub enrich: Option<HashMap<Enrichment, Arc<dyn Enricher>>>,
    pub visualize: Option<HashMap<VisualKind, Arc<dyn Visualizer>>>,
    pub summarize: Option<Arc<dyn Summarizer>>,
}

impl CapabilityRegistry {
    /// Create an empty registry with no providers.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, provider: impl SearchProvider + 'static) -> Self {
        self.search = Some(Arc::new(provider));
        self
    }

    pub fn with_downloader(mut self, provider: impl Downloader + 'static) -> Self {
        self.download = Some(Arc::new(provider));
        self
    }

    /// Add one parser to the parse package, creating the package if needed
    pub fn with_parser(mut self, format: ParseFormat, parser: impl Parser + 'static) -> Self {
        self.parse
            .get_or_insert_with(HashMap::new)
            .insert(format, Arc::new(parser));
        self
    }

    pub fn with_enricher(mut self, kind: Enrichment, enricher: impl Enricher + 'static) -> Self {
        self.enrich
            .get_or_insert_with(HashMap::new)
            .insert(kind, Arc::new(enricher));
        self
    }

    pub fn with_visualizer(mut self, kind: VisualKind, visualizer: impl Visualizer + 'static) -> Self {
        self.visualize
            .get_or_insert_with(HashMap::new)
            .insert(kind, Arc::new(visualizer));
        self
    }

    pub fn with_summarizer(mut self, provider: impl Summarizer + 'static) -> Self {
        self.summarize = Some(Arc::new(provider));
        self
    }

    /// Families that have a provider, in pipeline order
    pub fn registered_families(&self) -> Vec<&'static str> {
        let mut families = Vec::new();
        if self.search.is_some() {
            families.push("search");
        }
        if self.download.is_some() {
            families.push("download");
        }
        if self.parse.is_some() {
            families.push("parse");
        }
        if self.enrich.is_some() {
            families.push("enrich");
        }
        if self.visualize.is_some() {
            families.push("visualize");
        }
        if self.summarize.is_some() {
            families.push("summarize");
        }
        families
    }

    /// Resolve a concrete capability to its handler
    ///
    /// `Parse(None)` and `Visualize(None)` must be narrowed by the caller
    /// first; they are looked up as `parse.auto` and `visualize.chart`.
    pub fn resolve(&self, capability: Capability) -> Resolution {
        let family = capability.family();
        let handler = match capability {
            Capability::Search => Ok(Handler::Search(Arc::clone(single(&self.search, family)?))),
            Capability::Download => {
                Ok(Handler::Download(Arc::clone(single(&self.download, family)?)))
            }
            Capability::Summarize => {
                Ok(Handler::Summarize(Arc::clone(single(&self.summarize, family)?)))
            }
            Capability::Parse(format) => {
                let format = format.unwrap_or(ParseFormat::Auto);
                variant(&self.parse, family, &format, format.as_str())?.map(Handler::Parse)
            }
            Capability::Enrich(kind) => {
                variant(&self.enrich, family, &kind, kind.as_str())?.map(Handler::Enrich)
            }
            Capability::Visualize(kind) => {
                let kind = kind.unwrap_or(VisualKind::Chart);
                variant(&self.visualize, family, &kind, kind.as_str())?.map(Handler::Visualize)
            }
        };
        Ok(handler)
    }
}

fn single<'a, T: ?Sized>(
    entry: &'a Option<Arc<T>>,
    family: &str,
) -> Result<&'a Arc<T>, OrchestratorError> {
    entry.as_ref().ok_or_else(|| OrchestratorError::MissingProvider {
        family: family.to_string(),
    })
}

fn variant<K: Eq + Hash, T: ?Sized>(
    package: &Option<HashMap<K, Arc<T>>>,
    family: &str,
    key: &K,
    name: &str,
) -> Result<Result<Arc<T>, StepError>, OrchestratorError> {
    let package = package
        .as_ref()
        .ok_or_else(|| OrchestratorError::MissingProvider {
            family: family.to_string(),
        })?;

    Ok(package
        .get(key)
        .map(Arc::clone)
        .ok_or_else(|| StepError::HandlerNotFound {
            family: family.to_string(),
            handler: name.to_string(),
        }))
}

//! Capability contracts
//!
//! One trait per logical capability. A provider crate implements the trait
//! on its own type ("canonical method") or hands a plain closure to
//! `FnHandler` ("bare callable"). The engine only ever sees the trait.

use crate::errors::CapabilityError;
use crate::types::{Dataset, DownloadRequest, DownloadedFile, SearchQuery};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::Path;

/// Result type for capability calls
pub type CapabilityResult<T> = Result<T, CapabilityError>;

/// Dataset catalogue search
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Returns matching dataset records, best match first
    async fn search(&self, query: &SearchQuery) -> CapabilityResult<Vec<Dataset>>;
}

/// Fetches a remote resource to local storage
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, request: &DownloadRequest) -> CapabilityResult<DownloadedFile>;
}

/// Turns a local file into tabular or structured data
#[async_trait]
pub trait Parser: Send + Sync {
    async fn parse(&self, file_path: &Path) -> CapabilityResult<Value>;
}

/// Derives extra columns or geometries from parsed data
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(&self, data: &Value) -> CapabilityResult<Value>;
}

/// Renders data into an artifact reference (path or structured description)
#[async_trait]
pub trait Visualizer: Send + Sync {
    async fn render(&self, data: &Value, options: &Map<String, Value>) -> CapabilityResult<Value>;
}

/// Produces a natural language summary of data for the user's question
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, data: &Value, question: &str) -> CapabilityResult<String>;
}

/// Turns the user's question into a raw intent record
///
/// The record is plain JSON (`goal`, `entities`, optional `actions`); the
/// engine interprets it permissively.
#[async_trait]
pub trait IntentExtractor: Send + Sync {
    async fn extract(&self, question: &str) -> CapabilityResult<Value>;
}

/// Adapter exposing a plain synchronous function as a capability
///
/// Use the constructor matching the capability so the closure signature is
/// checked where it is written.
///
/// ```
/// use sdk::capability::FnHandler;
/// use serde_json::json;
/// use std::path::Path;
///
/// let parser = FnHandler::parser(|path: &Path| Ok(json!({ "rows": [], "path": path })));
/// # let _ = parser;
/// ```
pub struct FnHandler<F>(F);

impl<F> FnHandler<F> {
    pub fn search(f: F) -> Self
    where
        F: Fn(&SearchQuery) -> CapabilityResult<Vec<Dataset>> + Send + Sync,
    {
        Self(f)
    }

    pub fn download(f: F) -> Self
    where
        F: Fn(&DownloadRequest) -> CapabilityResult<DownloadedFile> + Send + Sync,
    {
        Self(f)
    }

    pub fn parser(f: F) -> Self
    where
        F: Fn(&Path) -> CapabilityResult<Value> + Send + Sync,
    {
        Self(f)
    }

    pub fn enricher(f: F) -> Self
    where
        F: Fn(&Value) -> CapabilityResult<Value> + Send + Sync,
    {
        Self(f)
    }

    pub fn visualizer(f: F) -> Self
    where
        F: Fn(&Value, &Map<String, Value>) -> CapabilityResult<Value> + Send + Sync,
    {
        Self(f)
    }

    pub fn summarizer(f: F) -> Self
    where
        F: Fn(&Value, &str) -> CapabilityResult<String> + Send + Sync,
    {
        Self(f)
    }

    pub fn extractor(f: F) -> Self
    where
        F: Fn(&str) -> CapabilityResult<Value> + Send + Sync,
    {
        Self(f)
    }
}

#[async_trait]
impl<F> SearchProvider for FnHandler<F>
where
    F: Fn(&SearchQuery) -> CapabilityResult<Vec<Dataset>> + Send + Sync,
{
    async fn search(&self, query: &SearchQuery) -> CapabilityResult<Vec<Dataset>> {
        (self.0)(query)
    }
}

#[async_trait]
impl<F> Downloader for FnHandler<F>
where
    F: Fn(&DownloadRequest) -> CapabilityResult<DownloadedFile> + Send + Sync,
{
    async fn download(&self, request: &DownloadRequest) -> CapabilityResult<DownloadedFile> {
        (self.0)(request)
    }
}

#[async_trait]
impl<F> Parser for FnHandler<F>
where
    F: Fn(&Path) -> CapabilityResult<Value> + Send + Sync,
{
    async fn parse(&self, file_path: &Path) -> CapabilityResult<Value> {
        (self.0)(file_path)
    }
}

#[async_trait]
impl<F> Enricher for FnHandler<F>
where
    F: Fn(&Value) -> CapabilityResult<Value> + Send + Sync,
{
    async fn enrich(&self, data: &Value) -> CapabilityResult<Value> {
        (self.0)(data)
    }
}

#[async_trait]
impl<F> Visualizer for FnHandler<F>
where
    F: Fn(&Value, &Map<String, Value>) -> CapabilityResult<Value> + Send + Sync,
{
    async fn render(&self, data: &Value, options: &Map<String, Value>) -> CapabilityResult<Value> {
        (self.0)(data, options)
    }
}

#[async_trait]
impl<F> Summarizer for FnHandler<F>
where
    F: Fn(&Value, &str) -> CapabilityResult<String> + Send + Sync,
{
    async fn summarize(&self, data: &Value, question: &str) -> CapabilityResult<String> {
        (self.0)(data, question)
    }
}

#[async_trait]
impl<F> IntentExtractor for FnHandler<F>
where
    F: Fn(&str) -> CapabilityResult<Value> + Send + Sync,
{
    async fn extract(&self, question: &str) -> CapabilityResult<Value> {
        (self.0)(question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StaticSearch;

    #[async_trait]
    impl SearchProvider for StaticSearch {
        async fn search(&self, query: &SearchQuery) -> CapabilityResult<Vec<Dataset>> {
            Ok(query
                .keywords
                .iter()
                .map(|k| Dataset::new(k.clone(), format!("Dataset about {}", k)))
                .collect())
        }
    }

    #[tokio::test]
    async fn test_struct_provider_behind_trait_object() {
        let provider: Box<dyn SearchProvider> = Box::new(StaticSearch);
        let query = SearchQuery {
            keywords: vec!["budget".to_string()],
            ..Default::default()
        };
        let datasets = provider.search(&query).await.unwrap();
        assert_eq!(datasets.len(), 1);
        assert_eq!(datasets[0].id, "budget");
    }

    #[tokio::test]
    async fn test_closure_parser() {
        let parser = FnHandler::parser(|path: &Path| {
            Ok(json!({ "source": path.to_string_lossy() }))
        });
        let value = parser.parse(Path::new("/tmp/x.csv")).await.unwrap();
        assert_eq!(value["source"], "/tmp/x.csv");
    }

    #[tokio::test]
    async fn test_closure_summarizer_receives_question() {
        let summarizer =
            FnHandler::summarizer(|_data: &Value, question: &str| Ok(format!("re: {}", question)));
        let summary = summarizer.summarize(&json!([]), "how many?").await.unwrap();
        assert_eq!(summary, "re: how many?");
    }

    #[tokio::test]
    async fn test_closure_error_propagates() {
        let downloader = FnHandler::download(|request: &DownloadRequest| {
            Err(CapabilityError::Network(format!("unreachable {}", request)))
        });
        let err = downloader
            .download(&DownloadRequest::Url("http://x".to_string()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unreachable url http://x"));
    }
}

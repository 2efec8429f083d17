//! Capability input/output types

use crate::errors::CapabilityError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Parameters of one step after placeholder resolution
///
/// Keys whose placeholder could not be resolved are absent, so every
/// accessor treats "missing" and "unresolved" the same way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepInput {
    pub params: Map<String, Value>,
}

impl StepInput {
    /// Create an empty StepInput
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already resolved parameter map
    pub fn from_params(params: Map<String, Value>) -> Self {
        Self { params }
    }

    /// Add a parameter
    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Get a string parameter
    pub fn param_str(&self, key: &str) -> Result<String, CapabilityError> {
        self.param_str_opt(key)
            .ok_or_else(|| CapabilityError::MissingParameter(key.to_string()))
    }

    /// Get an optional string parameter
    pub fn param_str_opt(&self, key: &str) -> Option<String> {
        self.params
            .get(key)
            .and_then(|v| v.as_str())
            .map(String::from)
    }

    /// Get an optional unsigned integer parameter
    pub fn param_u64_opt(&self, key: &str) -> Option<u64> {
        self.params.get(key).and_then(|v| v.as_u64())
    }

    /// Get a parameter as a JSON value
    pub fn param_json(&self, key: &str) -> Result<&Value, CapabilityError> {
        self.params
            .get(key)
            .ok_or_else(|| CapabilityError::MissingParameter(key.to_string()))
    }

    /// Get a parameter that may be a single string or a list of strings
    ///
    /// Non-string scalars inside a list are stringified; nested values are
    /// dropped.
    pub fn param_str_list(&self, key: &str) -> Vec<String> {
        match self.params.get(key) {
            Some(value) => string_list(value),
            None => Vec::new(),
        }
    }

    /// All parameters except the listed keys
    pub fn remaining(&self, exclude: &[&str]) -> Map<String, Value> {
        self.params
            .iter()
            .filter(|(k, _)| !exclude.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Coerce a JSON value into a list of strings
///
/// A single string becomes a one-element list. Numbers and booleans are
/// stringified. Objects, arrays nested inside lists and nulls are dropped.
pub fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().filter_map(scalar_to_string).collect(),
        other => scalar_to_string(other).into_iter().collect(),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A downloadable resource attached to a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceLink {
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Provider-specific fields kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResourceLink {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            format: None,
            extra: Map::new(),
        }
    }
}

/// Dataset record returned by a search provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub resources: Vec<ResourceLink>,

    /// Provider-specific fields kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Dataset {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            resources: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Attach a resource
    pub fn with_resource(mut self, resource: ResourceLink) -> Self {
        self.resources.push(resource);
        self
    }
}

/// Query handed to a search provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub keywords: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

/// What a downloader should fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadRequest {
    /// Fetch a resource by URL
    Url(String),
    /// Fetch the primary resource of a dataset by identifier
    DatasetId(String),
}

impl std::fmt::Display for DownloadRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DownloadRequest::Url(url) => write!(f, "url {}", url),
            DownloadRequest::DatasetId(id) => write!(f, "dataset {}", id),
        }
    }
}

/// A file stored locally by a downloader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadedFile {
    pub file_path: PathBuf,

    /// Best-effort format guess (extension, content type or sniffing)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl DownloadedFile {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            format: None,
            source_url: None,
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

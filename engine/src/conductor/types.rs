//! Conductor plan types
//!
//! Steps, plans, parameter values (literal or deferred context reference)
//! and the logical capability names steps are dispatched on.

use crate::errors::OrchestratorError;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Matches `$key`, `$key[0]`, `$key.field` and `$key[0].field`
static PLACEHOLDER_PATTERN: OnceLock<Regex> = OnceLock::new();

fn placeholder_pattern() -> &'static Regex {
    PLACEHOLDER_PATTERN.get_or_init(|| {
        Regex::new(r"^\$([A-Za-z_][A-Za-z0-9_]*)(?:\[(\d+)\])?(?:\.([A-Za-z_][A-Za-z0-9_]*))?$")
            .expect("Invalid placeholder pattern")
    })
}

/// Deferred reference to a value a previous step stored in the context
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextRef {
    pub key: String,
    pub index: Option<usize>,
    pub field: Option<String>,
}

impl ContextRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            index: None,
            field: None,
        }
    }

    pub fn at(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Parse a placeholder string; `None` if it is not one
    pub fn parse(text: &str) -> Option<Self> {
        let caps = placeholder_pattern().captures(text)?;
        let index = match caps.get(2) {
            Some(m) => Some(m.as_str().parse::<usize>().ok()?),
            None => None,
        };
        Some(Self {
            key: caps[1].to_string(),
            index,
            field: caps.get(3).map(|m| m.as_str().to_string()),
        })
    }
}

impl fmt::Display for ContextRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.key)?;
        if let Some(index) = self.index {
            write!(f, "[{}]", index)?;
        }
        if let Some(ref field) = self.field {
            write!(f, ".{}", field)?;
        }
        Ok(())
    }
}

/// A step parameter: either a literal value or a context reference
///
/// On the wire a context reference is its placeholder string, so plans stay
/// plain JSON. A literal string that itself starts with `$` is written with
/// one extra leading `$` (`"$EUR"` becomes `"$$EUR"`) and unescaped on the
/// way back in, so it never turns into a reference.
///
/// Only a whole parameter value can be a reference. Placeholder-looking
/// strings nested inside lists or objects are literal text.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Literal(Value),
    ContextRef(ContextRef),
}

impl ParamValue {
    /// Classify a raw JSON value in wire form
    pub fn from_value(value: Value) -> Self {
        if let Value::String(ref s) = value {
            if let Some(unescaped) = s.strip_prefix("$$") {
                return ParamValue::Literal(Value::String(format!("${}", unescaped)));
            }
            if let Some(reference) = ContextRef::parse(s) {
                return ParamValue::ContextRef(reference);
            }
        }
        ParamValue::Literal(value)
    }

    /// Wire form, the inverse of `from_value`
    pub fn to_value(&self) -> Value {
        match self {
            ParamValue::Literal(Value::String(s)) if s.starts_with('$') => {
                Value::String(format!("${}", s))
            }
            ParamValue::Literal(v) => v.clone(),
            ParamValue::ContextRef(r) => Value::String(r.to_string()),
        }
    }
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        ParamValue::Literal(value)
    }
}

impl From<ContextRef> for ParamValue {
    fn from(reference: ContextRef) -> Self {
        ParamValue::ContextRef(reference)
    }
}

impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ParamValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(ParamValue::from_value)
    }
}

/// Step parameters, in insertion order
pub type Params = IndexMap<String, ParamValue>;

/// One planned capability invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Informational tag, e.g. `search_dataset`
    pub kind: String,

    /// Logical capability name the registry resolves, e.g. `parse.csv`
    pub capability: String,

    #[serde(default)]
    pub params: Params,
}

impl Step {
    pub fn new(kind: impl Into<String>, capability: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            capability: capability.into(),
            params: Params::new(),
        }
    }

    /// Add a literal parameter
    pub fn with_literal(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), ParamValue::Literal(value));
        self
    }

    /// Add a context reference parameter
    pub fn with_ref(mut self, key: impl Into<String>, reference: ContextRef) -> Self {
        self.params
            .insert(key.into(), ParamValue::ContextRef(reference));
        self
    }

    /// Build a step from a loosely shaped record
    ///
    /// Accepts `kind`, `action` or `type` for the kind, and `target` or
    /// `capability` for the capability (falling back to the kind). A `params`
    /// value that is not an object is wrapped as `{"value": ...}`.
    pub fn from_record(record: &Map<String, Value>) -> Self {
        let kind = ["kind", "action", "type"]
            .iter()
            .find_map(|k| record.get(*k).filter(|v| !v.is_null()))
            .map(value_to_name)
            .unwrap_or_default();

        let capability = ["target", "capability"]
            .iter()
            .find_map(|k| record.get(*k).filter(|v| !v.is_null()))
            .map(value_to_name)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| kind.clone());

        let params = match record.get("params") {
            None | Some(Value::Null) => Params::new(),
            Some(Value::Object(map)) => map
                .iter()
                .map(|(k, v)| (k.clone(), ParamValue::from_value(v.clone())))
                .collect(),
            Some(other) => {
                let mut params = Params::new();
                params.insert("value".to_string(), ParamValue::from_value(other.clone()));
                params
            }
        };

        Self {
            kind,
            capability,
            params,
        }
    }
}

fn value_to_name(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// Ordered sequence of steps; insertion order is execution order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan {
    pub steps: Vec<Step>,
}

impl Plan {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }

    /// Validate and load a plan produced outside the planner
    ///
    /// The top level must be an array and every element an object; anything
    /// else is a fatal `MalformedPlan`.
    pub fn from_value(value: &Value) -> Result<Self, OrchestratorError> {
        let items = value.as_array().ok_or_else(|| {
            OrchestratorError::MalformedPlan(format!(
                "expected a list of steps, got {}",
                json_type_name(value)
            ))
        })?;

        let steps = items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                item.as_object().map(Step::from_record).ok_or_else(|| {
                    OrchestratorError::MalformedPlan(format!(
                        "step at index {} is {}, expected an object",
                        idx,
                        json_type_name(item)
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { steps })
    }
}

impl<'a> IntoIterator for &'a Plan {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// File formats a parser package may offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseFormat {
    Csv,
    Json,
    GeoJson,
    Xml,
    Xls,
    Auto,
}

impl ParseFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseFormat::Csv => "csv",
            ParseFormat::Json => "json",
            ParseFormat::GeoJson => "geojson",
            ParseFormat::Xml => "xml",
            ParseFormat::Xls => "xls",
            ParseFormat::Auto => "auto",
        }
    }

    /// Map a format hint (declared format or file extension) to a parser
    pub fn from_hint(hint: &str) -> Self {
        match hint.trim().trim_start_matches('.').to_lowercase().as_str() {
            "csv" | "tsv" | "txt" => ParseFormat::Csv,
            "json" | "ndjson" => ParseFormat::Json,
            "geojson" | "geojsonl" | "geo" => ParseFormat::GeoJson,
            "xml" | "gml" => ParseFormat::Xml,
            "xls" | "xlsx" => ParseFormat::Xls,
            _ => ParseFormat::Auto,
        }
    }
}

/// Enrichment passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Enrichment {
    Temporal,
    Geo,
}

impl Enrichment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Enrichment::Temporal => "temporal",
            Enrichment::Geo => "geo",
        }
    }
}

/// Visualisation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualKind {
    Chart,
    Map,
}

impl VisualKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisualKind::Chart => "chart",
            VisualKind::Map => "map",
        }
    }

    /// Map a requested visualisation type to a kind
    pub fn from_hint(hint: &str) -> Option<Self> {
        match hint.trim().to_lowercase().as_str() {
            "chart" | "summary_chart" | "graph" => Some(VisualKind::Chart),
            "map" | "heatmap" | "animation" => Some(VisualKind::Map),
            _ => None,
        }
    }
}

/// Logical capability a step is dispatched to
///
/// `Parse(None)` and `Visualize(None)` pick their variant at execution time
/// from the step's parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Search,
    Download,
    Parse(Option<ParseFormat>),
    Enrich(Enrichment),
    Visualize(Option<VisualKind>),
    Summarize,
}

/// Every accepted spelling, including the dotted provider targets and verbs
/// older intent extractors emit
const CAPABILITY_NAMES: &[(&str, Capability)] = &[
    ("search", Capability::Search),
    ("search_dataset", Capability::Search),
    ("search_datasets", Capability::Search),
    ("datagouv_api.search", Capability::Search),
    ("datagouv_api.search_datasets", Capability::Search),
    ("download", Capability::Download),
    ("download_dataset", Capability::Download),
    ("download_resource", Capability::Download),
    ("download_file", Capability::Download),
    ("downloader.download", Capability::Download),
    ("parse", Capability::Parse(None)),
    ("parse_file", Capability::Parse(None)),
    ("parse_dataset", Capability::Parse(None)),
    ("parse.csv", Capability::Parse(Some(ParseFormat::Csv))),
    ("csv_parser.parse", Capability::Parse(Some(ParseFormat::Csv))),
    ("parse.json", Capability::Parse(Some(ParseFormat::Json))),
    ("json_parser.parse", Capability::Parse(Some(ParseFormat::Json))),
    ("parse.geojson", Capability::Parse(Some(ParseFormat::GeoJson))),
    ("geojson_parser.parse", Capability::Parse(Some(ParseFormat::GeoJson))),
    ("parse.xml", Capability::Parse(Some(ParseFormat::Xml))),
    ("xml_parser.parse", Capability::Parse(Some(ParseFormat::Xml))),
    ("parse.xls", Capability::Parse(Some(ParseFormat::Xls))),
    ("xls_parser.parse", Capability::Parse(Some(ParseFormat::Xls))),
    ("parse.auto", Capability::Parse(Some(ParseFormat::Auto))),
    ("file_utils.auto_parse", Capability::Parse(Some(ParseFormat::Auto))),
    ("enrich.temporal", Capability::Enrich(Enrichment::Temporal)),
    ("enrich_temporal", Capability::Enrich(Enrichment::Temporal)),
    ("temporal_utils.enrich_time_columns", Capability::Enrich(Enrichment::Temporal)),
    ("enrich.geo", Capability::Enrich(Enrichment::Geo)),
    ("enrich_geo", Capability::Enrich(Enrichment::Geo)),
    ("geo_utils.enrich_geometries", Capability::Enrich(Enrichment::Geo)),
    ("visualize", Capability::Visualize(None)),
    ("visualise", Capability::Visualize(None)),
    ("generate_visualization", Capability::Visualize(None)),
    ("generate_visualisation", Capability::Visualize(None)),
    ("visualize.chart", Capability::Visualize(Some(VisualKind::Chart))),
    ("generate_chart", Capability::Visualize(Some(VisualKind::Chart))),
    ("visualizer.summary_chart", Capability::Visualize(Some(VisualKind::Chart))),
    ("visualize.map", Capability::Visualize(Some(VisualKind::Map))),
    ("generate_map", Capability::Visualize(Some(VisualKind::Map))),
    ("visualizer.map_animator", Capability::Visualize(Some(VisualKind::Map))),
    ("summarize", Capability::Summarize),
    ("summarise", Capability::Summarize),
    ("summarization", Capability::Summarize),
];

impl Capability {
    /// Provider family this capability belongs to
    pub fn family(&self) -> &'static str {
        match self {
            Capability::Search => "search",
            Capability::Download => "download",
            Capability::Parse(_) => "parse",
            Capability::Enrich(_) => "enrich",
            Capability::Visualize(_) => "visualize",
            Capability::Summarize => "summarize",
        }
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        CAPABILITY_NAMES
            .iter()
            .find(|(name, _)| *name == needle)
            .map(|(_, capability)| *capability)
            .ok_or_else(|| s.trim().to_string())
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Parse(Some(format)) => write!(f, "parse.{}", format.as_str()),
            Capability::Enrich(kind) => write!(f, "enrich.{}", kind.as_str()),
            Capability::Visualize(Some(kind)) => write!(f, "visualize.{}", kind.as_str()),
            other => write!(f, "{}", other.family()),
        }
    }
}

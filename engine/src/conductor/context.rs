//! Execution Context
//!
//! Per-run store for the outputs of previous steps. Later steps reach into it
//! through placeholders such as `$last_file.file_path`. One context is
//! created per plan execution and dropped with it.

use crate::conductor::types::{ContextRef, ParamValue, Params};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Datasets returned by the last search
pub const DATASETS: &str = "datasets";
/// File descriptor returned by the last download
pub const LAST_FILE: &str = "last_file";
/// Output of the last parse or enrichment
pub const LAST_DATA: &str = "last_data";
/// Artifact reference returned by the last visualisation
pub const LAST_VISUALISATION: &str = "last_visualisation";
/// Text returned by the last summarization
pub const LAST_SUMMARY: &str = "last_summary";

#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    slots: HashMap<String, Value>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a slot
    pub fn set(&mut self, key: &str, value: Value) {
        self.slots.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.slots.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Follow a context reference
    ///
    /// Returns `None` when the slot is absent, the index is out of range or
    /// not applied to a list, or the field is missing or not applied to an
    /// object.
    pub fn resolve(&self, reference: &ContextRef) -> Option<Value> {
        let mut value = self.slots.get(&reference.key)?;
        if let Some(index) = reference.index {
            value = value.as_array()?.get(index)?;
        }
        if let Some(ref field) = reference.field {
            value = value.as_object()?.get(field)?;
        }
        Some(value.clone())
    }

    /// Resolve a whole parameter map
    ///
    /// Literals are copied as-is, including any placeholder-looking strings
    /// nested inside them; only whole-value references are followed.
    /// References that cannot be followed are left out of the resolved map
    /// and reported back as `(param, reference)` pairs.
    pub fn resolve_params(&self, params: &Params) -> (Map<String, Value>, Vec<(String, ContextRef)>) {
        let mut resolved = Map::new();
        let mut unresolved = Vec::new();

        for (name, param) in params {
            match param {
                ParamValue::Literal(value) => {
                    resolved.insert(name.clone(), value.clone());
                }
                ParamValue::ContextRef(reference) => match self.resolve(reference) {
                    Some(value) => {
                        resolved.insert(name.clone(), value);
                    }
                    None => unresolved.push((name.clone(), reference.clone())),
                },
            }
        }

        (resolved, unresolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> ExecutionContext {
        let mut ctx = ExecutionContext::new();
        ctx.set(
            DATASETS,
            json!([{"id": "d1", "resources": [{"url": "https://example.org/a.csv"}]}]),
        );
        ctx.set(LAST_FILE, json!({"file_path": "/tmp/a.csv"}));
        ctx
    }

    #[test]
    fn test_resolve_forms() {
        let ctx = context();
        assert_eq!(
            ctx.resolve(&ContextRef::new(LAST_FILE).field("file_path")),
            Some(json!("/tmp/a.csv"))
        );
        assert_eq!(
            ctx.resolve(&ContextRef::new(DATASETS).at(0).field("id")),
            Some(json!("d1"))
        );
        assert!(ctx.resolve(&ContextRef::new(DATASETS)).unwrap().is_array());
    }

    #[test]
    fn test_unresolvable_references() {
        let ctx = context();
        assert_eq!(ctx.resolve(&ContextRef::new(LAST_DATA)), None);
        assert_eq!(ctx.resolve(&ContextRef::new(DATASETS).at(3)), None);
        assert_eq!(ctx.resolve(&ContextRef::new(LAST_FILE).at(0)), None);
        assert_eq!(ctx.resolve(&ContextRef::new(LAST_FILE).field("url")), None);
        assert_eq!(ctx.resolve(&ContextRef::new(DATASETS).field("id")), None);
    }

    #[test]
    fn test_resolve_params_omits_unresolved() {
        let mut params = Params::new();
        params.insert("data".to_string(), ContextRef::new(LAST_DATA).into());
        params.insert("title".to_string(), json!("Population").into());
        params.insert(
            "resource".to_string(),
            ContextRef::new(DATASETS).at(0).into(),
        );

        let (resolved, unresolved) = context().resolve_params(&params);
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved["title"], json!("Population"));
        assert_eq!(resolved["resource"]["id"], json!("d1"));
        assert_eq!(unresolved, vec![("data".to_string(), ContextRef::new(LAST_DATA))]);
    }

    #[test]
    fn test_nested_placeholders_pass_through_unresolved() {
        let mut params = Params::new();
        params.insert(
            "keywords".to_string(),
            ParamValue::from_value(json!(["$datasets[0].id", "budget"])),
        );

        let (resolved, unresolved) = context().resolve_params(&params);
        assert_eq!(resolved["keywords"], json!(["$datasets[0].id", "budget"]));
        assert!(unresolved.is_empty());
    }

    #[test]
    fn test_set_overwrites() {
        let mut ctx = ExecutionContext::new();
        ctx.set(LAST_DATA, json!(1));
        ctx.set(LAST_DATA, json!(2));
        assert_eq!(ctx.get(LAST_DATA), Some(&json!(2)));
        assert_eq!(ctx.len(), 1);
    }
}

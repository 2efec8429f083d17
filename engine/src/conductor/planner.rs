//! Conductor Planner
//!
//! Turns an `IntentRecord` into an ordered `Plan`. Planning is pure and
//! never fails: an intent that dictates its own actions is passed through,
//! anything else is planned from its normalized entities and goal text.

use crate::conductor::context::{DATASETS, LAST_DATA, LAST_FILE};
use crate::conductor::intent::{Entities, IntentRecord};
use crate::conductor::types::{
    Capability, ContextRef, Enrichment, ParseFormat, Plan, Step, VisualKind,
};
use crate::config::PlannerConfig;
use serde_json::{json, Value};
use tracing::debug;

pub struct Planner {
    config: PlannerConfig,
}

impl Default for Planner {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}

impl Planner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    /// Generate a plan for an intent
    pub fn generate_plan(&self, intent: &IntentRecord) -> Plan {
        if let Some(Value::Array(actions)) = &intent.actions {
            if !actions.is_empty() {
                let plan = Self::pass_through(actions);
                debug!(
                    "Using {} explicit action(s) from intent as plan ({} step(s))",
                    actions.len(),
                    plan.len()
                );
                return plan;
            }
        }

        let plan = self.infer(intent);
        debug!(
            "Inferred plan: {}",
            plan.iter()
                .map(|s| s.capability.as_str())
                .collect::<Vec<_>>()
                .join(" -> ")
        );
        plan
    }

    /// One step per object action, in order; anything else is skipped
    fn pass_through(actions: &[Value]) -> Plan {
        Plan::new(
            actions
                .iter()
                .filter_map(Value::as_object)
                .map(Step::from_record)
                .collect(),
        )
    }

    fn infer(&self, intent: &IntentRecord) -> Plan {
        let entities = intent.normalized_entities();
        let goal = intent.goal_text().to_lowercase();
        let mut steps = Vec::new();

        let searched = (entities.has_keywords() || entities.dataset_name.is_some())
            && entities.dataset_id.is_none();

        if searched {
            steps.push(search_step(&entities));
            steps.push(
                Step::new("download_dataset", Capability::Download.to_string())
                    .with_ref("resource", ContextRef::new(DATASETS).at(0)),
            );
        } else if let Some(ref id) = entities.dataset_id {
            steps.push(
                Step::new("download_dataset", Capability::Download.to_string())
                    .with_literal("dataset_id", id.clone()),
            );
        }

        steps.push(
            Step::new(
                "parse_dataset",
                Capability::Parse(Some(parse_format(&entities))).to_string(),
            )
            .with_ref("file_path", ContextRef::new(LAST_FILE).field("file_path")),
        );

        if contains_any(&goal, &self.config.temporal_triggers) {
            steps.push(data_step(
                "enrich_temporal",
                Capability::Enrich(Enrichment::Temporal),
            ));
        }

        if contains_any(&goal, &self.config.geo_triggers) {
            steps.push(data_step("enrich_geo", Capability::Enrich(Enrichment::Geo)));
        }

        let requested = entities.visualisations();
        if matches_any(&requested, &self.config.map_terms) {
            steps.push(data_step(
                "generate_map",
                Capability::Visualize(Some(VisualKind::Map)),
            ));
        }
        if matches_any(&requested, &self.config.chart_terms) {
            steps.push(data_step(
                "generate_chart",
                Capability::Visualize(Some(VisualKind::Chart)),
            ));
        }

        Plan::new(steps)
    }
}

fn search_step(entities: &Entities) -> Step {
    let mut step = Step::new("search_dataset", Capability::Search.to_string());
    if let Some(ref keywords) = entities.keywords {
        step = step.with_literal("keywords", json!(keywords));
    }
    if let Some(ref name) = entities.dataset_name {
        step = step.with_literal("dataset_name", name.clone());
    }
    if let Some(ref theme) = entities.theme {
        step = step.with_literal("theme", theme.clone());
    }
    if let Some(ref location) = entities.location {
        step = step.with_literal("location", location.clone());
    }
    if let Some(ref range) = entities.date_range {
        step = step.with_literal("date_range", Value::Object(range.clone()));
    }
    step
}

fn data_step(kind: &str, capability: Capability) -> Step {
    Step::new(kind, capability.to_string()).with_ref("data", ContextRef::new(LAST_DATA))
}

fn parse_format(entities: &Entities) -> ParseFormat {
    match entities.file_format.as_deref() {
        Some("csv" | "tsv" | "txt") => ParseFormat::Csv,
        Some("json") => ParseFormat::Json,
        Some("geojson" | "geo") => ParseFormat::GeoJson,
        _ => ParseFormat::Auto,
    }
}

fn contains_any(text: &str, terms: &[String]) -> bool {
    terms
        .iter()
        .any(|term| text.contains(term.to_lowercase().as_str()))
}

fn matches_any(requested: &[String], terms: &[String]) -> bool {
    requested
        .iter()
        .any(|r| terms.iter().any(|t| t.to_lowercase() == *r))
}

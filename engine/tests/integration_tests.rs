//! End-to-end tests for planning and execution
//!
//! Mock providers record what they were called with so tests can check how
//! data flows between steps through the context.

use async_trait::async_trait;
use datapilot_engine::conductor::{
    CapabilityRegistry, ContextRef, Enrichment, EventSink, ExecutionEvent, Executor,
    IntentRecord, Orchestrator, ParseFormat, Plan, Planner, RecordingSink, Step, StepStatus,
    VisualKind,
};
use datapilot_engine::config::{Config, PlannerConfig};
use datapilot_engine::errors::OrchestratorError;
use sdk::capability::{
    CapabilityResult, Downloader, FnHandler, Parser, SearchProvider, Summarizer, Visualizer,
};
use sdk::errors::CapabilityError;
use sdk::types::{Dataset, DownloadRequest, DownloadedFile, ResourceLink, SearchQuery};
use serde_json::{json, Map, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Search provider returning one dataset per keyword
#[derive(Default)]
struct MockSearch {
    queries: Mutex<Vec<SearchQuery>>,
}

#[async_trait]
impl SearchProvider for MockSearch {
    async fn search(&self, query: &SearchQuery) -> CapabilityResult<Vec<Dataset>> {
        self.queries.lock().unwrap().push(query.clone());
        Ok(query
            .keywords
            .iter()
            .map(|k| {
                Dataset::new(format!("ds-{}", k), k.clone())
                    .with_resource(ResourceLink::new(format!("https://data.example/{}.csv", k)))
            })
            .collect())
    }
}

/// Downloader that "saves" every URL under /tmp
#[derive(Default)]
struct MockDownloader {
    requests: Mutex<Vec<DownloadRequest>>,
}

#[async_trait]
impl Downloader for MockDownloader {
    async fn download(&self, request: &DownloadRequest) -> CapabilityResult<DownloadedFile> {
        self.requests.lock().unwrap().push(request.clone());
        let name = match request {
            DownloadRequest::Url(url) => url.rsplit('/').next().unwrap_or("file").to_string(),
            DownloadRequest::DatasetId(id) => format!("{}.csv", id),
        };
        Ok(DownloadedFile::new(format!("/tmp/{}", name)))
    }
}

/// Parser returning rows tagged with the path it read
struct MockParser;

#[async_trait]
impl Parser for MockParser {
    async fn parse(&self, file_path: &Path) -> CapabilityResult<Value> {
        Ok(json!({"source": file_path, "rows": [{"commune": "Lyon", "population": 522250}]}))
    }
}

/// Parser that always fails
struct BrokenParser;

#[async_trait]
impl Parser for BrokenParser {
    async fn parse(&self, file_path: &Path) -> CapabilityResult<Value> {
        Err(CapabilityError::Format(file_path.display().to_string()))
    }
}

/// Visualizer recording the options it received
#[derive(Default)]
struct MockMap {
    options: Mutex<Vec<Map<String, Value>>>,
}

#[async_trait]
impl Visualizer for MockMap {
    async fn render(&self, data: &Value, options: &Map<String, Value>) -> CapabilityResult<Value> {
        self.options.lock().unwrap().push(options.clone());
        Ok(json!({"artifact": "map.html", "rows": data["rows"].as_array().map(Vec::len)}))
    }
}

struct EchoSummarizer;

#[async_trait]
impl Summarizer for EchoSummarizer {
    async fn summarize(&self, _data: &Value, question: &str) -> CapabilityResult<String> {
        Ok(format!("Answer to: {}", question))
    }
}

fn full_registry() -> CapabilityRegistry {
    CapabilityRegistry::empty()
        .with_search(MockSearch::default())
        .with_downloader(MockDownloader::default())
        .with_parser(ParseFormat::Auto, MockParser)
        .with_parser(ParseFormat::Csv, MockParser)
        .with_enricher(
            Enrichment::Geo,
            FnHandler::enricher(|data: &Value| {
                let mut data = data.clone();
                data["geo"] = json!(true);
                Ok(data)
            }),
        )
        .with_visualizer(VisualKind::Map, MockMap::default())
        .with_summarizer(EchoSummarizer)
}

fn capabilities(plan: &Plan) -> Vec<&str> {
    plan.iter().map(|s| s.capability.as_str()).collect()
}

#[tokio::test]
async fn test_population_map_end_to_end() {
    let intent = IntentRecord::from(json!({
        "entities": {"keywords": ["population"], "visualisation": ["map"]}
    }));
    let plan = Planner::default().generate_plan(&intent);
    assert_eq!(
        capabilities(&plan),
        vec!["search", "download", "parse.auto", "visualize.map"]
    );

    let result = Executor::new(Arc::new(full_registry()))
        .execute(&plan, "population map")
        .await
        .unwrap();

    assert!(result.is_success(), "{:?}", result.errors);
    assert_eq!(result.datasets.len(), 1);
    assert_eq!(result.files[0].path(), Path::new("/tmp/population.csv"));
    assert_eq!(result.data[0]["source"], json!("/tmp/population.csv"));
    assert_eq!(result.visualisations[0]["artifact"], json!("map.html"));
    assert_eq!(result.visualisations[0]["rows"], json!(1));
}

#[tokio::test]
async fn test_geo_goal_enriches_before_map() {
    let intent = IntentRecord::from(json!({
        "goal": "Carte de la population",
        "entities": {"keywords": ["population"], "visualisation": ["map"]}
    }));
    let plan = Planner::default().generate_plan(&intent);
    assert_eq!(
        capabilities(&plan),
        vec!["search", "download", "parse.auto", "enrich.geo", "visualize.map"]
    );

    let result = Executor::new(Arc::new(full_registry()))
        .execute(&plan, "")
        .await
        .unwrap();
    assert!(result.is_success(), "{:?}", result.errors);
    assert_eq!(result.data.len(), 2);
    assert_eq!(result.data[1]["geo"], json!(true));
}

#[tokio::test]
async fn test_dataset_id_downloads_directly() {
    let downloader = Arc::new(MockDownloader::default());
    let mut registry = full_registry();
    registry.download = Some(Arc::clone(&downloader) as Arc<dyn Downloader>);

    let plan = Planner::default().generate_plan(&IntentRecord::from(json!({
        "entities": {"dataset_id": "abc", "format": "csv"}
    })));
    assert_eq!(capabilities(&plan), vec!["download", "parse.csv"]);

    let result = Executor::new(Arc::new(registry))
        .execute(&plan, "")
        .await
        .unwrap();
    assert!(result.is_success(), "{:?}", result.errors);
    assert_eq!(
        *downloader.requests.lock().unwrap(),
        vec![DownloadRequest::DatasetId("abc".to_string())]
    );
}

#[tokio::test]
async fn test_failed_step_leaves_context_untouched() {
    // The failing parse must not overwrite last_data from the first parse
    let registry = full_registry()
        .with_parser(ParseFormat::Json, BrokenParser)
        .with_visualizer(VisualKind::Map, MockMap::default());

    let plan = Plan::new(vec![
        Step::new("parse", "parse.csv").with_literal("file_path", json!("/tmp/a.csv")),
        Step::new("parse", "parse.json").with_literal("file_path", json!("/tmp/b.json")),
        Step::new("map", "visualize.map").with_ref("data", ContextRef::new("last_data")),
    ]);

    let result = Executor::new(Arc::new(registry))
        .execute(&plan, "")
        .await
        .unwrap();

    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("/tmp/b.json"));
    assert_eq!(result.data.len(), 1);
    assert_eq!(result.visualisations.len(), 1);
    assert_eq!(result.visualisations[0]["rows"], json!(1));
}

#[tokio::test]
async fn test_independent_steps_one_failure_one_success() {
    let registry = CapabilityRegistry::empty()
        .with_parser(ParseFormat::Csv, BrokenParser)
        .with_summarizer(EchoSummarizer);

    let intent = IntentRecord::from(json!({
        "actions": [
            {"action": "parse_file", "target": "parse.csv", "params": {"file_path": "/tmp/x.csv"}},
            {"action": "summarize", "params": {"data": [1, 2, 3]}}
        ]
    }));
    let plan = Planner::default().generate_plan(&intent);
    assert_eq!(plan.len(), 2);

    let result = Executor::new(Arc::new(registry))
        .execute(&plan, "what changed?")
        .await
        .unwrap();

    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.summary.as_deref(), Some("Answer to: what changed?"));
    assert!(result.is_partial());
}

#[tokio::test]
async fn test_missing_family_aborts_without_partial_result() {
    let registry = CapabilityRegistry::empty().with_search(MockSearch::default());
    let sink = Arc::new(RecordingSink::new());

    let plan = Plan::new(vec![
        Step::new("search_dataset", "search").with_literal("keywords", json!(["x"])),
        Step::new("download_dataset", "download")
            .with_ref("resource", ContextRef::new("datasets").at(0)),
        Step::new("summarize", "summarize").with_literal("data", json!([])),
    ]);

    let err = Executor::new(Arc::new(registry))
        .with_sink(Arc::clone(&sink) as Arc<dyn EventSink>)
        .execute(&plan, "")
        .await
        .unwrap_err();

    assert!(matches!(err, OrchestratorError::MissingProvider { ref family } if family == "download"));

    let events = sink.events();
    assert!(matches!(
        events.last(),
        Some(ExecutionEvent::PlanAborted { index: 1, .. })
    ));
    // The summarize step never started
    assert!(!events.iter().any(|e| matches!(
        e,
        ExecutionEvent::StepStarted { index: 2, .. }
    )));
}

#[tokio::test]
async fn test_missing_variant_is_not_fatal() {
    let registry = full_registry();
    let plan = Plan::new(vec![
        Step::new("chart", "visualize.chart").with_literal("data", json!([])),
        Step::new("summarize", "summarize").with_literal("data", json!([])),
    ]);

    let result = Executor::new(Arc::new(registry))
        .execute(&plan, "q")
        .await
        .unwrap();
    assert_eq!(
        result.errors,
        vec!["Provider 'visualize' has no 'chart' handler"]
    );
    assert!(result.summary.is_some());
}

#[tokio::test]
async fn test_unresolved_placeholder_is_reported() {
    let sink = Arc::new(RecordingSink::new());
    let plan = Plan::new(vec![Step::new("parse_dataset", "parse.auto")
        .with_ref("file_path", ContextRef::new("last_file").field("file_path"))]);

    let result = Executor::new(Arc::new(full_registry()))
        .with_sink(Arc::clone(&sink) as Arc<dyn EventSink>)
        .execute(&plan, "")
        .await
        .unwrap();

    assert_eq!(result.errors, vec!["Missing parameter: file_path"]);
    let events = sink.events();
    assert!(events.contains(&ExecutionEvent::PlaceholderUnresolved {
        index: 0,
        param: "file_path".to_string(),
        placeholder: "$last_file.file_path".to_string(),
    }));
    assert!(events.iter().any(|e| matches!(
        e,
        ExecutionEvent::StepFinished {
            status: StepStatus::Failed,
            ..
        }
    )));
}

#[tokio::test]
async fn test_visualize_receives_extra_params_as_options() {
    let map = Arc::new(MockMap::default());
    let mut registry = CapabilityRegistry::empty();
    registry.visualize = Some(
        [(VisualKind::Map, Arc::clone(&map) as Arc<dyn Visualizer>)]
            .into_iter()
            .collect(),
    );

    let plan = Plan::new(vec![Step::new("viz", "visualize")
        .with_literal("type", json!("heatmap"))
        .with_literal("title", json!("Densité"))
        .with_literal("data", json!({"rows": []}))]);

    let result = Executor::new(Arc::new(registry))
        .execute(&plan, "")
        .await
        .unwrap();
    assert!(result.is_success(), "{:?}", result.errors);

    let options = map.options.lock().unwrap();
    assert_eq!(options[0]["title"], json!("Densité"));
    assert!(!options[0].contains_key("data"));
}

#[tokio::test]
async fn test_reloaded_plan_keeps_dollar_literals() {
    let map = Arc::new(MockMap::default());
    let mut registry = CapabilityRegistry::empty();
    registry.visualize = Some(
        [(VisualKind::Map, Arc::clone(&map) as Arc<dyn Visualizer>)]
            .into_iter()
            .collect(),
    );

    let plan = Plan::new(vec![Step::new("viz", "visualize.map")
        .with_literal("unit", json!("$EUR"))
        .with_literal("data", json!({"rows": []}))]);
    let saved = serde_json::to_string(&plan).unwrap();
    let reloaded = Plan::from_value(&serde_json::from_str(&saved).unwrap()).unwrap();
    assert_eq!(reloaded, plan);

    let result = Executor::new(Arc::new(registry))
        .execute(&reloaded, "")
        .await
        .unwrap();
    assert!(result.is_success(), "{:?}", result.errors);

    let options = map.options.lock().unwrap();
    assert_eq!(options[0]["unit"], json!("$EUR"));
}

#[tokio::test]
async fn test_orchestrator_attaches_plan() {
    let extractor = FnHandler::extractor(|question: &str| {
        Ok(json!({
            "goal": question,
            "entities": {"mots_clés": ["population"], "visualisation": "carte"}
        }))
    });
    let mut config = Config::default();
    config.executor.emit_events = false;

    let orchestrator =
        Orchestrator::from_config(Arc::new(extractor), Arc::new(full_registry()), &config);
    let result = orchestrator
        .process_question("Population par commune")
        .await
        .unwrap();

    let plan = result.plan.as_ref().unwrap();
    assert_eq!(
        capabilities(plan),
        vec!["search", "download", "parse.auto", "visualize.map"]
    );

    let value = serde_json::to_value(&result).unwrap();
    assert!(value.get("errors").is_none());
    assert!(value.get("summary").is_none());
    assert_eq!(value["plan"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_channel_events_stream() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let orchestrator = Orchestrator::new(
        Arc::new(FnHandler::extractor(|_: &str| {
            Ok(json!({"entities": {"dataset": "abc"}}))
        })),
        Arc::new(full_registry()),
        PlannerConfig::default(),
    )
    .with_sink(Arc::new(tx));

    orchestrator.process_question("abc").await.unwrap();
    drop(orchestrator);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    assert_eq!(events.first(), Some(&ExecutionEvent::PlanStarted { steps: 2 }));
    assert_eq!(
        events.last(),
        Some(&ExecutionEvent::PlanCompleted {
            succeeded: 2,
            failed: 0
        })
    );
}

//! Example demonstrating a full question-to-result run
//!
//! This example shows how to:
//! - Wire closure and struct providers into a `CapabilityRegistry`
//! - Answer a question through the `Orchestrator`
//! - Stream execution events over a channel
//!
//! No network access is needed: every provider is an in-memory stand-in.

use async_trait::async_trait;
use datapilot_engine::conductor::{
    CapabilityRegistry, Enrichment, Orchestrator, ParseFormat, VisualKind,
};
use datapilot_engine::config::PlannerConfig;
use datapilot_engine::telemetry::init_telemetry_with_level;
use sdk::capability::{CapabilityResult, FnHandler, Parser};
use sdk::types::{Dataset, DownloadRequest, DownloadedFile, ResourceLink};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;

/// Pretends every file is a small population table
struct PopulationCsv;

#[async_trait]
impl Parser for PopulationCsv {
    async fn parse(&self, file_path: &Path) -> CapabilityResult<Value> {
        Ok(json!({
            "source": file_path,
            "rows": [
                {"commune": "Lyon", "year": 2020, "population": 522250},
                {"commune": "Rennes", "year": 2020, "population": 222485}
            ]
        }))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_telemetry_with_level("info");
    println!("=== Simple Pipeline Example ===\n");

    let registry = CapabilityRegistry::empty()
        .with_search(FnHandler::search(|query| {
            Ok(vec![Dataset::new("pop-2020", query.keywords.join(" "))
                .with_resource(ResourceLink::new("https://data.example/population.csv"))])
        }))
        .with_downloader(FnHandler::download(|request| match request {
            DownloadRequest::Url(url) => Ok(DownloadedFile::new("/tmp/population.csv")
                .with_format("csv")
                .with_source_url(url.clone())),
            DownloadRequest::DatasetId(id) => Ok(DownloadedFile::new(format!("/tmp/{}.csv", id))),
        }))
        .with_parser(ParseFormat::Auto, PopulationCsv)
        .with_parser(ParseFormat::Csv, PopulationCsv)
        .with_enricher(
            Enrichment::Geo,
            FnHandler::enricher(|data| {
                let mut data = data.clone();
                data["crs"] = json!("EPSG:4326");
                Ok(data)
            }),
        )
        .with_visualizer(
            VisualKind::Map,
            FnHandler::visualizer(|_, options| Ok(json!({"artifact": "map.html", "options": options}))),
        )
        .with_summarizer(FnHandler::summarizer(|data, question| {
            let rows = data["rows"].as_array().map(Vec::len).unwrap_or(0);
            Ok(format!("{} row(s) considered for: {}", rows, question))
        }));

    // Stand-in for the language-understanding step
    let extractor = FnHandler::extractor(|question| {
        Ok(json!({
            "goal": question,
            "entities": {"mots_clés": ["population"], "visualisation": ["carte"]}
        }))
    });

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let orchestrator = Orchestrator::new(
        Arc::new(extractor),
        Arc::new(registry),
        PlannerConfig::default(),
    )
    .with_sink(Arc::new(tx));

    let result = orchestrator
        .process_question("Carte de la population par commune")
        .await?;
    drop(orchestrator);

    println!("Events:");
    while let Some(event) = rx.recv().await {
        println!("  {}", serde_json::to_string(&event)?);
    }

    println!("\nResult:");
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

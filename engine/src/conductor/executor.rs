//! Conductor Executor
//!
//! Runs a `Plan` step by step against the capability registry. Each step's
//! parameters are resolved against the per-run context, the step is
//! dispatched to its handler, and the output is recorded in both the context
//! and the aggregate result.
//!
//! A step that fails is recorded in `errors` and execution moves on. Only a
//! fatal `OrchestratorError` (a whole capability family is missing) stops the
//! run, and then no partial result is returned.

use crate::conductor::context::{
    ExecutionContext, DATASETS, LAST_DATA, LAST_FILE, LAST_SUMMARY, LAST_VISUALISATION,
};
use crate::conductor::events::{EventSink, ExecutionEvent, NullSink, StepStatus};
use crate::conductor::registry::{CapabilityRegistry, Handler};
use crate::conductor::result::AggregateResult;
use crate::conductor::types::{Capability, ParseFormat, Plan, Step, VisualKind};
use crate::errors::{OrchestratorError, StepError};
use sdk::errors::CapabilityError;
use sdk::types::{Dataset, DownloadRequest, DownloadedFile, SearchQuery, StepInput};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// What a successful step produced
#[derive(Debug)]
enum StepOutput {
    Datasets(Vec<Dataset>),
    File(DownloadedFile),
    Data(Value),
    Visualisation(Value),
    Summary(String),
}

impl StepOutput {
    /// Store the output in its context slot and result member
    ///
    /// The slot value is built before anything is written, so a failure
    /// leaves both untouched.
    fn record(
        self,
        context: &mut ExecutionContext,
        result: &mut AggregateResult,
    ) -> Result<(), StepError> {
        match self {
            StepOutput::Datasets(datasets) => {
                context.set(DATASETS, to_slot(&datasets)?);
                result.datasets.extend(datasets);
            }
            StepOutput::File(file) => {
                context.set(LAST_FILE, to_slot(&file)?);
                result.files.push(file);
            }
            StepOutput::Data(data) => {
                context.set(LAST_DATA, data.clone());
                result.data.push(data);
            }
            StepOutput::Visualisation(artifact) => {
                context.set(LAST_VISUALISATION, artifact.clone());
                result.visualisations.push(artifact);
            }
            StepOutput::Summary(summary) => {
                context.set(LAST_SUMMARY, Value::String(summary.clone()));
                result.summary = Some(summary);
            }
        }
        Ok(())
    }
}

fn to_slot<T: Serialize>(value: &T) -> Result<Value, StepError> {
    serde_json::to_value(value).map_err(|e| {
        StepError::Capability(CapabilityError::Format(format!(
            "provider output cannot be stored: {}",
            e
        )))
    })
}

/// Executes plans against a capability registry
pub struct Executor {
    registry: Arc<CapabilityRegistry>,
    sink: Arc<dyn EventSink>,
}

impl Executor {
    pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
        Self {
            registry,
            sink: Arc::new(NullSink),
        }
    }

    /// Report execution events to the given sink
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Execute every step of a plan in order
    ///
    /// The question is handed to the summarizer. The returned result does
    /// not include the plan; callers attach it if they want it.
    pub async fn execute(
        &self,
        plan: &Plan,
        question: &str,
    ) -> Result<AggregateResult, OrchestratorError> {
        let start = Instant::now();
        let total = plan.len();
        info!("Executing plan with {} step(s)", total);
        self.sink.emit(ExecutionEvent::PlanStarted { steps: total });

        let mut context = ExecutionContext::new();
        let mut result = AggregateResult::new();
        let mut succeeded = 0;
        let mut failed = 0;

        for (index, step) in plan.iter().enumerate() {
            info!(
                "Step {}/{}: {} ({})",
                index + 1,
                total,
                step.kind,
                step.capability
            );
            self.sink.emit(ExecutionEvent::StepStarted {
                index,
                kind: step.kind.clone(),
                capability: step.capability.clone(),
            });

            let (params, unresolved) = context.resolve_params(&step.params);
            for (param, reference) in unresolved {
                warn!(
                    "Step {}: placeholder {} for '{}' did not resolve, parameter omitted",
                    index + 1,
                    reference,
                    param
                );
                self.sink.emit(ExecutionEvent::PlaceholderUnresolved {
                    index,
                    param,
                    placeholder: reference.to_string(),
                });
            }
            let input = StepInput::from_params(params);

            let outcome = match self.run_step(step, &input, question).await {
                Ok(outcome) => outcome,
                Err(fatal) => {
                    error!("Aborting plan at step {}: {}", index + 1, fatal);
                    self.sink.emit(ExecutionEvent::PlanAborted {
                        index,
                        reason: fatal.to_string(),
                    });
                    return Err(fatal);
                }
            };

            match outcome.and_then(|output| output.record(&mut context, &mut result)) {
                Ok(()) => {
                    succeeded += 1;
                    debug!("Step {} succeeded", index + 1);
                    self.sink.emit(ExecutionEvent::StepFinished {
                        index,
                        capability: step.capability.clone(),
                        status: StepStatus::Succeeded,
                        error: None,
                    });
                }
                Err(e) => {
                    failed += 1;
                    warn!("Step {} failed: {}", index + 1, e);
                    let message = e.to_string();
                    result.errors.push(message.clone());
                    self.sink.emit(ExecutionEvent::StepFinished {
                        index,
                        capability: step.capability.clone(),
                        status: StepStatus::Failed,
                        error: Some(message),
                    });
                }
            }
        }

        info!(
            "Plan finished in {:.2}s: {} succeeded, {} failed",
            start.elapsed().as_secs_f64(),
            succeeded,
            failed
        );
        self.sink
            .emit(ExecutionEvent::PlanCompleted { succeeded, failed });

        Ok(result)
    }

    /// Resolve and invoke one step
    ///
    /// The outer error aborts the run; the inner one fails only this step.
    async fn run_step(
        &self,
        step: &Step,
        input: &StepInput,
        question: &str,
    ) -> Result<Result<StepOutput, StepError>, OrchestratorError> {
        let capability = match step.capability.parse::<Capability>() {
            Ok(capability) => narrow(capability, input),
            Err(name) => return Ok(Err(StepError::UnknownCapability(name))),
        };

        let handler = match self.registry.resolve(capability)? {
            Ok(handler) => handler,
            Err(e) => return Ok(Err(e)),
        };

        debug!("Dispatching {} to {:?}", capability, handler);
        Ok(invoke(handler, input, question).await)
    }
}

/// Pick the variant for capabilities that leave it to the parameters
fn narrow(capability: Capability, input: &StepInput) -> Capability {
    match capability {
        Capability::Parse(None) => {
            let format = input
                .param_str_opt("format")
                .or_else(|| {
                    file_path_param(input).and_then(|path| {
                        Path::new(&path)
                            .extension()
                            .and_then(|ext| ext.to_str())
                            .map(String::from)
                    })
                })
                .map(|hint| ParseFormat::from_hint(&hint))
                .unwrap_or(ParseFormat::Auto);
            Capability::Parse(Some(format))
        }
        Capability::Visualize(None) => {
            let kind = input
                .param_str_opt("type")
                .and_then(|hint| VisualKind::from_hint(&hint))
                .unwrap_or(VisualKind::Chart);
            Capability::Visualize(Some(kind))
        }
        other => other,
    }
}

async fn invoke(handler: Handler, input: &StepInput, question: &str) -> Result<StepOutput, StepError> {
    let output = match handler {
        Handler::Search(provider) => {
            let query = search_query(input)?;
            StepOutput::Datasets(provider.search(&query).await?)
        }
        Handler::Download(provider) => {
            let request = download_request(input)?;
            StepOutput::File(provider.download(&request).await?)
        }
        Handler::Parse(parser) => {
            let path = file_path_param(input)
                .ok_or_else(|| CapabilityError::MissingParameter("file_path".to_string()))?;
            StepOutput::Data(parser.parse(Path::new(&path)).await?)
        }
        Handler::Enrich(enricher) => {
            let data = input.param_json("data")?;
            StepOutput::Data(enricher.enrich(data).await?)
        }
        Handler::Visualize(visualizer) => {
            let data = input.param_json("data")?;
            let options = input.remaining(&["data"]);
            StepOutput::Visualisation(visualizer.render(data, &options).await?)
        }
        Handler::Summarize(summarizer) => {
            let data = input.param_json("data")?;
            StepOutput::Summary(summarizer.summarize(data, question).await?)
        }
    };
    Ok(output)
}

fn file_path_param(input: &StepInput) -> Option<String> {
    input
        .param_str_opt("file_path")
        .or_else(|| input.param_str_opt("path"))
}

fn search_query(input: &StepInput) -> Result<SearchQuery, CapabilityError> {
    let mut keywords = input.param_str_list("keywords");
    if keywords.is_empty() {
        keywords = input.param_str_list("query");
    }
    let dataset_name = input.param_str_opt("dataset_name");

    if keywords.is_empty() && dataset_name.is_none() {
        return Err(CapabilityError::MissingParameter(
            "keywords or dataset_name".to_string(),
        ));
    }

    Ok(SearchQuery {
        keywords,
        dataset_name,
        theme: input.params.get("theme").cloned(),
        location: input.params.get("location").cloned(),
        date_range: input.params.get("date_range").cloned(),
        limit: input.param_u64_opt("limit"),
    })
}

/// Work out what to download from `url`, `resource` or `dataset_id`
fn download_request(input: &StepInput) -> Result<DownloadRequest, CapabilityError> {
    if let Some(url) = input.param_str_opt("url") {
        return Ok(DownloadRequest::Url(url));
    }

    if let Some(resource) = input.params.get("resource") {
        return match resource {
            Value::String(url) => Ok(DownloadRequest::Url(url.clone())),
            Value::Object(record) => {
                let direct = record.get("url").and_then(Value::as_str);
                let first_resource = record
                    .get("resources")
                    .and_then(Value::as_array)
                    .and_then(|list| list.first())
                    .and_then(|r| r.get("url"))
                    .and_then(Value::as_str);

                if let Some(url) = direct.or(first_resource) {
                    Ok(DownloadRequest::Url(url.to_string()))
                } else if let Some(id) = record.get("id").and_then(id_string) {
                    Ok(DownloadRequest::DatasetId(id))
                } else {
                    Err(CapabilityError::InvalidParameter(
                        "resource has no url, downloadable resource or id".to_string(),
                    ))
                }
            }
            _ => Err(CapabilityError::InvalidParameter(
                "resource must be a URL or a resource/dataset record".to_string(),
            )),
        };
    }

    if let Some(id) = input.params.get("dataset_id") {
        return id_string(id)
            .map(DownloadRequest::DatasetId)
            .ok_or_else(|| {
                CapabilityError::InvalidParameter("dataset_id must be a string".to_string())
            });
    }

    Err(CapabilityError::MissingParameter(
        "url, resource or dataset_id".to_string(),
    ))
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

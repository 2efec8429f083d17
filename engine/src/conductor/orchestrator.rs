//! Question-to-result facade
//!
//! Chains the external intent extractor, the planner and the executor:
//! question → `IntentRecord` → `Plan` → `AggregateResult`.

use crate::conductor::events::{EventSink, TracingSink};
use crate::conductor::executor::Executor;
use crate::conductor::intent::IntentRecord;
use crate::conductor::planner::Planner;
use crate::conductor::registry::CapabilityRegistry;
use crate::conductor::result::AggregateResult;
use crate::config::{Config, PlannerConfig};
use crate::errors::OrchestratorError;
use sdk::capability::IntentExtractor;
use std::sync::Arc;
use tracing::{debug, info};

pub struct Orchestrator {
    extractor: Arc<dyn IntentExtractor>,
    planner: Planner,
    executor: Executor,
}

impl Orchestrator {
    pub fn new(
        extractor: Arc<dyn IntentExtractor>,
        registry: Arc<CapabilityRegistry>,
        planner_config: PlannerConfig,
    ) -> Self {
        Self {
            extractor,
            planner: Planner::new(planner_config),
            executor: Executor::new(registry),
        }
    }

    /// Build from loaded configuration
    ///
    /// Uses the `[planner]` vocabularies and, when `executor.emit_events` is
    /// set, logs execution events through a `TracingSink`.
    pub fn from_config(
        extractor: Arc<dyn IntentExtractor>,
        registry: Arc<CapabilityRegistry>,
        config: &Config,
    ) -> Self {
        let orchestrator = Self::new(extractor, registry, config.planner.clone());
        if config.executor.emit_events {
            orchestrator.with_sink(Arc::new(TracingSink))
        } else {
            orchestrator
        }
    }

    /// Report execution events to the given sink
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.executor = self.executor.with_sink(sink);
        self
    }

    /// Answer a free-text question
    ///
    /// # Errors
    ///
    /// - `InvalidQuestion` if the question is empty or whitespace
    /// - `IntentExtraction` if the extractor fails
    /// - `MissingProvider` if the plan needs a family with no provider
    pub async fn process_question(
        &self,
        question: &str,
    ) -> Result<AggregateResult, OrchestratorError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(OrchestratorError::InvalidQuestion);
        }

        info!("Processing question ({} chars)", question.chars().count());

        let raw = self
            .extractor
            .extract(question)
            .await
            .map_err(|e| OrchestratorError::IntentExtraction(e.to_string()))?;
        let intent = IntentRecord::from(raw);
        debug!("Extracted intent: goal={:?}", intent.goal);

        let plan = self.planner.generate_plan(&intent);
        let result = self.executor.execute(&plan, question).await?;

        Ok(result.with_plan(plan))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdk::capability::FnHandler;
    use sdk::errors::CapabilityError;
    use serde_json::json;

    fn orchestrator(extractor: impl IntentExtractor + 'static) -> Orchestrator {
        Orchestrator::new(
            Arc::new(extractor),
            Arc::new(CapabilityRegistry::empty()),
            PlannerConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_blank_question_rejected() {
        let orch = orchestrator(FnHandler::extractor(|_: &str| Ok(json!({}))));
        let err = orch.process_question("   ").await.unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidQuestion));
    }

    #[tokio::test]
    async fn test_extractor_failure_is_fatal() {
        let orch = orchestrator(FnHandler::extractor(|_: &str| {
            Err(CapabilityError::Network("model offline".to_string()))
        }));
        let err = orch.process_question("population à Lyon").await.unwrap_err();
        assert!(matches!(err, OrchestratorError::IntentExtraction(ref m) if m.contains("model offline")));
    }

    #[tokio::test]
    async fn test_missing_parse_provider_aborts() {
        let orch = orchestrator(FnHandler::extractor(|_: &str| Ok(json!({"entities": {}}))));
        let err = orch.process_question("anything").await.unwrap_err();
        assert!(matches!(err, OrchestratorError::MissingProvider { ref family } if family == "parse"));
    }
}

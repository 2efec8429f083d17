//! Execution events
//!
//! The executor reports what it is doing through an `EventSink` handed to it
//! by the caller. Nothing is global: a caller that wants no events passes a
//! `NullSink`, one that wants to stream them passes an unbounded channel
//! sender, and tests use a `RecordingSink`. `TracingSink` forwards events to
//! the log.

use serde::Serialize;
use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, trace};

/// Terminal state of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Succeeded,
    Failed,
}

/// Events emitted during one plan execution
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecutionEvent {
    /// Execution began
    PlanStarted { steps: usize },
    /// A step moved from pending to running
    StepStarted {
        index: usize,
        kind: String,
        capability: String,
    },
    /// A placeholder could not be followed; the parameter was left out
    PlaceholderUnresolved {
        index: usize,
        param: String,
        placeholder: String,
    },
    /// A step reached a terminal state
    StepFinished {
        index: usize,
        capability: String,
        status: StepStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// Every step ran
    PlanCompleted { succeeded: usize, failed: usize },
    /// A fatal error stopped the run at the given step
    PlanAborted { index: usize, reason: String },
}

/// Receiver of execution events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ExecutionEvent);
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: ExecutionEvent) {}
}

impl EventSink for UnboundedSender<ExecutionEvent> {
    fn emit(&self, event: ExecutionEvent) {
        if self.send(event).is_err() {
            trace!("Event receiver dropped, discarding event");
        }
    }
}

/// Writes every event to the log as structured JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: ExecutionEvent) {
        match serde_json::to_string(&event) {
            Ok(json) => info!(target: "datapilot_engine::events", "{}", json),
            Err(_) => info!(target: "datapilot_engine::events", "{:?}", event),
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ExecutionEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far
    pub fn events(&self) -> Vec<ExecutionEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: ExecutionEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

//! Conductor System
//!
//! Plans and runs capability pipelines: intent normalization, planning,
//! handler resolution, and sequential execution with inter-step data flow.

pub mod context;
pub mod events;
pub mod executor;
pub mod intent;
pub mod orchestrator;
pub mod planner;
pub mod registry;
pub mod result;
pub mod types;

pub use context::ExecutionContext;
pub use events::{EventSink, ExecutionEvent, NullSink, RecordingSink, StepStatus, TracingSink};
pub use executor::Executor;
pub use intent::{Entities, IntentRecord};
pub use orchestrator::Orchestrator;
pub use planner::Planner;
pub use registry::{CapabilityRegistry, Handler};
pub use result::AggregateResult;
pub use types::{
    Capability, ContextRef, Enrichment, ParamValue, Params, ParseFormat, Plan, Step, VisualKind,
};

//! Command handlers for CLI operations
//!
//! - plan: Generate the plan for an intent record
//! - validate: Structural check of an external plan
//! - config show / path: Inspect the active configuration

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

use crate::conductor::{Capability, IntentRecord, Plan, Planner};
use crate::config::{expand_path, Config};

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

async fn read_json(path: &Path) -> Result<Value> {
    let path = expand_path(path)?;
    let contents = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("{} is not valid JSON", path.display()))
}

/// Print the plan generated for an intent record
pub async fn handle_plan(intent_path: &Path, config: &Config, format: OutputFormat) -> Result<()> {
    let intent = IntentRecord::from(read_json(intent_path).await?);
    let plan = Planner::new(config.planner.clone()).generate_plan(&intent);
    tracing::debug!("Generated {} step(s)", plan.len());

    match format {
        OutputFormat::Text => print!("{}", describe_plan(&plan)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
    }

    Ok(())
}

/// Check an externally produced plan
///
/// A structurally malformed plan is an error. Capability names the engine
/// does not know are reported but do not fail validation, since they only
/// fail their own step at execution time.
pub async fn handle_validate(plan_path: &Path, format: OutputFormat) -> Result<()> {
    let value = read_json(plan_path).await?;
    let plan = Plan::from_value(&value)?;
    let unknown = unknown_capabilities(&plan);

    match format {
        OutputFormat::Text => {
            println!("Plan is well formed: {} step(s)", plan.len());
            for (index, name) in &unknown {
                println!("  warning: step {} uses unknown capability '{}'", index + 1, name);
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "valid": true,
                "steps": plan.len(),
                "unknown_capabilities": unknown
                    .iter()
                    .map(|(index, name)| json!({"index": index, "capability": name}))
                    .collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Show the active configuration
pub fn handle_config_show(config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", toml::to_string_pretty(config)?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
    }
    Ok(())
}

/// Show where the configuration is read from
pub fn handle_config_path(custom: Option<&Path>, format: OutputFormat) -> Result<()> {
    let path: PathBuf = match custom {
        Some(path) => expand_path(path)?,
        None => Config::default_config_path()?,
    };
    match format {
        OutputFormat::Text => println!("{}", path.display()),
        OutputFormat::Json => println!("{}", json!({ "path": path })),
    }
    Ok(())
}

/// Steps whose capability name does not parse, as `(index, name)`
pub fn unknown_capabilities(plan: &Plan) -> Vec<(usize, String)> {
    plan.iter()
        .enumerate()
        .filter_map(|(index, step)| {
            step.capability
                .parse::<Capability>()
                .err()
                .map(|name| (index, name))
        })
        .collect()
}

/// One line per step, with its parameters
pub fn describe_plan(plan: &Plan) -> String {
    if plan.is_empty() {
        return "Empty plan\n".to_string();
    }

    let mut out = String::new();
    for (index, step) in plan.iter().enumerate() {
        out.push_str(&format!("{}. {} [{}]\n", index + 1, step.kind, step.capability));
        for (name, value) in &step.params {
            out.push_str(&format!("     {} = {}\n", name, value.to_value()));
        }
    }
    out
}

//! Configuration management
//!
//! This module handles loading, validation, and management of the Datapilot
//! configuration. Configuration is stored in TOML format at
//! ~/.datapilot/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level
//! - **planner**: Trigger vocabularies used to infer enrichment and
//!   visualisation steps
//! - **executor**: Execution event reporting
//!
//! Every section is optional; missing sections and keys take their defaults.
//!
//! # Examples
//!
//! ```no_run
//! use datapilot_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//! println!("Log level: {}", config.core.log_level);
//! println!("Temporal triggers: {:?}", config.planner.temporal_triggers);
//! # Ok(())
//! # }
//! ```

use crate::errors::OrchestratorError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Core engine settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Planner vocabularies
    #[serde(default)]
    pub planner: PlannerConfig,

    /// Executor settings
    #[serde(default)]
    pub executor: ExecutorConfig,
}

/// Core engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Trigger vocabularies for plan inference
///
/// Goal triggers are matched as case-insensitive substrings of the goal
/// text. Visualisation terms are matched case-insensitively against each
/// requested visualisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Goal terms that add a temporal enrichment step
    #[serde(default = "default_temporal_triggers")]
    pub temporal_triggers: Vec<String>,

    /// Goal terms that add a geographic enrichment step
    #[serde(default = "default_geo_triggers")]
    pub geo_triggers: Vec<String>,

    /// Visualisation terms that add a map step
    #[serde(default = "default_map_terms")]
    pub map_terms: Vec<String>,

    /// Visualisation terms that add a chart step
    #[serde(default = "default_chart_terms")]
    pub chart_terms: Vec<String>,
}

/// Executor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Print execution events as they happen
    #[serde(default = "default_true")]
    pub emit_events: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            temporal_triggers: default_temporal_triggers(),
            geo_triggers: default_geo_triggers(),
            map_terms: default_map_terms(),
            chart_terms: default_chart_terms(),
        }
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            emit_events: default_true(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn terms(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn default_temporal_triggers() -> Vec<String> {
    terms(&["temps", "temporel", "chronologie", "time"])
}

fn default_geo_triggers() -> Vec<String> {
    terms(&["carte", "geo", "géographie", "map", "location"])
}

fn default_map_terms() -> Vec<String> {
    terms(&["map", "carte"])
}

fn default_chart_terms() -> Vec<String> {
    terms(&["chart", "graph", "histogramme"])
}

impl Config {
    /// Load configuration from the default location (~/.datapilot/config.toml)
    ///
    /// If the configuration file doesn't exist, writes a default one first.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read or written
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, OrchestratorError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path (supports ~ expansion)
    pub fn load_from_path(path: &Path) -> Result<Self, OrchestratorError> {
        let path = expand_path(path)?;
        let contents = fs::read_to_string(&path)
            .map_err(|e| OrchestratorError::Config(format!("Failed to read config file: {}", e)))?;

        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| OrchestratorError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, OrchestratorError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                OrchestratorError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let mut config = Self::default();
        config.validate_and_process()?;

        let toml_string = toml::to_string_pretty(&config).map_err(|e| {
            OrchestratorError::Config(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, toml_string).map_err(|e| {
            OrchestratorError::Config(format!("Failed to write config file: {}", e))
        })?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.datapilot/config.toml)
    pub fn default_config_path() -> Result<PathBuf, OrchestratorError> {
        let home = dirs::home_dir().ok_or_else(|| {
            OrchestratorError::Config("Could not determine home directory".to_string())
        })?;

        Ok(home.join(".datapilot").join("config.toml"))
    }

    /// Validate and normalize configuration
    ///
    /// Lower-cases the log level and every trigger term, drops blank terms,
    /// and rejects unknown log levels and empty vocabularies.
    fn validate_and_process(&mut self) -> Result<(), OrchestratorError> {
        self.core.log_level = self.core.log_level.trim().to_lowercase();
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(OrchestratorError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        let planner = &mut self.planner;
        for (name, list) in [
            ("temporal_triggers", &mut planner.temporal_triggers),
            ("geo_triggers", &mut planner.geo_triggers),
            ("map_terms", &mut planner.map_terms),
            ("chart_terms", &mut planner.chart_terms),
        ] {
            *list = list
                .iter()
                .map(|term| term.trim().to_lowercase())
                .filter(|term| !term.is_empty())
                .collect();
            if list.is_empty() {
                return Err(OrchestratorError::Config(format!(
                    "planner.{} must contain at least one term",
                    name
                )));
            }
        }

        Ok(())
    }
}

/// Expand ~ in path to user's home directory
pub fn expand_path(path: &Path) -> Result<PathBuf, OrchestratorError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| OrchestratorError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir().ok_or_else(|| {
            OrchestratorError::Config("Could not determine home directory".to_string())
        })?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir().ok_or_else(|| {
            OrchestratorError::Config("Could not determine home directory".to_string())
        })
    } else {
        Ok(path.to_path_buf())
    }
}

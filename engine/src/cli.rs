//! CLI interface for Datapilot
//!
//! This module provides the command-line interface using clap's derive API.
//! The CLI works on plans only: capability providers are wired up by the
//! application embedding the engine.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Datapilot pipeline engine
///
/// Turns intent records into ordered capability plans and checks plans
/// produced elsewhere.
#[derive(Parser, Debug)]
#[command(name = "datapilot")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the plan generated for an intent record
    Plan {
        /// JSON file holding the intent record
        intent: PathBuf,
    },

    /// Check that an externally produced plan is well formed
    Validate {
        /// JSON file holding the plan
        plan: PathBuf,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Print the configuration file path
    Path,
}

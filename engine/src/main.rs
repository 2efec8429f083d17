// Datapilot pipeline engine
// Main entry point for the datapilot binary

use clap::Parser;
use datapilot_engine::cli::{Cli, Command, ConfigAction};
use datapilot_engine::config::Config;
use datapilot_engine::handlers::{
    handle_config_path, handle_config_show, handle_plan, handle_validate, OutputFormat,
};
use datapilot_engine::telemetry::{init_telemetry_with_level, resolve_log_level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    init_telemetry_with_level(&resolve_log_level(
        cli.log.as_deref(),
        &config.core.log_level,
    ));

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");
    tracing::debug!("Datapilot v{} ({} - {})", version, commit, timestamp);

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    match cli.command {
        Command::Plan { intent } => {
            tracing::info!("Planning intent from {}", intent.display());
            handle_plan(&intent, &config, format).await
        }

        Command::Validate { plan } => {
            tracing::info!("Validating plan from {}", plan.display());
            handle_validate(&plan, format).await
        }

        Command::Config { action } => match action {
            ConfigAction::Show => handle_config_show(&config, format),
            ConfigAction::Path => handle_config_path(cli.config.as_deref(), format),
        },
    }
}

//! webdsl - line-oriented web automation scripts.
//!
//! Main entry point for the webdsl CLI.

mod cli;
mod cmd_run;
mod cmd_script;
mod console;

use std::path::Path;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use webdsl_config::{Config, ConfigLoader, ConfigValidator};

use cli::{Cli, Commands};

/// Initialize tracing with console output and, when a directory is given,
/// a daily rolling log file.
fn init_tracing(level: &str, log_dir: Option<&Path>) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("webdsl")
                .filename_suffix("log")
                .max_log_files(14)
                .build(dir)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // The worker flushes until the guard drops.
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false).boxed())
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = ConfigLoader::load_or_default(path)
        .with_context(|| format!("Failed to load config {}", path.display()))?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    let log_dir = cli.log_file.as_deref().or(config.logging.directory.as_deref());
    init_tracing(&config.logging.level, log_dir)?;

    let validation = ConfigValidator::validate(&config);
    for warning in &validation.warnings {
        warn!("Config {}: {}", warning.path, warning.message);
    }
    if !validation.is_valid() {
        for error in &validation.errors {
            tracing::error!("Config {}: {}", error.path, error.message);
        }
        bail!("invalid configuration in {}", cli.config.display());
    }
    info!("webdsl v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Run {
            page,
            script,
            resume,
            offline,
            pointer,
        } => {
            let source = match script {
                Some(path) => cmd_run::ScriptSource::File(path),
                None if resume => cmd_run::ScriptSource::Resume,
                None => cmd_run::ScriptSource::Store,
            };
            cmd_run::handle_run(&config, &page, source, offline, pointer).await
        }
        Commands::Script { action } => cmd_script::handle_script_command(&config, action).await,
        Commands::Catalog => cmd_script::handle_catalog(&config).await,
    }
}

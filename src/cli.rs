//! CLI definitions for webdsl.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use webdsl_dom::Point;

/// webdsl CLI.
#[derive(Parser)]
#[command(name = "webdsl")]
#[command(about = "Replay line-oriented web automation scripts against a page")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "webdsl.toml", global = true, env = "WEBDSL_CONFIG")]
    pub config: PathBuf,

    /// Directory for rolling log files
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run a script against an HTML page
    Run {
        /// HTML file to load as the page
        #[arg(long)]
        page: PathBuf,

        /// Script file (default: the script stored on the backend)
        #[arg(long)]
        script: Option<PathBuf>,

        /// Continue the run recorded in the backend's execution status
        #[arg(long, conflicts_with = "script")]
        resume: bool,

        /// Use an in-process backend instead of the HTTP one
        #[arg(long)]
        offline: bool,

        /// Last pointer-down position for grabElement, as X,Y
        #[arg(long, value_parser = parse_point)]
        pointer: Option<Point>,
    },

    /// Stored script commands
    Script {
        #[command(subcommand)]
        action: ScriptAction,
    },

    /// List the backend's command catalog
    Catalog,
}

#[derive(Subcommand)]
pub(crate) enum ScriptAction {
    /// Print the stored script
    Show,

    /// Replace the stored script with a file's contents
    Save {
        /// Script file
        file: PathBuf,
    },

    /// Clear the stored script
    Clear,

    /// Append a catalog command to the stored script
    Add {
        /// Command name, e.g. NAVIGATE
        name: String,

        /// Command arguments
        args: Vec<String>,
    },
}

fn parse_point(value: &str) -> Result<Point, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got '{}'", value))?;
    let x = x.trim().parse::<f64>().map_err(|e| format!("invalid X: {}", e))?;
    let y = y.trim().parse::<f64>().map_err(|e| format!("invalid Y: {}", e))?;
    Ok(Point::new(x, y))
}

// vouch/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Parser, Subcommand};
use serde_json::Value as Json;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vouch")]
#[command(about = "Data quality expectations, checkpoints and reports over tabular batches", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Project directory (where vouch.yaml lives)
    #[arg(long, default_value = ".", global = true, env = "VOUCH_PROJECT_DIR")]
    pub project_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 📋 Manages expectation suites
    Suite {
        #[command(subcommand)]
        action: SuiteCommands,
    },

    /// 🏁 Manages checkpoints
    Checkpoint {
        #[command(subcommand)]
        action: CheckpointCommands,
    },

    /// 🚀 Runs a checkpoint against one or more sources
    Run {
        /// Checkpoint name
        checkpoint: String,

        /// Configured source to validate (repeatable)
        #[arg(long, short, required = true)]
        source: Vec<String>,

        /// Validate against this suite instead of the checkpoint's own
        #[arg(long)]
        suite: Option<String>,

        /// Extra batch identifier, e.g. run_id=42 (repeatable)
        #[arg(long = "id", value_parser = parse_identifier)]
        identifiers: Vec<(String, String)>,
    },

    /// 🔬 Profiles a source into a candidate suite
    Profile {
        /// Configured source to profile
        source: String,

        /// Persist the inferred suite as '<source>.profile'
        #[arg(long)]
        save: bool,
    },

    /// 📚 Rebuilds the local data docs site
    Docs,

    /// 🧹 Removes uncommitted artifacts (clean-targets)
    Clean,
}

#[derive(Subcommand)]
pub enum SuiteCommands {
    /// Creates an empty suite
    Create {
        name: String,

        /// Discard an existing suite with the same name
        #[arg(long)]
        overwrite: bool,
    },

    /// Adds (or replaces) an expectation
    Add {
        suite: String,

        /// Rule type: not_null, between, in_set, match_regex, unique, mean_between, value_lengths_between
        rule: String,

        column: String,

        /// Rule parameter, e.g. min_value=0 or value_set='["N","Y"]' (repeatable)
        #[arg(long = "param", short, value_parser = parse_param)]
        params: Vec<(String, Json)>,

        /// error (default) or warning
        #[arg(long, default_value = "error")]
        severity: String,

        /// Maximum tolerated fraction of unexpected values
        #[arg(long)]
        tolerance: Option<f64>,

        /// Markdown notes attached to the expectation
        #[arg(long)]
        notes: Option<String>,

        /// Source evaluated against when the project authors eagerly
        #[arg(long)]
        source: Option<String>,

        /// Drop rules whose immediate evaluation failed when saving
        #[arg(long)]
        discard_failed: bool,
    },

    /// Shows the expectations of a suite
    Show { name: String },

    /// Lists stored suites
    List,
}

#[derive(Subcommand)]
pub enum CheckpointCommands {
    /// Creates or replaces a checkpoint
    Add {
        name: String,

        /// Suite validated by this checkpoint
        #[arg(long)]
        suite: String,

        /// strftime pattern for run names
        #[arg(long)]
        run_name_template: Option<String>,

        /// Channel handed to the failure notifier
        #[arg(long)]
        notify_channel: Option<String>,
    },

    /// Lists stored checkpoints
    List,
}

/// `key=value`, where the value is read as JSON when it parses, else as text.
pub fn parse_param(raw: &str) -> Result<(String, Json), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| Json::String(value.to_string()));
    Ok((key.trim().to_string(), value))
}

pub fn parse_identifier(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    Ok((key.trim().to_string(), value.trim().to_string()))
}

// vouch-core/src/domain/context.rs

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use validator::{Validate, ValidationError};

use crate::domain::registry::EvaluationMode;

/// Engine used by the batch source.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    #[default]
    DataFusion,
    DuckDB,
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::DataFusion => write!(f, "datafusion"),
            Engine::DuckDB => write!(f, "duckdb"),
        }
    }
}

impl std::str::FromStr for Engine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "datafusion" => Ok(Engine::DataFusion),
            "duckdb" => Ok(Engine::DuckDB),
            other => Err(format!("unknown engine '{}'", other)),
        }
    }
}

/// Project-level settings, read from `vouch.yaml`.
#[derive(Debug, Deserialize, Serialize, Validate, Clone)]
pub struct ContextConfig {
    #[validate(length(min = 1, message = "Project name cannot be empty"))]
    pub name: String,

    #[serde(rename = "root-directory", alias = "root_directory", default = "default_root_directory")]
    #[validate(length(min = 1, message = "Root directory cannot be empty"))]
    pub root_directory: String,

    #[serde(default)]
    pub engine: Engine,

    /// Only logged; nothing is ever sent anywhere.
    #[serde(rename = "usage-statistics", alias = "usage_statistics", default)]
    pub usage_statistics: bool,

    #[serde(rename = "evaluation-mode", alias = "evaluation_mode", default)]
    pub evaluation_mode: EvaluationMode,

    #[serde(rename = "clean-targets", alias = "clean_targets", default = "default_clean_targets")]
    pub clean_targets: Vec<String>,

    #[validate(nested)]
    #[validate(custom(function = "validate_unique_source_names"))]
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

impl ContextConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root_directory: default_root_directory(),
            engine: Engine::default(),
            usage_statistics: false,
            evaluation_mode: EvaluationMode::default(),
            clean_targets: default_clean_targets(),
            sources: Vec::new(),
        }
    }

    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }
}

/// A named CSV file with its declared schema.
#[derive(Debug, Deserialize, Serialize, Validate, Clone, PartialEq)]
pub struct SourceConfig {
    #[validate(length(min = 1, message = "Source name cannot be empty"))]
    pub name: String,

    #[validate(length(min = 1, message = "Source path cannot be empty"))]
    pub path: String,

    /// DDL column list, e.g. "`id` BIGINT, `fare_amount` DOUBLE".
    #[validate(length(min = 1, message = "Source schema cannot be empty"))]
    pub schema: String,

    /// Data asset name used in batch identifiers. Defaults to `name`.
    #[serde(rename = "data-asset-name", alias = "data_asset_name", default)]
    pub data_asset_name: Option<String>,

    #[serde(default)]
    pub identifiers: BTreeMap<String, String>,
}

fn validate_unique_source_names(sources: &[SourceConfig]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for source in sources {
        if !seen.insert(source.name.as_str()) {
            let mut err = ValidationError::new("duplicate_source");
            err.message = Some(format!("Source '{}' is declared twice", source.name).into());
            return Err(err);
        }
    }
    Ok(())
}

fn default_root_directory() -> String {
    "gx".to_string()
}

fn default_clean_targets() -> Vec<String> {
    vec!["uncommitted".to_string()]
}

// vouch-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DatabaseError {
    #[error("DuckDB Engine Error: {0}")]
    #[diagnostic(
        code(vouch::infra::database::duckdb),
        help("An error occurred inside the SQL engine.")
    )]
    DuckDB(#[from] duckdb::Error),

    #[error("DataFusion Engine Error: {0}")]
    #[diagnostic(
        code(vouch::infra::database::datafusion),
        help("An error occurred inside the query engine.")
    )]
    DataFusion(#[from] datafusion::error::DataFusionError),
}

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- DATABASE (Abstracted) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] DatabaseError),

    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(code(vouch::infra::io), help("Check file permissions or path validity."))]
    Io(#[from] std::io::Error),

    // --- SERIALIZATION ---
    #[error("YAML Parsing Error: {0}")]
    #[diagnostic(code(vouch::infra::yaml), help("Check your YAML syntax (indentation, types)."))]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON Error: {0}")]
    #[diagnostic(code(vouch::infra::json))]
    JsonError(#[from] serde_json::Error),

    // --- CONFIG ---
    #[error("Configuration Error: {0}")]
    #[diagnostic(code(vouch::infra::config))]
    ConfigError(String),

    #[error("Project configuration not found at '{0}'")]
    #[diagnostic(
        code(vouch::infra::config_missing),
        help("Create a vouch.yaml file in the project directory.")
    )]
    ConfigNotFound(String),

    // --- TEMPLATING ---
    #[error("Template Rendering Error: {0}")]
    #[diagnostic(code(vouch::infra::template))]
    TemplateError(#[from] minijinja::Error),
}

// Shortcuts for `?` on engine calls
impl From<duckdb::Error> for InfrastructureError {
    fn from(err: duckdb::Error) -> Self {
        InfrastructureError::Database(DatabaseError::DuckDB(err))
    }
}

impl From<datafusion::error::DataFusionError> for InfrastructureError {
    fn from(err: datafusion::error::DataFusionError) -> Self {
        InfrastructureError::Database(DatabaseError::DataFusion(err))
    }
}

// vouch-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, PartialEq)]
pub enum DomainError {
    #[error("Schema mismatch for '{batch}': {reason}")]
    #[diagnostic(
        code(vouch::domain::schema_mismatch),
        help("Declared schemas are never coerced. Fix the schema descriptor or the data.")
    )]
    SchemaMismatch { batch: String, reason: String },

    #[error("Expectation registry '{0}' already exists")]
    #[diagnostic(
        code(vouch::domain::already_exists),
        help("Pass the overwrite flag to discard the existing registry.")
    )]
    AlreadyExists(String),

    #[error("Invalid parameter for '{rule}': {reason}")]
    #[diagnostic(code(vouch::domain::invalid_parameter))]
    InvalidParameter { rule: String, reason: String },

    #[error("Column '{column}' not found in batch '{batch}'")]
    #[diagnostic(code(vouch::domain::column_not_found))]
    ColumnNotFound { batch: String, column: String },

    #[error("Expectation registry '{0}' not found")]
    #[diagnostic(code(vouch::domain::registry_not_found))]
    RegistryNotFound(String),

    #[error("Checkpoint '{0}' not found")]
    #[diagnostic(code(vouch::domain::checkpoint_not_found))]
    CheckpointNotFound(String),

    #[error("Action '{action}' failed: {reason}")]
    #[diagnostic(code(vouch::domain::action_execution))]
    ActionExecution { action: String, reason: String },

    #[error("Invalid run state transition: {from} -> {to}")]
    #[diagnostic(code(vouch::domain::run_state))]
    InvalidTransition { from: String, to: String },
}

impl DomainError {
    pub(crate) fn invalid_parameter(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        DomainError::InvalidParameter {
            rule: rule.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn schema_mismatch(batch: impl Into<String>, reason: impl Into<String>) -> Self {
        DomainError::SchemaMismatch {
            batch: batch.into(),
            reason: reason.into(),
        }
    }
}

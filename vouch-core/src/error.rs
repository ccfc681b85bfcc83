// vouch-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum VouchError {
    // --- DOMAIN ERRORS (schemas, parameters, registries, checkpoints) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE ERRORS (IO, Parsing, Engines) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- GENERIC / APPLICATION ERRORS ---
    #[error("Internal Error: {0}")]
    InternalError(String),

    #[error("Unsafe path traversal detected: {0}")]
    #[diagnostic(
        code(vouch::unsafe_path),
        help("Store keys must be plain names without separators or '..'.")
    )]
    UnsafePath(String),
}

impl From<std::io::Error> for VouchError {
    fn from(err: std::io::Error) -> Self {
        VouchError::Infrastructure(InfrastructureError::Io(err))
    }
}

impl From<serde_json::Error> for VouchError {
    fn from(err: serde_json::Error) -> Self {
        VouchError::Infrastructure(InfrastructureError::JsonError(err))
    }
}

impl From<serde_yaml::Error> for VouchError {
    fn from(err: serde_yaml::Error) -> Self {
        VouchError::Infrastructure(InfrastructureError::YamlError(err))
    }
}

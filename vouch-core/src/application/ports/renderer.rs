use crate::domain::registry::ExpectationRegistry;
use crate::domain::validation::ValidationResult;
use crate::error::VouchError;
use crate::ports::store::ValidationKey;
use std::path::{Path, PathBuf};

/// A self-contained HTML page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub title: String,
    pub html: String,
}

/// One line of the local site index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub key: ValidationKey,
    pub batch: String,
    pub success: bool,
    pub success_percent: f64,
}

/// Rendering is pure: the same input always yields the same document.
pub trait ReportRenderer: Send + Sync {
    fn render_validation(&self, result: &ValidationResult, run_name: Option<&str>) -> Result<Document, VouchError>;
    fn render_registry(&self, registry: &ExpectationRegistry) -> Result<Document, VouchError>;
    fn render_profile(&self, registry: &ExpectationRegistry, baseline: &ValidationResult) -> Result<Document, VouchError>;
    fn render_index(&self, entries: &[IndexEntry], registries: &[String]) -> Result<Document, VouchError>;
}

pub trait ReportSink {
    /// Writes `document` atomically under the site root and returns its path.
    fn persist(&self, document: &Document, relative: &Path) -> Result<PathBuf, VouchError>;
}

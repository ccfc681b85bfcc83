// vouch-core/src/ports/store.rs

// Persistence contracts. Stores are blocking: persistence happens between
// stages, never inside the evaluation loop.

use crate::domain::checkpoint::Checkpoint;
use crate::domain::registry::ExpectationRegistry;
use crate::domain::validation::ValidationResult;
use crate::error::VouchError;
use serde::{Deserialize, Serialize};

pub trait RegistryStore {
    fn exists(&self, name: &str) -> Result<bool, VouchError>;
    /// `DomainError::RegistryNotFound` when absent.
    fn load(&self, name: &str) -> Result<ExpectationRegistry, VouchError>;
    /// Overwrites any previous content wholesale.
    fn save(&self, registry: &ExpectationRegistry) -> Result<(), VouchError>;
    fn list(&self) -> Result<Vec<String>, VouchError>;
    fn delete(&self, name: &str) -> Result<(), VouchError>;
}

pub trait CheckpointStore {
    fn save_checkpoint(&self, checkpoint: &Checkpoint) -> Result<(), VouchError>;
    /// `DomainError::CheckpointNotFound` when absent.
    fn load_checkpoint(&self, name: &str) -> Result<Checkpoint, VouchError>;
    fn list_checkpoints(&self) -> Result<Vec<String>, VouchError>;
}

/// Address of a persisted validation result.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValidationKey {
    pub registry_name: String,
    pub run_name: String,
    pub batch_fingerprint: String,
}

impl ValidationKey {
    pub fn new(result: &ValidationResult, run_name: &str) -> Self {
        Self {
            registry_name: result.registry_name.clone(),
            run_name: run_name.to_string(),
            batch_fingerprint: result.batch_id.fingerprint(),
        }
    }

    /// Relative path segments, shared by the JSON store and the HTML site.
    pub fn segments(&self) -> [&str; 3] {
        [&self.registry_name, &self.run_name, &self.batch_fingerprint]
    }
}

pub trait ValidationStore {
    fn save_validation(&self, result: &ValidationResult, run_name: &str) -> Result<ValidationKey, VouchError>;
    fn load_validation(&self, key: &ValidationKey) -> Result<ValidationResult, VouchError>;
    /// Every stored result, sorted by key.
    fn list_validations(&self) -> Result<Vec<ValidationKey>, VouchError>;
}

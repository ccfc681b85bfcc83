// vouch-core/src/infrastructure/store/filesystem.rs

use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, instrument};
use walkdir::WalkDir;

use crate::application::ports::renderer::{Document, ReportSink};
use crate::domain::checkpoint::Checkpoint;
use crate::domain::error::DomainError;
use crate::domain::registry::ExpectationRegistry;
use crate::domain::validation::ValidationResult;
use crate::error::VouchError;
use crate::infrastructure::fs::{atomic_write, safe_key};
use crate::ports::store::{CheckpointStore, RegistryStore, ValidationKey, ValidationStore};

pub const EXPECTATIONS_DIR: &str = "expectations";
pub const CHECKPOINTS_DIR: &str = "checkpoints";
pub const UNCOMMITTED_DIR: &str = "uncommitted";

/// Every artifact lives under one root directory (`gx` by default):
///
/// ```text
/// expectations/<registry>.json
/// checkpoints/<checkpoint>.yml
/// uncommitted/validations/<registry>/<run_name>/<batch_fingerprint>.json
/// uncommitted/data_docs/local_site/...
/// ```
#[derive(Debug, Clone)]
pub struct FilesystemStore {
    root: PathBuf,
}

impl FilesystemStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn site_dir(&self) -> PathBuf {
        self.root.join(UNCOMMITTED_DIR).join("data_docs").join("local_site")
    }

    fn validations_dir(&self) -> PathBuf {
        self.root.join(UNCOMMITTED_DIR).join("validations")
    }

    fn registry_path(&self, name: &str) -> Result<PathBuf, VouchError> {
        Ok(self
            .root
            .join(EXPECTATIONS_DIR)
            .join(format!("{}.json", safe_key(name)?)))
    }

    fn checkpoint_path(&self, name: &str) -> Result<PathBuf, VouchError> {
        Ok(self
            .root
            .join(CHECKPOINTS_DIR)
            .join(format!("{}.yml", safe_key(name)?)))
    }

    fn validation_path(&self, key: &ValidationKey) -> Result<PathBuf, VouchError> {
        let mut path = self.validations_dir();
        let [registry, run, fingerprint] = key.segments();
        path.push(safe_key(registry)?);
        path.push(safe_key(run)?);
        path.push(format!("{}.json", safe_key(fingerprint)?));
        Ok(path)
    }

    /// Sorted file stems with the given extension, directly under `dir`.
    fn list_stems(dir: &Path, extension: &str) -> Result<Vec<String>, VouchError> {
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(extension)
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

impl RegistryStore for FilesystemStore {
    fn exists(&self, name: &str) -> Result<bool, VouchError> {
        Ok(self.registry_path(name)?.is_file())
    }

    fn load(&self, name: &str) -> Result<ExpectationRegistry, VouchError> {
        let path = self.registry_path(name)?;
        if !path.is_file() {
            return Err(DomainError::RegistryNotFound(name.to_string()).into());
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    #[instrument(skip(self, registry), fields(registry = %registry.name()))]
    fn save(&self, registry: &ExpectationRegistry) -> Result<(), VouchError> {
        let path = self.registry_path(registry.name())?;
        atomic_write(&path, serde_json::to_string_pretty(registry)?)?;
        debug!(path = ?path, rules = registry.len(), "Registry saved");
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, VouchError> {
        Self::list_stems(&self.root.join(EXPECTATIONS_DIR), "json")
    }

    fn delete(&self, name: &str) -> Result<(), VouchError> {
        let path = self.registry_path(name)?;
        if !path.is_file() {
            return Err(DomainError::RegistryNotFound(name.to_string()).into());
        }
        fs::remove_file(path)?;
        Ok(())
    }
}

impl CheckpointStore for FilesystemStore {
    fn save_checkpoint(&self, checkpoint: &Checkpoint) -> Result<(), VouchError> {
        atomic_write(self.checkpoint_path(&checkpoint.name)?, serde_yaml::to_string(checkpoint)?)?;
        Ok(())
    }

    fn load_checkpoint(&self, name: &str) -> Result<Checkpoint, VouchError> {
        let path = self.checkpoint_path(name)?;
        if !path.is_file() {
            return Err(DomainError::CheckpointNotFound(name.to_string()).into());
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    fn list_checkpoints(&self) -> Result<Vec<String>, VouchError> {
        Self::list_stems(&self.root.join(CHECKPOINTS_DIR), "yml")
    }
}

impl ValidationStore for FilesystemStore {
    fn save_validation(&self, result: &ValidationResult, run_name: &str) -> Result<ValidationKey, VouchError> {
        let key = ValidationKey::new(result, run_name);
        let path = self.validation_path(&key)?;
        atomic_write(&path, serde_json::to_string_pretty(result)?)?;
        debug!(path = ?path, "Validation result stored");
        Ok(key)
    }

    fn load_validation(&self, key: &ValidationKey) -> Result<ValidationResult, VouchError> {
        let content = fs::read_to_string(self.validation_path(key)?)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn list_validations(&self) -> Result<Vec<ValidationKey>, VouchError> {
        let dir = self.validations_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut keys = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(3).max_depth(3) {
            let entry = entry.map_err(|e| VouchError::InternalError(e.to_string()))?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let rel = path
                .strip_prefix(&dir)
                .map_err(|e| VouchError::InternalError(e.to_string()))?;
            let parts: Vec<String> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            if let [registry, run, file] = parts.as_slice() {
                keys.push(ValidationKey {
                    registry_name: registry.clone(),
                    run_name: run.clone(),
                    batch_fingerprint: file.trim_end_matches(".json").to_string(),
                });
            }
        }
        keys.sort();
        Ok(keys)
    }
}

impl ReportSink for FilesystemStore {
    fn persist(&self, document: &Document, relative: &Path) -> Result<PathBuf, VouchError> {
        if relative.as_os_str().is_empty()
            || !relative.components().all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(VouchError::UnsafePath(relative.display().to_string()));
        }
        let path = self.site_dir().join(relative);
        atomic_write(&path, &document.html)?;
        Ok(path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::batch::{Batch, BatchIdentifier, ScalarType, Value};
    use crate::domain::expectation::Expectation;
    use crate::domain::validation::evaluate;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn test_registry_round_trip_and_listing() -> Result<()> {
        let dir = tempdir()?;
        let store = FilesystemStore::new(dir.path().join("gx"));

        let mut reg = ExpectationRegistry::new("taxi");
        reg.add(Expectation::not_null("VendorID"))?;
        store.save(&reg)?;
        store.save(&ExpectationRegistry::new("alpha"))?;

        assert!(store.exists("taxi")?);
        assert_eq!(store.load("taxi")?, reg);
        assert_eq!(store.list()?, vec!["alpha", "taxi"]);

        store.delete("alpha")?;
        assert_eq!(store.list()?, vec!["taxi"]);
        assert!(matches!(
            store.load("alpha"),
            Err(VouchError::Domain(DomainError::RegistryNotFound(_)))
        ));
        Ok(())
    }

    #[test]
    fn test_unsafe_names_are_rejected() -> Result<()> {
        let dir = tempdir()?;
        let store = FilesystemStore::new(dir.path());
        assert!(matches!(store.load("../secrets"), Err(VouchError::UnsafePath(_))));
        let doc = Document {
            title: "x".into(),
            html: "x".into(),
        };
        assert!(store.persist(&doc, Path::new("../index.html")).is_err());
        Ok(())
    }

    #[test]
    fn test_checkpoint_yaml_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let store = FilesystemStore::new(dir.path());
        let cp = Checkpoint::new("nightly", "taxi");

        store.save_checkpoint(&cp)?;

        assert!(dir.path().join("checkpoints/nightly.yml").is_file());
        assert_eq!(store.load_checkpoint("nightly")?, cp);
        assert_eq!(store.list_checkpoints()?, vec!["nightly"]);
        assert!(matches!(
            store.load_checkpoint("weekly"),
            Err(VouchError::Domain(DomainError::CheckpointNotFound(_)))
        ));
        Ok(())
    }

    #[test]
    fn test_validation_results_are_keyed_by_run_and_batch() -> Result<()> {
        let dir = tempdir()?;
        let store = FilesystemStore::new(dir.path());
        let batch = Batch::builder(BatchIdentifier::new("trips").with("run_id", "7"))
            .column("id", ScalarType::Integer, vec![Value::Integer(1)])
            .build()?;
        let mut reg = ExpectationRegistry::new("taxi");
        reg.add(Expectation::not_null("id"))?;
        let res = evaluate(&batch, &reg)?;

        let first = store.save_validation(&res, "run-b")?;
        let second = store.save_validation(&res, "run-a")?;

        let expected = dir
            .path()
            .join("uncommitted/validations/taxi/run-b")
            .join(format!("{}.json", batch.id().fingerprint()));
        assert!(expected.is_file());
        assert_eq!(store.list_validations()?, vec![second, first.clone()]);
        assert_eq!(store.load_validation(&first)?, res);
        Ok(())
    }
}

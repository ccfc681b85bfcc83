// vouch-core/src/application/checkpoint.rs

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use crate::application::actions::StandardActions;
use crate::application::context::DataContext;
use crate::domain::batch::{Batch, BatchLocator};
use crate::domain::checkpoint::{Checkpoint, CheckpointResult, run_checkpoint as execute_checkpoint};
use crate::domain::error::DomainError;
use crate::domain::registry::ExpectationRegistry;
use crate::error::VouchError;
use crate::ports::store::{CheckpointStore, RegistryStore};

/// One batch to validate. Without a registry name the checkpoint's own
/// registry is used.
#[derive(Debug, Clone)]
pub struct ValidationRequest {
    pub locator: BatchLocator,
    pub registry_name: Option<String>,
}

impl ValidationRequest {
    pub fn new(locator: BatchLocator) -> Self {
        Self {
            locator,
            registry_name: None,
        }
    }
}

impl DataContext {
    pub fn add_checkpoint(&self, checkpoint: &Checkpoint) -> Result<(), VouchError> {
        checkpoint.validate()?;
        if !self.store.exists(&checkpoint.registry_name)? {
            return Err(DomainError::RegistryNotFound(checkpoint.registry_name.clone()).into());
        }
        self.store.save_checkpoint(checkpoint)?;
        info!(checkpoint = %checkpoint.name, registry = %checkpoint.registry_name, "Checkpoint saved");
        Ok(())
    }

    pub fn load_checkpoint(&self, name: &str) -> Result<Checkpoint, VouchError> {
        self.store.load_checkpoint(name)
    }

    pub fn list_checkpoints(&self) -> Result<Vec<String>, VouchError> {
        self.store.list_checkpoints()
    }

    /// Loads the checkpoint, its registries and batches, then validates every
    /// pair and runs the checkpoint actions. `run_time` names the run.
    #[instrument(skip(self, requests, run_time))]
    pub async fn run_checkpoint(
        &self,
        name: &str,
        requests: &[ValidationRequest],
        run_time: DateTime<Utc>,
    ) -> Result<CheckpointResult, VouchError> {
        let checkpoint = self.store.load_checkpoint(name)?;
        if requests.is_empty() {
            return Err(DomainError::invalid_parameter("checkpoint", "at least one batch is required").into());
        }

        let mut loaded: Vec<(Batch, ExpectationRegistry)> = Vec::with_capacity(requests.len());
        for request in requests {
            let registry_name = request
                .registry_name
                .as_deref()
                .unwrap_or(&checkpoint.registry_name);
            let registry = self.store.load(registry_name)?;
            let batch = self.load_batch(&request.locator).await?;
            loaded.push((batch, registry));
        }
        let pairs: Vec<(&Batch, &ExpectationRegistry)> = loaded.iter().map(|(b, r)| (b, r)).collect();

        let mut executor = StandardActions::new(&self.store, &self.renderer, &self.notifier);
        let result = execute_checkpoint(&checkpoint, &pairs, run_time, &mut executor)?;

        for failure in result.action_failures() {
            warn!(checkpoint = name, action = %failure.action, "Action did not complete");
        }
        if !result.success {
            warn!(checkpoint = name, run = %result.run_name, "Checkpoint validation failed");
        }
        Ok(result)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::application::context::fixtures;
    use crate::domain::checkpoint::{ActionStatus, RunState};
    use crate::domain::expectation::Expectation;
    use crate::ports::store::ValidationStore;
    use anyhow::Result;
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn run_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn setup(ctx: &DataContext, rules: Vec<Expectation>) -> Result<ValidationRequest> {
        ctx.create_registry("taxi", false)?;
        let mut reg = ctx.load_registry("taxi")?;
        for rule in rules {
            reg.add(rule)?;
        }
        ctx.store().save(&reg)?;
        ctx.add_checkpoint(&Checkpoint::new("nightly", "taxi").with_run_name_template("%Y%m%d-%H%M%S-nightly"))?;
        Ok(ValidationRequest::new(ctx.source_locator("trips", &BTreeMap::new())?))
    }

    #[tokio::test]
    async fn test_successful_run_stores_and_renders() -> Result<()> {
        let (_dir, ctx) = fixtures::project()?;
        let request = setup(&ctx, vec![Expectation::between("congestion_surcharge", 0.0, 1000.0)])?;

        let res = ctx.run_checkpoint("nightly", &[request], run_time()).await?;

        assert!(res.success);
        assert_eq!(res.state, RunState::Succeeded);
        assert_eq!(res.run_name, "20240301-120000-nightly");
        let actions = &res.run_results[0].actions;
        assert!(matches!(actions[0].status, ActionStatus::Succeeded { .. }));
        assert!(matches!(actions[1].status, ActionStatus::Succeeded { .. }));
        assert_eq!(actions[2].status, ActionStatus::Skipped);

        let keys = ctx.store().list_validations()?;
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].run_name, "20240301-120000-nightly");
        assert!(ctx.store().site_dir().join("index.html").is_file());
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_run_notifies() -> Result<()> {
        let (_dir, ctx) = fixtures::project()?;
        let request = setup(
            &ctx,
            vec![
                Expectation::between("congestion_surcharge", 0.0, 1000.0),
                Expectation::not_null("passenger_count"),
            ],
        )?;

        let res = ctx.run_checkpoint("nightly", &[request], run_time()).await?;

        assert!(!res.success);
        assert_eq!(res.state, RunState::Failed);
        let pair = &res.run_results[0];
        assert!(pair.validation.results[0].met);
        assert!(!pair.validation.results[1].met);
        assert!(matches!(pair.actions[2].status, ActionStatus::Succeeded { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_action_failures_do_not_abort() -> Result<()> {
        let (_dir, ctx) = fixtures::project()?;
        let request = setup(&ctx, vec![Expectation::not_null("VendorID")])?;
        // A plain file where the results directory should be.
        std::fs::write(ctx.store().root().join("uncommitted"), "not a directory")?;

        let res = ctx.run_checkpoint("nightly", &[request], run_time()).await?;

        assert!(res.success);
        assert_eq!(res.action_failures().count(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_checkpoint_and_registry() -> Result<()> {
        let (_dir, ctx) = fixtures::project()?;
        let request = ValidationRequest::new(ctx.source_locator("trips", &BTreeMap::new())?);
        assert!(matches!(
            ctx.run_checkpoint("nightly", &[request], run_time()).await,
            Err(VouchError::Domain(DomainError::CheckpointNotFound(_)))
        ));
        assert!(matches!(
            ctx.add_checkpoint(&Checkpoint::new("nightly", "missing")),
            Err(VouchError::Domain(DomainError::RegistryNotFound(_)))
        ));
        Ok(())
    }
}

// vouch-core/src/application/registry.rs

use serde_json::{Map, Value as Json};
use tracing::{info, warn};

use crate::application::context::DataContext;
use crate::domain::batch::Batch;
use crate::domain::error::DomainError;
use crate::domain::expectation::{Expectation, RuleKind, Severity};
use crate::domain::registry::{EvaluationMode, ExpectationRegistry, RegistryAuthor};
use crate::error::VouchError;
use crate::ports::store::RegistryStore;

/// A rule as typed by a user: type name plus keyword parameters.
#[derive(Debug, Clone, Default)]
pub struct RuleSpec {
    pub rule_type: String,
    pub column: String,
    pub params: Map<String, Json>,
    pub severity: Severity,
    pub tolerance: Option<f64>,
    pub meta: Option<Json>,
}

impl RuleSpec {
    pub fn into_expectation(self) -> Result<Expectation, DomainError> {
        let mut expectation = Expectation::new(self.column, RuleKind::from_params(&self.rule_type, &self.params)?)
            .with_severity(self.severity);
        expectation.tolerance = self.tolerance;
        expectation.meta = self.meta;
        expectation.validate()?;
        Ok(expectation)
    }
}

impl DataContext {
    /// Creates and immediately persists an empty registry.
    pub fn create_registry(&self, name: &str, overwrite: bool) -> Result<ExpectationRegistry, VouchError> {
        if self.store.exists(name)? {
            if !overwrite {
                return Err(DomainError::AlreadyExists(name.to_string()).into());
            }
            warn!(registry = name, "Overwriting existing registry");
        }
        let registry = ExpectationRegistry::new(name);
        self.store.save(&registry)?;
        info!(registry = name, "Registry created");
        Ok(registry)
    }

    pub fn load_registry(&self, name: &str) -> Result<ExpectationRegistry, VouchError> {
        self.store.load(name)
    }

    pub fn list_registries(&self) -> Result<Vec<String>, VouchError> {
        self.store.list()
    }

    pub fn delete_registry(&self, name: &str) -> Result<(), VouchError> {
        self.store.delete(name)?;
        info!(registry = name, "Registry deleted");
        Ok(())
    }

    /// Opens an authoring session on a stored registry, in the configured
    /// evaluation mode. Eager sessions evaluate against `batch`, which is then
    /// required.
    pub fn author<'b>(&self, name: &str, batch: Option<&'b Batch>) -> Result<RegistryAuthor<'b>, VouchError> {
        let registry = self.store.load(name)?;
        match (self.config().evaluation_mode, batch) {
            (EvaluationMode::Eager, Some(batch)) => Ok(RegistryAuthor::eager(registry, batch)),
            (EvaluationMode::Eager, None) => Err(DomainError::invalid_parameter(
                "evaluation_mode",
                "eager authoring needs a batch to evaluate against",
            )
            .into()),
            (EvaluationMode::Deferred, _) => Ok(RegistryAuthor::deferred(registry)),
        }
    }

    /// Persists the session's rules, overwriting the stored registry.
    pub fn save_registry(&self, author: &RegistryAuthor<'_>, discard_failed: bool) -> Result<ExpectationRegistry, VouchError> {
        let registry = author.snapshot(discard_failed);
        let dropped = author.registry().len() - registry.len();
        self.store.save(&registry)?;
        info!(registry = %registry.name(), rules = registry.len(), dropped, "Registry saved");
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::context::fixtures;
    use crate::domain::context::ContextConfig;
    use anyhow::Result;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn spec(rule_type: &str, column: &str, params: Json) -> RuleSpec {
        RuleSpec {
            rule_type: rule_type.to_string(),
            column: column.to_string(),
            params: params.as_object().cloned().unwrap_or_default(),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_twice_requires_overwrite() -> Result<()> {
        let (_dir, ctx) = fixtures::project()?;
        ctx.create_registry("taxi", false)?;
        assert!(ctx.store().root().join("expectations/taxi.json").is_file());

        let again = ctx.create_registry("taxi", false);
        assert!(matches!(
            again,
            Err(VouchError::Domain(DomainError::AlreadyExists(_)))
        ));

        let mut author = ctx.author("taxi", None)?;
        author.add(spec("not_null", "VendorID", json!({})).into_expectation()?)?;
        ctx.save_registry(&author, false)?;
        assert_eq!(ctx.load_registry("taxi")?.len(), 1);

        let fresh = ctx.create_registry("taxi", true)?;
        assert!(fresh.is_empty());
        assert!(ctx.load_registry("taxi")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_deferred_save_keeps_every_rule() -> Result<()> {
        let (_dir, ctx) = fixtures::project()?;
        ctx.create_registry("taxi", false)?;

        let mut author = ctx.author("taxi", None)?;
        author.add(spec("between", "congestion_surcharge", json!({"min_value": 0, "max_value": 10})).into_expectation()?)?;
        author.add(spec("not_null", "passenger_count", json!({})).into_expectation()?)?;
        let saved = ctx.save_registry(&author, true)?;

        assert_eq!(saved.len(), 2);
        assert_eq!(ctx.list_registries()?, vec!["taxi"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_eager_save_discards_failed_rules() -> Result<()> {
        let (_dir, base) = fixtures::project()?;
        let mut config: ContextConfig = base.config().clone();
        config.evaluation_mode = EvaluationMode::Eager;
        let ctx = DataContext::new(base.project_dir(), config)?;

        ctx.create_registry("taxi", false)?;
        assert!(ctx.author("taxi", None).is_err());

        let batch = ctx.load_batch(&ctx.source_locator("trips", &BTreeMap::new())?).await?;
        let mut author = ctx.author("taxi", Some(&batch))?;
        let (_, outcome) = author.add(
            spec("between", "congestion_surcharge", json!({"min_value": 0, "max_value": 1000})).into_expectation()?,
        )?;
        assert!(outcome.is_some_and(|o| o.met));
        let (_, outcome) = author.add(spec("not_null", "passenger_count", json!({})).into_expectation()?)?;
        assert!(outcome.is_some_and(|o| !o.met));

        assert_eq!(ctx.save_registry(&author, false)?.len(), 2);
        let kept = ctx.save_registry(&author, true)?;
        assert_eq!(kept.len(), 1);
        assert_eq!(ctx.load_registry("taxi")?.expectations()[0].column, "congestion_surcharge");
        Ok(())
    }

    #[test]
    fn test_rule_spec_rejects_bad_params() {
        let bad = spec("between", "fare", json!({"low": 1})).into_expectation();
        assert!(matches!(bad, Err(DomainError::InvalidParameter { .. })));

        let mut tolerant = spec("not_null", "fare", json!({}));
        tolerant.tolerance = Some(1.5);
        assert!(tolerant.into_expectation().is_err());
    }

    #[test]
    fn test_delete_registry() -> Result<()> {
        let (_dir, ctx) = fixtures::project()?;
        ctx.create_registry("taxi", false)?;
        ctx.delete_registry("taxi")?;
        assert!(matches!(
            ctx.load_registry("taxi"),
            Err(VouchError::Domain(DomainError::RegistryNotFound(_)))
        ));
        Ok(())
    }
}

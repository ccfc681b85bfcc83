// vouch-core/src/domain/registry.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use std::collections::BTreeMap;
use tracing::debug;

use crate::domain::batch::Batch;
use crate::domain::error::DomainError;
use crate::domain::expectation::{Expectation, RuleKind};
use crate::domain::validation::{ExpectationOutcome, evaluate_expectation};

/// Position of a rule inside its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleHandle(usize);

impl RuleHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A named, ordered collection of expectations (a "suite").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationRegistry {
    name: String,
    #[serde(default)]
    expectations: Vec<Expectation>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    meta: BTreeMap<String, Json>,
}

impl ExpectationRegistry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expectations: Vec::new(),
            meta: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expectations(&self) -> &[Expectation] {
        &self.expectations
    }

    pub fn meta(&self) -> &BTreeMap<String, Json> {
        &self.meta
    }

    pub fn set_meta(&mut self, key: impl Into<String>, value: Json) {
        self.meta.insert(key.into(), value);
    }

    pub fn len(&self) -> usize {
        self.expectations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expectations.is_empty()
    }

    pub fn get(&self, handle: RuleHandle) -> Option<&Expectation> {
        self.expectations.get(handle.0)
    }

    /// Validates and records a rule. A rule with the same `(type, column)`
    /// identity replaces the existing one in place, anything else is appended.
    /// The boolean tells whether an existing rule was replaced.
    pub fn add(&mut self, expectation: Expectation) -> Result<(RuleHandle, bool), DomainError> {
        expectation.validate()?;
        let existing = self
            .expectations
            .iter()
            .position(|e| e.identity() == expectation.identity());

        match existing {
            Some(idx) => {
                debug!(registry = %self.name, rule = expectation.rule.name(), column = %expectation.column, "Replacing rule");
                self.expectations[idx] = expectation;
                Ok((RuleHandle(idx), true))
            }
            None => {
                self.expectations.push(expectation);
                Ok((RuleHandle(self.expectations.len() - 1), false))
            }
        }
    }

    fn retain_indices(&mut self, keep: impl Fn(usize) -> bool) {
        let mut idx = 0;
        self.expectations.retain(|_| {
            let kept = keep(idx);
            idx += 1;
            kept
        });
    }
}

/// Whether rules are evaluated as soon as they are added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationMode {
    Eager,
    #[default]
    Deferred,
}

enum Authoring<'b> {
    Eager(&'b Batch),
    Deferred,
}

/// Single-writer authoring session over a registry. The evaluation mode is
/// fixed when the session is opened.
pub struct RegistryAuthor<'b> {
    registry: ExpectationRegistry,
    mode: Authoring<'b>,
    // Parallel to `registry.expectations`: outcome of the immediate evaluation.
    immediate: Vec<Option<bool>>,
}

impl<'b> RegistryAuthor<'b> {
    pub fn deferred(registry: ExpectationRegistry) -> Self {
        let immediate = vec![None; registry.len()];
        Self {
            registry,
            mode: Authoring::Deferred,
            immediate,
        }
    }

    pub fn eager(registry: ExpectationRegistry, batch: &'b Batch) -> Self {
        let immediate = vec![None; registry.len()];
        Self {
            registry,
            mode: Authoring::Eager(batch),
            immediate,
        }
    }

    pub fn mode(&self) -> EvaluationMode {
        match self.mode {
            Authoring::Eager(_) => EvaluationMode::Eager,
            Authoring::Deferred => EvaluationMode::Deferred,
        }
    }

    pub fn registry(&self) -> &ExpectationRegistry {
        &self.registry
    }

    /// Records a rule. In eager mode the rule is evaluated first, so engine
    /// faults (e.g. a missing column) reject it; the outcome is returned.
    pub fn add(
        &mut self,
        expectation: Expectation,
    ) -> Result<(RuleHandle, Option<ExpectationOutcome>), DomainError> {
        expectation.validate()?;
        let outcome = match self.mode {
            Authoring::Eager(batch) => Some(evaluate_expectation(batch, &expectation)?),
            Authoring::Deferred => None,
        };

        let (handle, replaced) = self.registry.add(expectation)?;
        let met = outcome.as_ref().map(|o| o.met);
        if replaced {
            self.immediate[handle.index()] = met;
        } else {
            self.immediate.push(met);
        }
        Ok((handle, outcome))
    }

    /// `add` from a rule type name and keyword parameters.
    pub fn add_rule(
        &mut self,
        rule_type: &str,
        column: &str,
        params: &Map<String, Json>,
        meta: Option<Json>,
    ) -> Result<RuleHandle, DomainError> {
        let mut expectation = Expectation::new(column, RuleKind::from_params(rule_type, params)?);
        expectation.meta = meta;
        self.add(expectation).map(|(handle, _)| handle)
    }

    /// The registry as it should be persisted.
    ///
    /// `discard_failed` only matters for eager sessions: rules whose immediate
    /// evaluation failed are left out. Deferred sessions have no immediate
    /// outcome, so every rule is kept whatever the flag says. The session
    /// itself is left untouched.
    pub fn snapshot(&self, discard_failed: bool) -> ExpectationRegistry {
        let mut registry = self.registry.clone();
        if discard_failed && self.mode() == EvaluationMode::Eager {
            let immediate = &self.immediate;
            registry.retain_indices(|i| immediate.get(i).copied().flatten() != Some(false));
        }
        registry
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::batch::{BatchIdentifier, ScalarType, Value};
    use anyhow::Result;
    use serde_json::json;

    fn batch() -> Result<Batch> {
        Ok(Batch::builder(BatchIdentifier::new("trips"))
            .column(
                "passenger_count",
                ScalarType::Integer,
                vec![Value::Integer(1), Value::Null],
            )
            .column(
                "congestion_surcharge",
                ScalarType::Double,
                vec![Value::Double(0.5), Value::Double(2.5)],
            )
            .build()?)
    }

    #[test]
    fn test_add_appends_in_order() -> Result<()> {
        let mut reg = ExpectationRegistry::new("taxi");
        let (h1, _) = reg.add(Expectation::not_null("a"))?;
        let (h2, _) = reg.add(Expectation::between("a", 0.0, 1.0))?;
        assert_eq!((h1.index(), h2.index()), (0, 1));
        assert_eq!(reg.len(), 2);
        Ok(())
    }

    #[test]
    fn test_same_identity_replaces_in_place() -> Result<()> {
        let mut reg = ExpectationRegistry::new("taxi");
        reg.add(Expectation::between("a", 0.0, 1.0))?;
        reg.add(Expectation::not_null("a"))?;
        let (handle, replaced) = reg.add(Expectation::between("a", 0.0, 5.0))?;
        assert!(replaced);
        assert_eq!(handle.index(), 0);
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.get(handle), Some(&Expectation::between("a", 0.0, 5.0)));
        Ok(())
    }

    #[test]
    fn test_invalid_parameters_rejected_at_add() {
        let mut reg = ExpectationRegistry::new("taxi");
        assert!(matches!(
            reg.add(Expectation::between("a", 10.0, 1.0)),
            Err(DomainError::InvalidParameter { .. })
        ));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_deferred_session_keeps_everything() -> Result<()> {
        let mut author = RegistryAuthor::deferred(ExpectationRegistry::new("taxi"));
        let (_, outcome) = author.add(Expectation::not_null("passenger_count"))?;
        assert!(outcome.is_none());
        // Deferred sessions do not look at any data, not even column names.
        author.add(Expectation::not_null("does_not_exist"))?;

        assert_eq!(author.mode(), EvaluationMode::Deferred);
        assert_eq!(author.snapshot(true).len(), 2);
        assert_eq!(author.snapshot(false).len(), 2);
        Ok(())
    }

    #[test]
    fn test_eager_session_discards_failed_only_when_asked() -> Result<()> {
        let batch = batch()?;
        let mut author = RegistryAuthor::eager(ExpectationRegistry::new("taxi"), &batch);

        let (_, outcome) = author.add(Expectation::not_null("passenger_count"))?;
        assert_eq!(outcome.map(|o| o.met), Some(false));
        let (_, outcome) = author.add(Expectation::between("congestion_surcharge", 0.0, 10.0))?;
        assert_eq!(outcome.map(|o| o.met), Some(true));

        let kept = author.snapshot(false);
        assert_eq!(kept.len(), 2);

        let trimmed = author.snapshot(true);
        assert_eq!(trimmed.len(), 1);
        assert_eq!(trimmed.expectations()[0].column, "congestion_surcharge");

        // The session still holds both rules.
        assert_eq!(author.registry().len(), 2);
        Ok(())
    }

    #[test]
    fn test_eager_replacement_updates_outcome() -> Result<()> {
        let batch = batch()?;
        let mut author = RegistryAuthor::eager(ExpectationRegistry::new("taxi"), &batch);
        author.add(Expectation::between("congestion_surcharge", 0.0, 1.0))?;
        assert_eq!(author.snapshot(true).len(), 0);
        author.add(Expectation::between("congestion_surcharge", 0.0, 3.0))?;
        assert_eq!(author.snapshot(true).len(), 1);
        Ok(())
    }

    #[test]
    fn test_eager_session_rejects_missing_column() -> Result<()> {
        let batch = batch()?;
        let mut author = RegistryAuthor::eager(ExpectationRegistry::new("taxi"), &batch);
        let err = author.add(Expectation::not_null("tip_amount")).unwrap_err();
        assert!(matches!(err, DomainError::ColumnNotFound { .. }));
        assert!(author.registry().is_empty());
        Ok(())
    }

    #[test]
    fn test_add_rule_with_meta() -> Result<()> {
        let mut author = RegistryAuthor::deferred(ExpectationRegistry::new("taxi"));
        let params = json!({"min_value": 0, "max_value": 1000});
        let handle = author.add_rule(
            "between",
            "congestion_surcharge",
            params.as_object().unwrap(),
            Some(json!({"notes": "surcharge in cents"})),
        )?;
        let exp = author.registry().get(handle).unwrap();
        assert_eq!(exp.notes(), Some("surcharge in cents"));
        Ok(())
    }

    #[test]
    fn test_existing_rules_have_no_immediate_outcome() -> Result<()> {
        let batch = batch()?;
        let mut reg = ExpectationRegistry::new("taxi");
        reg.add(Expectation::not_null("passenger_count"))?;
        let author = RegistryAuthor::eager(reg, &batch);
        assert_eq!(author.snapshot(true).len(), 1);
        Ok(())
    }
}

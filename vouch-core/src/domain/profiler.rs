// vouch-core/src/domain/profiler.rs

//! Infers a baseline registry from the values of a batch.

use serde_json::json;
use std::collections::{BTreeSet, HashSet};
use tracing::info;

use crate::domain::batch::{Batch, Column, ScalarType, Value};
use crate::domain::error::DomainError;
use crate::domain::expectation::{Expectation, RuleKind};
use crate::domain::registry::ExpectationRegistry;
use crate::domain::validation::{ValidationResult, evaluate};

/// String columns with at most this many distinct values get an `in_set` rule.
pub const MAX_SET_CARDINALITY: usize = 10;

pub fn profile_registry_name(batch: &Batch) -> String {
    format!("{}.profile", batch.id().data_asset_name)
}

/// Builds the candidate registry and evaluates it against the same batch.
/// Nothing is persisted here.
pub fn profile(batch: &Batch) -> Result<(ExpectationRegistry, ValidationResult), DomainError> {
    let mut registry = ExpectationRegistry::new(profile_registry_name(batch));
    registry.set_meta("profiler", json!("basic"));

    for column in batch.columns() {
        for expectation in infer_column(column) {
            registry.add(expectation)?;
        }
    }

    let baseline = evaluate(batch, &registry)?;
    info!(
        batch = %batch.id(),
        rules = registry.len(),
        success = baseline.success,
        "Profiled batch"
    );
    Ok((registry, baseline))
}

fn infer_column(column: &Column) -> Vec<Expectation> {
    let mut rules = Vec::new();

    let total = column.values.len();
    let missing = column.null_count();
    let mut not_null = Expectation::not_null(&column.name);
    if missing > 0 && total > 0 {
        not_null = not_null.with_tolerance(missing as f64 / total as f64);
    }
    rules.push(not_null);

    if column.scalar_type.is_numeric() {
        let numbers: Vec<f64> = column.non_null().filter_map(|(_, v)| v.as_f64()).collect();
        let (min, max) = numbers
            .iter()
            .copied()
            .filter(|x| x.is_finite())
            .fold((None::<f64>, None::<f64>), |(lo, hi), x| {
                (Some(lo.map_or(x, |l| l.min(x))), Some(hi.map_or(x, |h| h.max(x))))
            });
        if min.is_some() || max.is_some() {
            // NaN and infinities fall outside any bounds: tolerate their share.
            let non_finite = numbers.iter().filter(|x| !x.is_finite()).count();
            let mut between = Expectation::new(&column.name, RuleKind::Between { min, max });
            if non_finite > 0 {
                between = between.with_tolerance(non_finite as f64 / numbers.len() as f64);
            }
            rules.push(between);
        }
    }

    if column.scalar_type == ScalarType::String {
        let distinct: BTreeSet<&str> = column.non_null().filter_map(|(_, v)| v.as_str()).collect();
        if !distinct.is_empty() && distinct.len() <= MAX_SET_CARDINALITY {
            let values = distinct.into_iter().map(Value::from).collect();
            rules.push(Expectation::new(&column.name, RuleKind::InSet { values }));
        }
    }

    let non_null: Vec<String> = column.non_null().map(|(_, v)| v.to_string()).collect();
    let distinct: HashSet<&String> = non_null.iter().collect();
    if non_null.len() > 1 && distinct.len() == non_null.len() {
        rules.push(Expectation::new(&column.name, RuleKind::Unique));
    }

    rules
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::batch::BatchIdentifier;
    use crate::domain::expectation::Severity;
    use anyhow::Result;

    fn trips() -> Result<Batch> {
        Ok(Batch::builder(BatchIdentifier::new("trips").with("stage", "dev"))
            .column(
                "id",
                ScalarType::Integer,
                vec![Value::Integer(1), Value::Integer(2), Value::Integer(3), Value::Integer(4)],
            )
            .column(
                "fare",
                ScalarType::Double,
                vec![Value::Double(2.5), Value::Null, Value::Double(7.25), Value::Double(2.5)],
            )
            .column(
                "payment",
                ScalarType::String,
                vec![
                    Value::from("card"),
                    Value::from("cash"),
                    Value::from("card"),
                    Value::Null,
                ],
            )
            .build()?)
    }

    fn rules_for<'a>(reg: &'a ExpectationRegistry, column: &str) -> Vec<&'a str> {
        reg.expectations()
            .iter()
            .filter(|e| e.column == column)
            .map(|e| e.rule.name())
            .collect()
    }

    #[test]
    fn test_profile_infers_rules_per_column() -> Result<()> {
        let (reg, _) = profile(&trips()?)?;

        assert_eq!(reg.name(), "trips.profile");
        assert_eq!(reg.meta().get("profiler"), Some(&json!("basic")));
        assert_eq!(rules_for(&reg, "id"), vec!["not_null", "between", "unique"]);
        assert_eq!(rules_for(&reg, "fare"), vec!["not_null", "between"]);
        assert_eq!(rules_for(&reg, "payment"), vec!["not_null", "in_set"]);
        assert!(reg.expectations().iter().all(|e| e.severity == Severity::Error));
        Ok(())
    }

    #[test]
    fn test_null_fraction_becomes_tolerance() -> Result<()> {
        let (reg, _) = profile(&trips()?)?;
        let fare_not_null = &reg.expectations()[3];
        assert_eq!(fare_not_null.column, "fare");
        assert_eq!(fare_not_null.tolerance, Some(0.25));
        assert_eq!(reg.expectations()[0].tolerance, None);

        let fare_between = &reg.expectations()[4];
        assert_eq!(
            fare_between.rule,
            RuleKind::Between {
                min: Some(2.5),
                max: Some(7.25)
            }
        );
        Ok(())
    }

    #[test]
    fn test_baseline_succeeds_on_its_own_batch() -> Result<()> {
        let (reg, baseline) = profile(&trips()?)?;
        assert!(baseline.success);
        assert_eq!(baseline.statistics.evaluated, reg.len());
        assert_eq!(baseline.registry_name, "trips.profile");
        Ok(())
    }

    #[test]
    fn test_high_cardinality_strings_get_no_set() -> Result<()> {
        let values: Vec<Value> = (0..11).map(|i| Value::from(format!("v{}", i))).collect();
        let batch = Batch::builder(BatchIdentifier::new("codes"))
            .column("code", ScalarType::String, values)
            .build()?;
        let (reg, baseline) = profile(&batch)?;
        assert_eq!(rules_for(&reg, "code"), vec!["not_null", "unique"]);
        assert!(baseline.success);
        Ok(())
    }

    #[test]
    fn test_non_finite_values_do_not_break_the_profile() -> Result<()> {
        let batch = Batch::builder(BatchIdentifier::new("meters"))
            .column(
                "reading",
                ScalarType::Double,
                vec![Value::Double(1.0), Value::Double(f64::INFINITY), Value::Double(3.0), Value::Double(f64::NAN)],
            )
            .column("broken", ScalarType::Double, vec![Value::Double(f64::NAN), Value::Null])
            .build()?;

        let (reg, baseline) = profile(&batch)?;

        let between = reg
            .expectations()
            .iter()
            .find(|e| e.column == "reading" && e.rule.name() == "between")
            .unwrap();
        assert_eq!(
            between.rule,
            RuleKind::Between {
                min: Some(1.0),
                max: Some(3.0)
            }
        );
        assert_eq!(between.tolerance, Some(0.5));
        assert_eq!(rules_for(&reg, "broken"), vec!["not_null"]);
        assert!(baseline.success);
        Ok(())
    }
}

// vouch-core/src/domain/validation.rs

//! The validation engine.
//!
//! Null policy: `not_null` is the only rule that counts nulls as unexpected.
//! Every other rule excludes nulls from both its violation count and the
//! denominator of its unexpected fraction, so a `between` over a column with
//! nulls only judges the values that are present. Pair it with `not_null`
//! to flag missing values. NaN is a value, not a null: `between` counts it
//! as unexpected.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::domain::batch::{Batch, BatchIdentifier, Column, ScalarType, Value};
use crate::domain::error::DomainError;
use crate::domain::expectation::{Expectation, RuleKind};
use crate::domain::registry::ExpectationRegistry;

/// How many unexpected values (and their row indexes) are kept per rule.
pub const PARTIAL_UNEXPECTED_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ObservedStats {
    pub element_count: usize,
    pub missing_count: usize,
    pub unexpected_count: usize,
    pub unexpected_fraction: f64,
    /// Aggregate statistic for column-level rules (e.g. the observed mean).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_value: Option<f64>,
    #[serde(default)]
    pub partial_unexpected: Vec<Value>,
    #[serde(default)]
    pub partial_unexpected_rows: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationOutcome {
    pub expectation: Expectation,
    pub met: bool,
    pub observed: ObservedStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ValidationStatistics {
    pub evaluated: usize,
    pub successful: usize,
    pub unsuccessful: usize,
    pub success_percent: f64,
}

/// Outcome of one registry against one batch. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub batch_id: BatchIdentifier,
    pub registry_name: String,
    pub success: bool,
    pub results: Vec<ExpectationOutcome>,
    pub statistics: ValidationStatistics,
}

impl ValidationResult {
    pub fn failed(&self) -> impl Iterator<Item = &ExpectationOutcome> {
        self.results.iter().filter(|r| !r.met)
    }
}

/// Evaluates every rule of `registry` against `batch`, in declaration order.
///
/// Engine faults (missing column, rule not applicable to the column type) are
/// detected for all rules before any of them runs. A rule that is not met is
/// a normal outcome and never stops the remaining rules.
pub fn evaluate(batch: &Batch, registry: &ExpectationRegistry) -> Result<ValidationResult, DomainError> {
    let prepared = registry
        .expectations()
        .iter()
        .map(|exp| PreparedRule::prepare(batch, exp))
        .collect::<Result<Vec<_>, _>>()?;

    let results: Vec<ExpectationOutcome> = prepared.into_iter().map(PreparedRule::run).collect();

    let evaluated = results.len();
    let successful = results.iter().filter(|r| r.met).count();
    let success = results
        .iter()
        .filter(|r| r.expectation.severity.is_critical())
        .all(|r| r.met);

    let statistics = ValidationStatistics {
        evaluated,
        successful,
        unsuccessful: evaluated - successful,
        success_percent: if evaluated == 0 {
            100.0
        } else {
            successful as f64 * 100.0 / evaluated as f64
        },
    };

    info!(
        registry = %registry.name(),
        batch = %batch.id(),
        evaluated,
        successful,
        success,
        "Validation finished"
    );

    Ok(ValidationResult {
        batch_id: batch.id().clone(),
        registry_name: registry.name().to_string(),
        success,
        results,
        statistics,
    })
}

/// Evaluates a single rule. Used by eager authoring sessions.
pub fn evaluate_expectation(batch: &Batch, expectation: &Expectation) -> Result<ExpectationOutcome, DomainError> {
    Ok(PreparedRule::prepare(batch, expectation)?.run())
}

// --- RULE PREPARATION ---

enum Check {
    NotNull,
    Between { min: Option<f64>, max: Option<f64> },
    InSet(Vec<Value>),
    Regex(Regex),
    Unique,
    MeanBetween { min: Option<f64>, max: Option<f64> },
    Lengths { min: Option<usize>, max: Option<usize> },
}

struct PreparedRule<'a> {
    expectation: &'a Expectation,
    column: &'a Column,
    check: Check,
}

impl<'a> PreparedRule<'a> {
    fn prepare(batch: &'a Batch, expectation: &'a Expectation) -> Result<Self, DomainError> {
        expectation.validate()?;
        let column = batch.column(&expectation.column)?;
        let rule = expectation.rule.name();

        let require = |ok: bool, wanted: &str| {
            if ok {
                Ok(())
            } else {
                Err(DomainError::invalid_parameter(
                    rule,
                    format!(
                        "column '{}' is {} but the rule needs {} values",
                        column.name, column.scalar_type, wanted
                    ),
                ))
            }
        };

        let check = match &expectation.rule {
            RuleKind::NotNull => Check::NotNull,
            RuleKind::Unique => Check::Unique,
            RuleKind::Between { min, max } => {
                require(column.scalar_type.is_numeric(), "numeric")?;
                Check::Between { min: *min, max: *max }
            }
            RuleKind::MeanBetween { min, max } => {
                require(column.scalar_type.is_numeric(), "numeric")?;
                Check::MeanBetween { min: *min, max: *max }
            }
            RuleKind::InSet { values } => Check::InSet(values.clone()),
            RuleKind::MatchRegex { pattern } => {
                require(column.scalar_type == ScalarType::String, "string")?;
                let regex = Regex::new(pattern)
                    .map_err(|e| DomainError::invalid_parameter(rule, e.to_string()))?;
                Check::Regex(regex)
            }
            RuleKind::ValueLengthsBetween { min, max } => {
                require(column.scalar_type == ScalarType::String, "string")?;
                Check::Lengths { min: *min, max: *max }
            }
        };

        Ok(Self {
            expectation,
            column,
            check,
        })
    }

    fn run(self) -> ExpectationOutcome {
        let element_count = self.column.values.len();
        let missing_count = self.column.null_count();
        let non_null = element_count - missing_count;

        let (unexpected, denominator, observed_value, aggregate_met) = match &self.check {
            Check::NotNull => {
                let rows: Vec<usize> = self
                    .column
                    .values
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| v.is_null())
                    .map(|(i, _)| i)
                    .collect();
                (rows, element_count, None, None)
            }
            Check::Between { min, max } => {
                let rows = self.unexpected_rows(|v| {
                    v.as_f64().is_some_and(|x| {
                        x.is_nan() || min.is_some_and(|lo| x < lo) || max.is_some_and(|hi| x > hi)
                    })
                });
                (rows, non_null, None, None)
            }
            Check::InSet(allowed) => {
                let rows = self.unexpected_rows(|v| !allowed.iter().any(|a| a.loosely_eq(v)));
                (rows, non_null, None, None)
            }
            Check::Regex(regex) => {
                let rows = self.unexpected_rows(|v| v.as_str().is_some_and(|s| !regex.is_match(s)));
                (rows, non_null, None, None)
            }
            Check::Lengths { min, max } => {
                let rows = self.unexpected_rows(|v| {
                    v.as_str().is_some_and(|s| {
                        let len = s.chars().count();
                        min.is_some_and(|lo| len < lo) || max.is_some_and(|hi| len > hi)
                    })
                });
                (rows, non_null, None, None)
            }
            Check::Unique => {
                let mut counts: HashMap<String, usize> = HashMap::new();
                for (_, v) in self.column.non_null() {
                    *counts.entry(v.to_string()).or_default() += 1;
                }
                let rows = self.unexpected_rows(|v| counts.get(&v.to_string()).copied().unwrap_or(0) > 1);
                (rows, non_null, None, None)
            }
            Check::MeanBetween { min, max } => {
                let (sum, n) = self
                    .column
                    .non_null()
                    .filter_map(|(_, v)| v.as_f64())
                    .fold((0.0, 0usize), |(s, n), x| (s + x, n + 1));
                let mean = (n > 0).then(|| sum / n as f64);
                let met = mean.is_some_and(|m| {
                    min.is_none_or(|lo| m >= lo) && max.is_none_or(|hi| m <= hi)
                });
                (Vec::new(), non_null, mean, Some(met))
            }
        };

        let unexpected_count = unexpected.len();
        let unexpected_fraction = if denominator == 0 {
            0.0
        } else {
            unexpected_count as f64 / denominator as f64
        };

        let met = aggregate_met.unwrap_or_else(|| match self.expectation.tolerance {
            Some(tolerance) => unexpected_fraction <= tolerance,
            None => unexpected_count == 0,
        });

        let partial_rows: Vec<usize> = unexpected.iter().copied().take(PARTIAL_UNEXPECTED_LIMIT).collect();
        let partial_unexpected = partial_rows
            .iter()
            .map(|&row| self.column.values[row].clone())
            .collect();

        debug!(
            rule = self.expectation.rule.name(),
            column = %self.column.name,
            unexpected_count,
            met,
            "Rule evaluated"
        );

        ExpectationOutcome {
            expectation: self.expectation.clone(),
            met,
            observed: ObservedStats {
                element_count,
                missing_count,
                unexpected_count,
                unexpected_fraction,
                observed_value,
                partial_unexpected,
                partial_unexpected_rows: partial_rows,
            },
        }
    }

    /// Row indexes of non-null values for which `is_unexpected` holds.
    fn unexpected_rows(&self, is_unexpected: impl Fn(&Value) -> bool) -> Vec<usize> {
        self.column
            .non_null()
            .filter(|(_, v)| is_unexpected(v))
            .map(|(i, _)| i)
            .collect()
    }
}

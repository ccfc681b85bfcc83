// vouch-core/src/domain/expectation.rs

//! Declarative rules about a column's values.
//!
//! Every rule kind declares the parameters it accepts. Parameters are checked
//! when the rule is built (`Expectation::validate`, `RuleKind::from_params`),
//! never silently coerced.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

use crate::domain::batch::Value;
use crate::domain::error::DomainError;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Counts towards the overall success flag.
    #[default]
    Error,
    /// Reported, but never fails a validation.
    Warning,
}

impl Severity {
    pub fn is_critical(self) -> bool {
        self == Severity::Error
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(Severity::Error),
            "warning" | "warn" => Ok(Severity::Warning),
            other => Err(DomainError::invalid_parameter(
                "severity",
                format!("unknown severity '{}'", other),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleKind {
    NotNull,
    Between {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    InSet {
        values: Vec<Value>,
    },
    MatchRegex {
        pattern: String,
    },
    Unique,
    MeanBetween {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    ValueLengthsBetween {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<usize>,
    },
}

impl RuleKind {
    pub const NAMES: [&'static str; 7] = [
        "not_null",
        "between",
        "in_set",
        "match_regex",
        "unique",
        "mean_between",
        "value_lengths_between",
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RuleKind::NotNull => "not_null",
            RuleKind::Between { .. } => "between",
            RuleKind::InSet { .. } => "in_set",
            RuleKind::MatchRegex { .. } => "match_regex",
            RuleKind::Unique => "unique",
            RuleKind::MeanBetween { .. } => "mean_between",
            RuleKind::ValueLengthsBetween { .. } => "value_lengths_between",
        }
    }

    /// Aggregate rules judge one statistic of the column instead of each row.
    pub fn is_aggregate(&self) -> bool {
        matches!(self, RuleKind::MeanBetween { .. })
    }

    pub fn describe(&self) -> String {
        match self {
            RuleKind::NotNull => "values must never be null".to_string(),
            RuleKind::Between { min, max } => format!("values must be {}", bounds(*min, *max)),
            RuleKind::InSet { values } => {
                let shown: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                format!("values must belong to {{{}}}", shown.join(", "))
            }
            RuleKind::MatchRegex { pattern } => format!("values must match /{}/", pattern),
            RuleKind::Unique => "values must be unique".to_string(),
            RuleKind::MeanBetween { min, max } => format!("mean must be {}", bounds(*min, *max)),
            RuleKind::ValueLengthsBetween { min, max } => format!(
                "value lengths must be {}",
                bounds(min.map(|v| v as f64), max.map(|v| v as f64))
            ),
        }
    }

    /// Builds a rule from its type name and a keyword parameter map, e.g.
    /// `between` + `{"min_value": 0, "max_value": 1000}`. Unknown rule types,
    /// unknown keys and malformed values are rejected.
    pub fn from_params(rule_type: &str, params: &Map<String, Json>) -> Result<Self, DomainError> {
        let allowed: &[&str] = match rule_type {
            "not_null" | "unique" => &[],
            "between" | "mean_between" | "value_lengths_between" => &["min_value", "max_value"],
            "in_set" => &["value_set"],
            "match_regex" => &["regex"],
            other => {
                return Err(DomainError::invalid_parameter(
                    other,
                    format!("unknown rule type (expected one of {})", Self::NAMES.join(", ")),
                ));
            }
        };
        if let Some(key) = params.keys().find(|k| !allowed.contains(&k.as_str())) {
            return Err(DomainError::invalid_parameter(
                rule_type,
                format!("unexpected parameter '{}'", key),
            ));
        }

        let kind = match rule_type {
            "not_null" => RuleKind::NotNull,
            "unique" => RuleKind::Unique,
            "between" => RuleKind::Between {
                min: number_param(rule_type, params, "min_value")?,
                max: number_param(rule_type, params, "max_value")?,
            },
            "mean_between" => RuleKind::MeanBetween {
                min: number_param(rule_type, params, "min_value")?,
                max: number_param(rule_type, params, "max_value")?,
            },
            "value_lengths_between" => RuleKind::ValueLengthsBetween {
                min: length_param(rule_type, params, "min_value")?,
                max: length_param(rule_type, params, "max_value")?,
            },
            "in_set" => {
                let raw = params.get("value_set").and_then(Json::as_array).ok_or_else(|| {
                    DomainError::invalid_parameter(rule_type, "'value_set' must be an array")
                })?;
                let values = raw
                    .iter()
                    .map(|v| json_to_value(rule_type, v))
                    .collect::<Result<Vec<_>, _>>()?;
                RuleKind::InSet { values }
            }
            _ => {
                let pattern = params.get("regex").and_then(Json::as_str).ok_or_else(|| {
                    DomainError::invalid_parameter(rule_type, "'regex' must be a string")
                })?;
                RuleKind::MatchRegex {
                    pattern: pattern.to_string(),
                }
            }
        };
        kind.validate()?;
        Ok(kind)
    }

    /// Checks the parameter schema of this rule kind.
    pub fn validate(&self) -> Result<(), DomainError> {
        let rule = self.name();
        match self {
            RuleKind::NotNull | RuleKind::Unique => Ok(()),
            RuleKind::Between { min, max } | RuleKind::MeanBetween { min, max } => {
                check_bounds(rule, *min, *max)
            }
            RuleKind::ValueLengthsBetween { min, max } => {
                check_bounds(rule, min.map(|v| v as f64), max.map(|v| v as f64))
            }
            RuleKind::InSet { values } => {
                if values.is_empty() {
                    return Err(DomainError::invalid_parameter(rule, "value set is empty"));
                }
                if values.iter().any(Value::is_null) {
                    return Err(DomainError::invalid_parameter(
                        rule,
                        "value set cannot contain null",
                    ));
                }
                Ok(())
            }
            RuleKind::MatchRegex { pattern } => Regex::new(pattern)
                .map(|_| ())
                .map_err(|e| DomainError::invalid_parameter(rule, e.to_string())),
        }
    }
}

fn bounds(min: Option<f64>, max: Option<f64>) -> String {
    match (min, max) {
        (Some(lo), Some(hi)) => format!("between {} and {}", lo, hi),
        (Some(lo), None) => format!("at least {}", lo),
        (None, Some(hi)) => format!("at most {}", hi),
        (None, None) => "unbounded".to_string(),
    }
}

fn check_bounds(rule: &str, min: Option<f64>, max: Option<f64>) -> Result<(), DomainError> {
    if min.is_none() && max.is_none() {
        return Err(DomainError::invalid_parameter(
            rule,
            "at least one of min/max is required",
        ));
    }
    if min.is_some_and(|v| !v.is_finite()) || max.is_some_and(|v| !v.is_finite()) {
        return Err(DomainError::invalid_parameter(rule, "bounds must be finite"));
    }
    if let (Some(lo), Some(hi)) = (min, max)
        && lo > hi
    {
        return Err(DomainError::invalid_parameter(
            rule,
            format!("min ({}) is greater than max ({})", lo, hi),
        ));
    }
    Ok(())
}

fn number_param(rule: &str, params: &Map<String, Json>, key: &str) -> Result<Option<f64>, DomainError> {
    match params.get(key) {
        None | Some(Json::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| DomainError::invalid_parameter(rule, format!("'{}' must be numeric", key))),
    }
}

fn length_param(rule: &str, params: &Map<String, Json>, key: &str) -> Result<Option<usize>, DomainError> {
    match params.get(key) {
        None | Some(Json::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .map(|n| Some(n as usize))
            .ok_or_else(|| {
                DomainError::invalid_parameter(rule, format!("'{}' must be a non-negative integer", key))
            }),
    }
}

fn json_to_value(rule: &str, raw: &Json) -> Result<Value, DomainError> {
    match raw {
        Json::Bool(b) => Ok(Value::Boolean(*b)),
        Json::Number(n) => n
            .as_i64()
            .map(Value::Integer)
            .or_else(|| n.as_f64().map(Value::Double))
            .ok_or_else(|| DomainError::invalid_parameter(rule, format!("unsupported number {}", n))),
        Json::String(s) => Ok(Value::String(s.clone())),
        other => Err(DomainError::invalid_parameter(
            rule,
            format!("unsupported set member {}", other),
        )),
    }
}

/// A rule bound to a target column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expectation {
    pub rule: RuleKind,
    pub column: String,

    /// Maximum tolerated fraction of unexpected values, in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,

    #[serde(default)]
    pub severity: Severity,

    /// Free-form notes (e.g. `{"notes": {"format": "markdown", "content": "..."}}`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Json>,
}

impl Expectation {
    pub fn new(column: impl Into<String>, rule: RuleKind) -> Self {
        Self {
            rule,
            column: column.into(),
            tolerance: None,
            severity: Severity::Error,
            meta: None,
        }
    }

    pub fn not_null(column: impl Into<String>) -> Self {
        Self::new(column, RuleKind::NotNull)
    }

    pub fn between(column: impl Into<String>, min: f64, max: f64) -> Self {
        Self::new(
            column,
            RuleKind::Between {
                min: Some(min),
                max: Some(max),
            },
        )
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_meta(mut self, meta: Json) -> Self {
        self.meta = Some(meta);
        self
    }

    /// `(rule type, column)`: adding a rule with the same identity replaces it.
    pub fn identity(&self) -> (&'static str, &str) {
        (self.rule.name(), self.column.as_str())
    }

    /// Free-form notes attached through `meta.notes` (plain or `{content: ...}`).
    pub fn notes(&self) -> Option<&str> {
        let notes = self.meta.as_ref()?.get("notes")?;
        notes
            .as_str()
            .or_else(|| notes.get("content").and_then(Json::as_str))
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let rule = self.rule.name();
        if self.column.trim().is_empty() {
            return Err(DomainError::invalid_parameter(rule, "column is required"));
        }
        if let Some(t) = self.tolerance {
            if !(0.0..=1.0).contains(&t) {
                return Err(DomainError::invalid_parameter(
                    rule,
                    format!("tolerance {} is outside [0, 1]", t),
                ));
            }
            if self.rule.is_aggregate() {
                return Err(DomainError::invalid_parameter(
                    rule,
                    "aggregate rules do not accept a tolerance",
                ));
            }
        }
        self.rule.validate()
    }
}

// vouch-core/src/domain/batch/mod.rs

//! Immutable tabular snapshots and the explicit schemas they are read with.

pub mod schema;
pub mod value;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::domain::error::DomainError;

pub use schema::{ColumnSpec, ScalarType, Schema};
pub use value::Value;

/// Names a batch: the data asset it comes from plus the key/value pairs that
/// disambiguate repeated runs (pipeline stage, run id...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchIdentifier {
    pub data_asset_name: String,
    #[serde(default)]
    pub identifiers: BTreeMap<String, String>,
}

impl BatchIdentifier {
    pub fn new(data_asset_name: impl Into<String>) -> Self {
        Self {
            data_asset_name: data_asset_name.into(),
            identifiers: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.identifiers.insert(key.into(), value.into());
        self
    }

    /// Deterministic, filesystem-friendly key for this batch.
    pub fn fingerprint(&self) -> String {
        let mut raw = self.data_asset_name.clone();
        for (key, value) in &self.identifiers {
            raw.push_str("__");
            raw.push_str(key);
            raw.push('-');
            raw.push_str(value);
        }
        raw.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect::<String>()
            .trim_start_matches('.')
            .to_string()
    }
}

impl std::fmt::Display for BatchIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.data_asset_name)?;
        if !self.identifiers.is_empty() {
            let pairs: Vec<String> = self
                .identifiers
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            write!(f, " [{}]", pairs.join(", "))?;
        }
        Ok(())
    }
}

/// On-disk formats a batch can be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    /// Comma separated values with a mandatory header row.
    #[default]
    Csv,
}

/// Where a batch lives and how it must be read. The schema is explicit:
/// sources never infer column types.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchLocator {
    pub path: PathBuf,
    pub format: DataFormat,
    pub schema: Schema,
    pub id: BatchIdentifier,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub scalar_type: ScalarType,
    pub values: Vec<Value>,
}

impl Column {
    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    pub fn non_null(&self) -> impl Iterator<Item = (usize, &Value)> {
        self.values.iter().enumerate().filter(|(_, v)| !v.is_null())
    }
}

/// One immutable snapshot of tabular data.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    id: BatchIdentifier,
    schema: Schema,
    columns: Vec<Column>,
    row_count: usize,
}

impl Batch {
    pub fn builder(id: BatchIdentifier) -> BatchBuilder {
        BatchBuilder {
            id,
            columns: Vec::new(),
        }
    }

    pub fn id(&self) -> &BatchIdentifier {
        &self.id
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column(&self, name: &str) -> Result<&Column, DomainError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| DomainError::ColumnNotFound {
                batch: self.id.to_string(),
                column: name.to_string(),
            })
    }
}

pub struct BatchBuilder {
    id: BatchIdentifier,
    columns: Vec<Column>,
}

impl BatchBuilder {
    pub fn column(mut self, name: impl Into<String>, scalar_type: ScalarType, values: Vec<Value>) -> Self {
        self.columns.push(Column {
            name: name.into(),
            scalar_type,
            values,
        });
        self
    }

    /// Checks that every column has the same length, that names are unique and
    /// that every non-null value carries the declared type.
    pub fn build(self) -> Result<Batch, DomainError> {
        let batch_name = self.id.to_string();
        let row_count = self.columns.first().map(|c| c.values.len()).unwrap_or(0);

        let mut specs = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            if column.values.len() != row_count {
                return Err(DomainError::schema_mismatch(
                    &batch_name,
                    format!(
                        "column '{}' has {} rows, expected {}",
                        column.name,
                        column.values.len(),
                        row_count
                    ),
                ));
            }
            if let Some((row, bad)) = column
                .non_null()
                .find(|(_, v)| v.scalar_type() != Some(column.scalar_type))
            {
                return Err(DomainError::schema_mismatch(
                    &batch_name,
                    format!(
                        "value '{}' at row {} of column '{}' is not {}",
                        bad, row, column.name, column.scalar_type
                    ),
                ));
            }
            specs.push(ColumnSpec::new(&column.name, column.scalar_type));
        }

        let schema = Schema::new(specs).map_err(|e| match e {
            DomainError::InvalidParameter { reason, .. } => {
                DomainError::schema_mismatch(&batch_name, reason)
            }
            other => other,
        })?;

        Ok(Batch {
            id: self.id,
            schema,
            columns: self.columns,
            row_count,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_build_batch() -> Result<()> {
        let batch = Batch::builder(BatchIdentifier::new("trips"))
            .column(
                "passenger_count",
                ScalarType::Integer,
                vec![Value::Integer(1), Value::Null, Value::Integer(3)],
            )
            .column(
                "flag",
                ScalarType::String,
                vec!["N".into(), "Y".into(), Value::Null],
            )
            .build()?;

        assert_eq!(batch.row_count(), 3);
        assert_eq!(batch.schema().len(), 2);
        assert_eq!(batch.column("passenger_count")?.null_count(), 1);
        Ok(())
    }

    #[test]
    fn test_missing_column_is_an_error() -> Result<()> {
        let batch = Batch::builder(BatchIdentifier::new("trips"))
            .column("a", ScalarType::Integer, vec![Value::Integer(1)])
            .build()?;
        let err = batch.column("b").unwrap_err();
        assert!(matches!(err, DomainError::ColumnNotFound { .. }));
        Ok(())
    }

    #[test]
    fn test_ragged_columns_rejected() {
        let res = Batch::builder(BatchIdentifier::new("trips"))
            .column("a", ScalarType::Integer, vec![Value::Integer(1)])
            .column("b", ScalarType::Integer, vec![])
            .build();
        assert!(matches!(res, Err(DomainError::SchemaMismatch { .. })));
    }

    #[test]
    fn test_wrongly_typed_value_rejected() {
        let res = Batch::builder(BatchIdentifier::new("trips"))
            .column("a", ScalarType::Integer, vec![Value::Double(1.5)])
            .build();
        assert!(matches!(res, Err(DomainError::SchemaMismatch { .. })));
    }

    #[test]
    fn test_fingerprint_is_stable_and_safe() {
        let id = BatchIdentifier::new("nyc/taxi")
            .with("stage", "prod")
            .with("run_id", "my run 20240101");
        assert_eq!(
            id.fingerprint(),
            "nyc_taxi__run_id-my_run_20240101__stage-prod"
        );
        assert_eq!(id.fingerprint(), id.clone().fingerprint());
    }
}

// vouch-core/src/domain/batch/schema.rs

// Column lists are written the way warehouse DDL writes them:
//   `VendorID` INT, `tpep_pickup_datetime` TIMESTAMP, `fare_amount` DOUBLE
// The list is wrapped in a CREATE TABLE and handed to sqlparser, so quoting
// and type spelling follow SQL rules instead of a home-made tokenizer.

use serde::{Deserialize, Serialize};
use sqlparser::ast::Statement;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use std::collections::HashSet;
use std::fmt;

use crate::domain::error::DomainError;

const SCHEMA_RULE: &str = "schema";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Integer,
    Double,
    String,
    Boolean,
    Timestamp,
}

impl ScalarType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ScalarType::Integer | ScalarType::Double)
    }

    /// Maps a SQL type name to a scalar type. Precision arguments are ignored.
    pub fn from_sql(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        let base = upper.split('(').next().unwrap_or_default().trim();
        match base {
            "TINYINT" | "SMALLINT" | "INT" | "INTEGER" | "BIGINT" | "LONG" => {
                Some(ScalarType::Integer)
            }
            "FLOAT" | "REAL" | "DOUBLE" | "DOUBLE PRECISION" | "DECIMAL" | "NUMERIC" => {
                Some(ScalarType::Double)
            }
            "STRING" | "TEXT" | "VARCHAR" | "CHAR" | "CHARACTER VARYING" => {
                Some(ScalarType::String)
            }
            "BOOLEAN" | "BOOL" => Some(ScalarType::Boolean),
            "TIMESTAMP" | "DATETIME" | "TIMESTAMP_NTZ" => Some(ScalarType::Timestamp),
            _ => None,
        }
    }

    /// SQL spelling understood by both DuckDB and DataFusion.
    pub fn sql_name(self) -> &'static str {
        match self {
            ScalarType::Integer => "BIGINT",
            ScalarType::Double => "DOUBLE",
            ScalarType::String => "VARCHAR",
            ScalarType::Boolean => "BOOLEAN",
            ScalarType::Timestamp => "TIMESTAMP",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarType::Integer => "integer",
            ScalarType::Double => "double",
            ScalarType::String => "string",
            ScalarType::Boolean => "boolean",
            ScalarType::Timestamp => "timestamp",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub scalar_type: ScalarType,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, scalar_type: ScalarType) -> Self {
        Self {
            name: name.into(),
            scalar_type,
        }
    }
}

/// Ordered `(name, type)` pairs. Fixed once a batch is read.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<ColumnSpec>,
}

impl Schema {
    pub fn new(columns: Vec<ColumnSpec>) -> Result<Self, DomainError> {
        let mut seen = HashSet::new();
        for col in &columns {
            if col.name.trim().is_empty() {
                return Err(DomainError::invalid_parameter(
                    SCHEMA_RULE,
                    "column names cannot be empty",
                ));
            }
            if !seen.insert(col.name.as_str()) {
                return Err(DomainError::invalid_parameter(
                    SCHEMA_RULE,
                    format!("duplicate column '{}'", col.name),
                ));
            }
        }
        Ok(Self { columns })
    }

    /// Parses a DDL column list such as "`VendorID` INT, `fare_amount` DOUBLE".
    pub fn from_ddl(ddl: &str) -> Result<Self, DomainError> {
        let body = ddl.trim().trim_end_matches(',');
        if body.is_empty() {
            return Err(DomainError::invalid_parameter(
                SCHEMA_RULE,
                "schema descriptor is empty",
            ));
        }

        let sql = format!("CREATE TABLE vouch_schema ({})", body);
        let statements = Parser::parse_sql(&GenericDialect {}, &sql)
            .map_err(|e| DomainError::invalid_parameter(SCHEMA_RULE, e.to_string()))?;

        let create = match statements.as_slice() {
            [Statement::CreateTable(create)] => create,
            _ => {
                return Err(DomainError::invalid_parameter(
                    SCHEMA_RULE,
                    "expected a single column list",
                ));
            }
        };

        let mut columns = Vec::with_capacity(create.columns.len());
        for def in &create.columns {
            let type_name = def.data_type.to_string();
            let scalar_type = ScalarType::from_sql(&type_name).ok_or_else(|| {
                DomainError::invalid_parameter(
                    SCHEMA_RULE,
                    format!("unsupported type '{}' for column '{}'", type_name, def.name.value),
                )
            })?;
            columns.push(ColumnSpec::new(def.name.value.clone(), scalar_type));
        }

        Self::new(columns)
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Compares the declared columns with the header actually found in the data.
    pub fn check_header(&self, batch: &str, header: &[String]) -> Result<(), DomainError> {
        if header.len() != self.columns.len() {
            return Err(DomainError::schema_mismatch(
                batch,
                format!(
                    "declared {} columns but the source has {}",
                    self.columns.len(),
                    header.len()
                ),
            ));
        }
        for (position, (declared, found)) in self.columns.iter().zip(header).enumerate() {
            if declared.name != *found {
                return Err(DomainError::schema_mismatch(
                    batch,
                    format!(
                        "column {} is declared as '{}' but the source has '{}'",
                        position + 1,
                        declared.name,
                        found
                    ),
                ));
            }
        }
        Ok(())
    }

    pub fn to_ddl(&self) -> String {
        self.columns
            .iter()
            .map(|c| format!("`{}` {}", c.name, c.scalar_type.sql_name()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_parse_ddl_column_list() -> Result<()> {
        let schema = Schema::from_ddl(
            "
            `VendorID` INT,
            `tpep_pickup_datetime` TIMESTAMP,
            `passenger_count` INT,
            `trip_distance` DOUBLE,
            `store_and_fwd_flag` STRING,
            ",
        )?;

        assert_eq!(
            schema.names(),
            vec![
                "VendorID",
                "tpep_pickup_datetime",
                "passenger_count",
                "trip_distance",
                "store_and_fwd_flag"
            ]
        );
        assert_eq!(schema.columns()[1].scalar_type, ScalarType::Timestamp);
        assert_eq!(schema.columns()[3].scalar_type, ScalarType::Double);
        assert_eq!(schema.columns()[4].scalar_type, ScalarType::String);
        Ok(())
    }

    #[test]
    fn test_unsupported_type_rejected() {
        let res = Schema::from_ddl("`payload` BLOB");
        assert!(matches!(res, Err(DomainError::InvalidParameter { .. })));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let res = Schema::from_ddl("a INT, a DOUBLE");
        assert!(matches!(res, Err(DomainError::InvalidParameter { .. })));
    }

    #[test]
    fn test_header_count_mismatch() -> Result<()> {
        let schema = Schema::from_ddl("a INT, b INT")?;
        let err = schema
            .check_header("trips", &["a".to_string()])
            .unwrap_err();
        assert!(matches!(err, DomainError::SchemaMismatch { .. }));
        Ok(())
    }

    #[test]
    fn test_header_name_mismatch() -> Result<()> {
        let schema = Schema::from_ddl("a INT, b INT")?;
        assert!(schema.check_header("trips", &["a".into(), "b".into()]).is_ok());
        assert!(schema.check_header("trips", &["a".into(), "c".into()]).is_err());
        Ok(())
    }

    #[test]
    fn test_ddl_roundtrip() -> Result<()> {
        let schema = Schema::from_ddl("a INT, b STRING")?;
        assert_eq!(schema.to_ddl(), "`a` BIGINT, `b` VARCHAR");
        assert_eq!(Schema::from_ddl(&schema.to_ddl())?, schema);
        Ok(())
    }
}

// vouch-core/src/infrastructure/adapters/duckdb.rs

use async_trait::async_trait;
use duckdb::{Config, Connection, Row};
use std::sync::{Arc, Mutex};
use tracing::{debug, instrument};

// Hexagonal Imports
use crate::domain::batch::{Batch, BatchLocator, ScalarType, Value};
use crate::domain::error::DomainError;
use crate::error::VouchError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::batch_source::BatchSource;

pub struct DuckDBSource {
    conn: Arc<Mutex<Connection>>,
}

fn sql_literal(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', "''"))
}

fn sql_identifier(raw: &str) -> String {
    format!("\"{}\"", raw.replace('"', "\"\""))
}

impl DuckDBSource {
    pub fn in_memory() -> Result<Self, InfrastructureError> {
        let conn = Connection::open_in_memory_with_flags(Config::default())?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>, VouchError> {
        self.conn
            .lock()
            .map_err(|_| VouchError::InternalError("DuckDB Mutex Poisoned".into()))
    }

    /// Header names, read without any type conversion.
    fn read_header(conn: &Connection, path: &str) -> Result<Vec<String>, InfrastructureError> {
        let query = format!(
            "DESCRIBE SELECT * FROM read_csv({}, header = true, all_varchar = true)",
            sql_literal(path)
        );
        let mut stmt = conn.prepare(&query)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// `read_csv` with every column forced to its declared type. Timestamps
    /// come back as text and are parsed on this side.
    fn typed_query(locator: &BatchLocator, path: &str) -> String {
        let columns = locator
            .schema
            .columns()
            .iter()
            .map(|c| format!("{}: {}", sql_literal(&c.name), sql_literal(c.scalar_type.sql_name())))
            .collect::<Vec<_>>()
            .join(", ");
        let select = locator
            .schema
            .columns()
            .iter()
            .map(|c| match c.scalar_type {
                ScalarType::Timestamp => format!("CAST({0} AS VARCHAR) AS {0}", sql_identifier(&c.name)),
                _ => sql_identifier(&c.name),
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "SELECT {} FROM read_csv({}, header = true, columns = {{{}}})",
            select,
            sql_literal(path),
            columns
        )
    }

    fn read_cell(row: &Row<'_>, idx: usize, scalar_type: ScalarType) -> Result<Value, duckdb::Error> {
        let value = match scalar_type {
            ScalarType::Integer => Value::from(row.get::<_, Option<i64>>(idx)?),
            ScalarType::Double => Value::from(row.get::<_, Option<f64>>(idx)?),
            ScalarType::String => Value::from(row.get::<_, Option<String>>(idx)?),
            ScalarType::Boolean => Value::from(row.get::<_, Option<bool>>(idx)?),
            ScalarType::Timestamp => Value::from(
                row.get::<_, Option<String>>(idx)?
                    .as_deref()
                    .and_then(Value::parse_timestamp),
            ),
        };
        Ok(value)
    }

    fn load_blocking(&self, locator: &BatchLocator) -> Result<Batch, VouchError> {
        let batch_name = locator.id.to_string();
        let path = locator.path.to_str().ok_or_else(|| {
            VouchError::InternalError(format!("Invalid path for batch {}: {:?}", batch_name, locator.path))
        })?;
        let conn = self.connection()?;

        let header = Self::read_header(&conn, path)?;
        locator.schema.check_header(&batch_name, &header)?;

        let specs = locator.schema.columns();
        let mismatch = |e: duckdb::Error| DomainError::schema_mismatch(&batch_name, e.to_string());

        // DuckDB may reject values while binding the typed read_csv.
        let mut stmt = conn.prepare(&Self::typed_query(locator, path)).map_err(mismatch)?;
        let mut rows = stmt.query([]).map_err(mismatch)?;

        let mut columns: Vec<Vec<Value>> = vec![Vec::new(); specs.len()];
        while let Some(row) = rows.next().map_err(mismatch)? {
            for (i, spec) in specs.iter().enumerate() {
                columns[i].push(Self::read_cell(row, i, spec.scalar_type).map_err(mismatch)?);
            }
        }

        let mut builder = Batch::builder(locator.id.clone());
        for (spec, values) in specs.iter().zip(columns) {
            builder = builder.column(&spec.name, spec.scalar_type, values);
        }
        Ok(builder.build()?)
    }
}

#[async_trait]
impl BatchSource for DuckDBSource {
    #[instrument(skip(self, locator), fields(batch = %locator.id))]
    async fn load(&self, locator: &BatchLocator) -> Result<Batch, VouchError> {
        let batch = self.load_blocking(locator)?;
        debug!(rows = batch.row_count(), "Batch loaded with DuckDB");
        Ok(batch)
    }

    fn engine_name(&self) -> &'static str {
        "duckdb"
    }
}

// vouch-core/src/infrastructure/adapters/datafusion.rs

use async_trait::async_trait;
use datafusion::arrow::array::{
    Array, ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray, TimestampMicrosecondArray,
};
use datafusion::arrow::compute::cast;
use datafusion::arrow::datatypes::{DataType, Field, Schema as ArrowSchema, TimeUnit};
use datafusion::prelude::*;
use std::sync::Arc;
use tracing::{debug, instrument};

// Hexagonal Imports
use crate::domain::batch::{Batch, BatchLocator, ScalarType, Schema, Value};
use crate::domain::error::DomainError;
use crate::error::VouchError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::batch_source::BatchSource;

pub struct DataFusionSource {
    ctx: Arc<SessionContext>,
}

impl Default for DataFusionSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DataFusionSource {
    pub fn new() -> Self {
        Self {
            ctx: Arc::new(SessionContext::new()),
        }
    }

    fn arrow_type(scalar_type: ScalarType) -> DataType {
        match scalar_type {
            ScalarType::Integer => DataType::Int64,
            ScalarType::Double => DataType::Float64,
            ScalarType::String => DataType::Utf8,
            ScalarType::Boolean => DataType::Boolean,
            ScalarType::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, None),
        }
    }

    fn arrow_schema(schema: &Schema) -> ArrowSchema {
        ArrowSchema::new(
            schema
                .columns()
                .iter()
                .map(|c| Field::new(&c.name, Self::arrow_type(c.scalar_type), true))
                .collect::<Vec<_>>(),
        )
    }

    /// Column names as written in the header row.
    async fn read_header(&self, path: &str, extension: &str) -> Result<Vec<String>, VouchError> {
        let options = CsvReadOptions::new().has_header(true).file_extension(extension);
        let df = self
            .ctx
            .read_csv(path, options)
            .await
            .map_err(InfrastructureError::from)?;
        Ok(df.schema().fields().iter().map(|f| f.name().clone()).collect())
    }

    fn append_values(array: &ArrayRef, scalar_type: ScalarType, out: &mut Vec<Value>) -> Option<()> {
        let any = array.as_any();
        match scalar_type {
            ScalarType::Integer => {
                let a = any.downcast_ref::<Int64Array>()?;
                out.extend((0..a.len()).map(|i| Value::from((!a.is_null(i)).then(|| a.value(i)))));
            }
            ScalarType::Double => {
                let a = any.downcast_ref::<Float64Array>()?;
                out.extend((0..a.len()).map(|i| Value::from((!a.is_null(i)).then(|| a.value(i)))));
            }
            ScalarType::String => {
                let a = any.downcast_ref::<StringArray>()?;
                out.extend((0..a.len()).map(|i| Value::from((!a.is_null(i)).then(|| a.value(i)))));
            }
            ScalarType::Boolean => {
                let a = any.downcast_ref::<BooleanArray>()?;
                out.extend((0..a.len()).map(|i| Value::from((!a.is_null(i)).then(|| a.value(i)))));
            }
            ScalarType::Timestamp => {
                let a = any.downcast_ref::<TimestampMicrosecondArray>()?;
                out.extend((0..a.len()).map(|i| {
                    Value::from(if a.is_null(i) { None } else { a.value_as_datetime(i) })
                }));
            }
        }
        Some(())
    }
}

#[async_trait]
impl BatchSource for DataFusionSource {
    #[instrument(skip(self, locator), fields(batch = %locator.id))]
    async fn load(&self, locator: &BatchLocator) -> Result<Batch, VouchError> {
        let batch_name = locator.id.to_string();
        let path = locator.path.to_str().ok_or_else(|| {
            VouchError::InternalError(format!("Invalid path for batch {}: {:?}", batch_name, locator.path))
        })?;
        if !locator.path.is_file() {
            return Err(InfrastructureError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("batch file not found: {}", locator.path.display()),
            ))
            .into());
        }
        let extension = locator
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();

        let header = self.read_header(path, &extension).await?;
        locator.schema.check_header(&batch_name, &header)?;

        let arrow_schema = Self::arrow_schema(&locator.schema);
        let options = CsvReadOptions::new()
            .has_header(true)
            .file_extension(&extension)
            .schema(&arrow_schema);
        let df = self
            .ctx
            .read_csv(path, options)
            .await
            .map_err(InfrastructureError::from)?;

        // Values that cannot be read as their declared type fail here.
        let record_batches = df
            .collect()
            .await
            .map_err(|e| DomainError::schema_mismatch(&batch_name, e.to_string()))?;

        let specs = locator.schema.columns();
        let mut columns: Vec<Vec<Value>> = vec![Vec::new(); specs.len()];
        for rb in &record_batches {
            for (i, spec) in specs.iter().enumerate() {
                let array = cast(rb.column(i).as_ref(), &Self::arrow_type(spec.scalar_type))
                    .map_err(|e| DomainError::schema_mismatch(&batch_name, e.to_string()))?;
                Self::append_values(&array, spec.scalar_type, &mut columns[i]).ok_or_else(|| {
                    VouchError::InternalError(format!(
                        "Unexpected array type for column '{}': {:?}",
                        spec.name,
                        array.data_type()
                    ))
                })?;
            }
        }

        let mut builder = Batch::builder(locator.id.clone());
        for (spec, values) in specs.iter().zip(columns) {
            builder = builder.column(&spec.name, spec.scalar_type, values);
        }
        let batch = builder.build()?;
        debug!(rows = batch.row_count(), "Batch loaded with DataFusion");
        Ok(batch)
    }

    fn engine_name(&self) -> &'static str {
        "datafusion"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::fixtures::{TRIPS_CSV, TRIPS_DDL, locator};
    use anyhow::Result;

    #[tokio::test]
    async fn test_datafusion_reads_declared_types() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("trips.csv");
        std::fs::write(&path, TRIPS_CSV)?;

        let source = DataFusionSource::new();
        let batch = source.load(&locator(&path, TRIPS_DDL)?).await?;

        assert_eq!(batch.row_count(), 3);
        assert_eq!(batch.column("VendorID")?.values[1], Value::Integer(2));
        assert_eq!(batch.column("passenger_count")?.values[1], Value::Null);
        assert_eq!(batch.column("fare_amount")?.values[0], Value::Double(7.5));
        assert_eq!(batch.column("store_and_fwd_flag")?.values[1], Value::from("Y"));
        assert_eq!(
            batch.column("pickup_datetime")?.values[0],
            Value::Timestamp(Value::parse_timestamp("2019-01-01 00:46:40").unwrap())
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_datafusion_rejects_column_count_mismatch() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("trips.csv");
        std::fs::write(&path, TRIPS_CSV)?;

        let source = DataFusionSource::new();
        let res = source.load(&locator(&path, "`VendorID` BIGINT, `passenger_count` BIGINT")?).await;
        assert!(matches!(
            res,
            Err(VouchError::Domain(DomainError::SchemaMismatch { .. }))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_datafusion_rejects_unreadable_values() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("ids.csv");
        std::fs::write(&path, "id,name\n1,a\nabc,b\n")?;

        let source = DataFusionSource::new();
        let res = source.load(&locator(&path, "`id` BIGINT, `name` VARCHAR")?).await;
        assert!(matches!(
            res,
            Err(VouchError::Domain(DomainError::SchemaMismatch { .. }))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_datafusion_missing_file() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let source = DataFusionSource::new();
        let res = source.load(&locator(&tmp.path().join("nope.csv"), "`id` BIGINT")?).await;
        assert!(matches!(res, Err(VouchError::Infrastructure(_))));
        assert_eq!(source.engine_name(), "datafusion");
        Ok(())
    }
}

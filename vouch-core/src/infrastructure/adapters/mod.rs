// vouch-core/src/infrastructure/adapters/mod.rs

pub mod datafusion;
pub mod duckdb;
pub mod notifier;

use crate::domain::context::Engine;
use crate::error::VouchError;
use crate::ports::batch_source::BatchSource;

/// Builds the batch source for the configured engine.
pub fn batch_source_for(engine: Engine) -> Result<Box<dyn BatchSource>, VouchError> {
    match engine {
        Engine::DataFusion => Ok(Box::new(datafusion::DataFusionSource::new())),
        Engine::DuckDB => Ok(Box::new(duckdb::DuckDBSource::in_memory()?)),
    }
}

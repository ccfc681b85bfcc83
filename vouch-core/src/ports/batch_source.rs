// vouch-core/src/ports/batch_source.rs

// What the pipeline needs from a data engine: turn a locator into an
// immutable, schema-checked batch. It doesn't know which engine does the
// reading.

use crate::domain::batch::{Batch, BatchLocator};
use crate::error::VouchError;
use async_trait::async_trait;

#[async_trait]
pub trait BatchSource: Send + Sync {
    /// Reads the file behind `locator` with its declared schema.
    /// Header or value disagreements surface as `DomainError::SchemaMismatch`.
    async fn load(&self, locator: &BatchLocator) -> Result<Batch, VouchError>;

    fn engine_name(&self) -> &'static str;
}

// vouch-core/src/application/context.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use crate::domain::batch::{Batch, BatchLocator};
use crate::domain::context::ContextConfig;
use crate::error::VouchError;
use crate::infrastructure::adapters::batch_source_for;
use crate::infrastructure::adapters::notifier::LogNotifier;
use crate::infrastructure::config::{load_context_config, resolve_locator};
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::render::HtmlReportRenderer;
use crate::infrastructure::store::FilesystemStore;
use crate::ports::batch_source::BatchSource;

/// Explicit wiring of every stage for one project directory. There is no
/// process-wide context: callers build one and pass it around.
pub struct DataContext {
    project_dir: PathBuf,
    config: ContextConfig,
    pub(crate) store: FilesystemStore,
    pub(crate) renderer: HtmlReportRenderer,
    pub(crate) notifier: LogNotifier,
    source: Box<dyn BatchSource>,
}

impl DataContext {
    /// Reads `vouch.yaml` (or `vouch.yml`) from `project_dir`.
    #[instrument(skip(project_dir))]
    pub fn open(project_dir: &Path) -> Result<Self, VouchError> {
        let config = load_context_config(project_dir)?;
        Self::new(project_dir, config)
    }

    pub fn new(project_dir: &Path, config: ContextConfig) -> Result<Self, VouchError> {
        let store = FilesystemStore::new(project_dir.join(&config.root_directory));
        let source = batch_source_for(config.engine)?;
        info!(
            project = %config.name,
            root = ?store.root(),
            engine = source.engine_name(),
            mode = ?config.evaluation_mode,
            "Data context ready"
        );
        Ok(Self {
            project_dir: project_dir.to_path_buf(),
            config,
            store,
            renderer: HtmlReportRenderer::new()?,
            notifier: LogNotifier,
            source,
        })
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn store(&self) -> &FilesystemStore {
        &self.store
    }

    pub fn engine_name(&self) -> &'static str {
        self.source.engine_name()
    }

    /// Locator for a configured source. `extra` identifiers are added to (and
    /// override) the configured ones, e.g. a run id.
    pub fn source_locator(&self, name: &str, extra: &BTreeMap<String, String>) -> Result<BatchLocator, VouchError> {
        let source = self
            .config
            .source(name)
            .ok_or_else(|| InfrastructureError::ConfigError(format!("Unknown source '{}'", name)))?;
        Ok(resolve_locator(&self.project_dir, source, extra)?)
    }

    pub async fn load_batch(&self, locator: &BatchLocator) -> Result<Batch, VouchError> {
        let batch = self.source.load(locator).await?;
        info!(batch = %batch.id(), rows = batch.row_count(), "Batch loaded");
        Ok(batch)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::domain::context::SourceConfig;

    pub const TRIPS_CSV: &str = "\
VendorID,passenger_count,congestion_surcharge,store_and_fwd_flag
1,1,0,N
2,,500,Y
1,3,999,N
2,4,1000,N
";

    /// A project with one `trips` source, in a fresh temp dir.
    pub fn project() -> anyhow::Result<(tempfile::TempDir, DataContext)> {
        let dir = tempfile::tempdir()?;
        std::fs::create_dir_all(dir.path().join("data"))?;
        std::fs::write(dir.path().join("data/trips.csv"), TRIPS_CSV)?;

        let mut config = ContextConfig::new("taxi");
        config.sources.push(SourceConfig {
            name: "trips".to_string(),
            path: "data/trips.csv".to_string(),
            schema: "`VendorID` BIGINT, `passenger_count` BIGINT, `congestion_surcharge` BIGINT, \
                     `store_and_fwd_flag` VARCHAR"
                .to_string(),
            data_asset_name: None,
            identifiers: BTreeMap::from([("pipeline_stage".to_string(), "test".to_string())]),
        });
        let ctx = DataContext::new(dir.path(), config)?;
        Ok((dir, ctx))
    }
}

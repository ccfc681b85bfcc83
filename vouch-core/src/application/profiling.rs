// vouch-core/src/application/profiling.rs

use std::path::{Path, PathBuf};
use tracing::info;

use crate::application::context::DataContext;
use crate::application::docs::profile_page;
use crate::application::ports::renderer::{ReportRenderer, ReportSink};
use crate::domain::batch::BatchLocator;
use crate::domain::profiler;
use crate::domain::registry::ExpectationRegistry;
use crate::domain::validation::ValidationResult;
use crate::error::VouchError;
use crate::ports::store::RegistryStore;

#[derive(Debug, Clone)]
pub struct ProfileReport {
    pub registry: ExpectationRegistry,
    pub baseline: ValidationResult,
    pub page: PathBuf,
}

impl DataContext {
    /// Profiles a batch and renders the profiling page. The inferred registry
    /// is only persisted when `save` is set.
    pub async fn profile(&self, locator: &BatchLocator, save: bool) -> Result<ProfileReport, VouchError> {
        let batch = self.load_batch(locator).await?;
        let (registry, baseline) = profiler::profile(&batch)?;

        let document = self.renderer.render_profile(&registry, &baseline)?;
        let page = self
            .store
            .persist(&document, Path::new(&profile_page(&batch.id().data_asset_name)?))?;

        if save {
            self.store.save(&registry)?;
            info!(registry = %registry.name(), "Profiled registry saved");
        }
        Ok(ProfileReport {
            registry,
            baseline,
            page,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::application::context::fixtures;
    use crate::ports::store::RegistryStore;
    use anyhow::Result;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_profile_renders_without_saving() -> Result<()> {
        let (_dir, ctx) = fixtures::project()?;
        let locator = ctx.source_locator("trips", &BTreeMap::new())?;

        let report = ctx.profile(&locator, false).await?;

        assert!(report.baseline.success);
        assert_eq!(report.registry.name(), "trips.profile");
        assert!(report.page.ends_with("profiling/trips.html"));
        assert!(ctx.store().list()?.is_empty());

        ctx.profile(&locator, true).await?;
        assert_eq!(ctx.store().list()?, vec!["trips.profile"]);
        Ok(())
    }
}

// vouch-core/src/application/docs.rs

use std::path::{Path, PathBuf};
use tracing::info;

use crate::application::context::DataContext;
use crate::application::ports::renderer::{IndexEntry, ReportRenderer, ReportSink};
use crate::error::VouchError;
use crate::infrastructure::fs::safe_key;
use crate::ports::store::{RegistryStore, ValidationKey, ValidationStore};

/// Site-relative location of a rendered validation result, as linked from
/// the index page.
pub fn validation_page(key: &ValidationKey) -> String {
    format!(
        "validations/{}/{}/{}.html",
        key.registry_name, key.run_name, key.batch_fingerprint
    )
}

pub fn registry_page(name: &str) -> Result<String, VouchError> {
    Ok(format!("expectations/{}.html", safe_key(name)?))
}

pub fn profile_page(data_asset_name: &str) -> Result<String, VouchError> {
    Ok(format!("profiling/{}.html", safe_key(data_asset_name)?))
}

/// Re-renders `index.html` from everything currently in the validations store.
pub fn build_index<S>(store: &S, renderer: &dyn ReportRenderer) -> Result<PathBuf, VouchError>
where
    S: ValidationStore + RegistryStore + ReportSink,
{
    let mut entries = Vec::new();
    for key in store.list_validations()? {
        let result = store.load_validation(&key)?;
        entries.push(IndexEntry {
            batch: result.batch_id.to_string(),
            success: result.success,
            success_percent: result.statistics.success_percent,
            key,
        });
    }
    let registries = store.list()?;
    let document = renderer.render_index(&entries, &registries)?;
    store.persist(&document, Path::new("index.html"))
}

#[derive(Debug, Clone)]
pub struct DocsReport {
    pub index: PathBuf,
    pub pages: usize,
}

impl DataContext {
    /// Rebuilds the whole local site: one page per registry, one per stored
    /// validation result, then the index.
    pub fn build_data_docs(&self) -> Result<DocsReport, VouchError> {
        let mut pages = 0;
        for name in self.store.list()? {
            let registry = self.store.load(&name)?;
            let document = self.renderer.render_registry(&registry)?;
            self.store.persist(&document, Path::new(&registry_page(&name)?))?;
            pages += 1;
        }
        for key in self.store.list_validations()? {
            let result = self.store.load_validation(&key)?;
            let document = self.renderer.render_validation(&result, Some(&key.run_name))?;
            self.store.persist(&document, Path::new(&validation_page(&key)))?;
            pages += 1;
        }
        let index = build_index(&self.store, &self.renderer)?;
        info!(pages, index = ?index, "Data docs built");
        Ok(DocsReport { index, pages })
    }
}

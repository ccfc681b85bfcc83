// vouch-core/src/application/actions.rs

use std::path::Path;
use tracing::debug;

use crate::application::docs::{build_index, registry_page, validation_page};
use crate::application::ports::notifier::Notifier;
use crate::application::ports::renderer::{ReportRenderer, ReportSink};
use crate::domain::checkpoint::{Action, ActionContext, ActionExecutor};
use crate::error::VouchError;
use crate::ports::store::{RegistryStore, ValidationKey, ValidationStore};

/// Executes checkpoint actions against the project store, the HTML renderer
/// and a notifier.
pub struct StandardActions<'a, S> {
    store: &'a S,
    renderer: &'a dyn ReportRenderer,
    notifier: &'a dyn Notifier,
}

impl<'a, S> StandardActions<'a, S>
where
    S: ValidationStore + RegistryStore + ReportSink,
{
    pub fn new(store: &'a S, renderer: &'a dyn ReportRenderer, notifier: &'a dyn Notifier) -> Self {
        Self {
            store,
            renderer,
            notifier,
        }
    }

    fn update_data_docs(&self, ctx: &ActionContext<'_>) -> Result<String, VouchError> {
        let key = ValidationKey::new(ctx.result, ctx.run_name);
        let page = validation_page(&key);
        let document = self.renderer.render_validation(ctx.result, Some(ctx.run_name))?;
        let path = self.store.persist(&document, Path::new(&page))?;

        let registry_doc = self.renderer.render_registry(ctx.registry)?;
        self.store
            .persist(&registry_doc, Path::new(&registry_page(ctx.registry.name())?))?;

        build_index(self.store, self.renderer)?;
        Ok(path.display().to_string())
    }
}

impl<S> ActionExecutor for StandardActions<'_, S>
where
    S: ValidationStore + RegistryStore + ReportSink,
{
    type Error = VouchError;

    fn execute(&mut self, action: &Action, ctx: &ActionContext<'_>) -> Result<Option<String>, VouchError> {
        debug!(action = action.name(), run = ctx.run_name, "Executing action");
        match action {
            Action::StoreValidationResult => {
                let key = self.store.save_validation(ctx.result, ctx.run_name)?;
                Ok(Some(format!(
                    "{}/{}/{}",
                    key.registry_name, key.run_name, key.batch_fingerprint
                )))
            }
            Action::UpdateDataDocs => self.update_data_docs(ctx).map(Some),
            Action::NotifyOnFailure { channel } => {
                self.notifier.notify(channel.as_deref(), ctx.run_name, ctx.result)?;
                Ok(channel.clone())
            }
        }
    }
}

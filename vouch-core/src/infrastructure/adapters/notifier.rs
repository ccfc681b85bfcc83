// vouch-core/src/infrastructure/adapters/notifier.rs

use tracing::warn;

use crate::application::ports::notifier::Notifier;
use crate::domain::validation::ValidationResult;
use crate::error::VouchError;

/// Reports failed validations through the log. Stands in for chat or mail
/// integrations, which are not shipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, channel: Option<&str>, run_name: &str, result: &ValidationResult) -> Result<(), VouchError> {
        let failed: Vec<String> = result
            .failed()
            .map(|o| format!("{}({})", o.expectation.rule.name(), o.expectation.column))
            .collect();
        warn!(
            channel = channel.unwrap_or("log"),
            run = run_name,
            registry = %result.registry_name,
            batch = %result.batch_id,
            failed = %failed.join(", "),
            "Validation failed"
        );
        Ok(())
    }
}

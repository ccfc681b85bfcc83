use crate::domain::validation::ValidationResult;
use crate::error::VouchError;

pub trait Notifier: Send + Sync {
    fn notify(&self, channel: Option<&str>, run_name: &str, result: &ValidationResult) -> Result<(), VouchError>;
}

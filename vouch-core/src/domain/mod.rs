pub mod batch;
pub mod checkpoint;
pub mod context;
pub mod error;
pub mod expectation;
pub mod profiler;
pub mod registry;
pub mod validation;

// Handy re-exports to keep imports short elsewhere
pub use batch::{Batch, BatchIdentifier, BatchLocator, Column, ColumnSpec, ScalarType, Schema, Value};
pub use error::DomainError;
pub use expectation::{Expectation, RuleKind, Severity};
pub use registry::{EvaluationMode, ExpectationRegistry, RegistryAuthor, RuleHandle};
pub use validation::{ExpectationOutcome, ValidationResult, evaluate};
pub use checkpoint::{Action, ActionExecutor, Checkpoint, CheckpointResult, RunState, run_checkpoint};
pub use context::{ContextConfig, Engine, SourceConfig};
pub use profiler::profile;

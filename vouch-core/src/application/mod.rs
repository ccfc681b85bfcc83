// vouch-core/src/application/mod.rs

pub mod actions;
pub mod checkpoint;
pub mod clean;
pub mod context;
pub mod docs;
pub mod ports;
pub mod profiling;
pub mod registry;

// --- RE-EXPORTS (FACADE PATTERN) ---
// The CLI only needs `use vouch_core::application::{DataContext, ...};`

pub use checkpoint::ValidationRequest;
pub use clean::clean_project;
pub use context::DataContext;
pub use docs::DocsReport;
pub use profiling::ProfileReport;
pub use registry::RuleSpec;

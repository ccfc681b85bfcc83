pub mod project;
pub mod source;

pub use project::load_context_config;
pub use source::resolve_locator;

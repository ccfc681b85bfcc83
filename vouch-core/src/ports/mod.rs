pub mod batch_source;
pub mod store;

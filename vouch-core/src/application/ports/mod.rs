pub mod notifier;
pub mod renderer;

pub mod filesystem;

pub use filesystem::FilesystemStore;

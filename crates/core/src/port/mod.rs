// Port Layer - Interfaces for external dependencies

pub mod config_source;
pub mod context_repository;
pub mod process_runner;

// Re-exports
pub use config_source::{ConfigSource, PropertyMap};
pub use context_repository::{ContextRepository, SessionRepository};
pub use process_runner::{ExecutionError, ProcessOutput, ProcessRunner};

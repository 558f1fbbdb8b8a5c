// Notebook Infrastructure - SQLite Adapter
// Implements: ContextRepository, SessionRepository

mod connection;
mod error;
mod migration;
mod store;

pub use connection::{create_pool, is_memory_url};
pub use migration::run_migrations;
pub use store::SqliteStore;

// sqlx::Error conversion goes through error::map_sqlx_error
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)

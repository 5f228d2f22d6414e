// storage/mod.rs
// SQLite access for the local backend

pub mod migrations;
pub mod pool;

#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used items
pub use migrations::run_migrations;
pub use pool::{open_db_pool, DbPool};

// storage/migrations.rs
// Schema migrations for local PlanningSOL copies

use sqlx::migrate::Migrator;
use sqlx::{Pool, Sqlite};

use crate::error_handling::DatabaseError;

/// The PlanningSOL schema, embedded at compile time from `migrations/`.
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Applies the embedded migrations to `pool`.
///
/// Used to create local copies of the schema and by tests; exports themselves
/// never migrate the database they read.
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<(), DatabaseError> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

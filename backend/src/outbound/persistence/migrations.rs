//! Embedded schema migrations applied at startup.

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

use crate::domain::ports::StoreError;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Apply every pending migration over a blocking connection.
///
/// Call from `tokio::task::spawn_blocking`; Diesel's migration harness is
/// synchronous.
pub fn run_migrations(database_url: &str) -> Result<(), StoreError> {
    let mut conn = PgConnection::establish(database_url)
        .map_err(|err| StoreError::connection(err.to_string()))?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| StoreError::query(format!("migration: {err}")))?;
    info!(count = applied.len(), "database migrations applied");
    Ok(())
}

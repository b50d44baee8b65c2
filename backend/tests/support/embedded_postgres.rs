//! Database reset and schema setup for embedded clusters.
//!
//! Reset goes through `postgres` so `DROP DATABASE` runs outside any Diesel
//! transaction. The schema comes from the same embedded migrations the
//! binary applies at startup.

use mechanic_shop::outbound::persistence::run_migrations;
use pg_embedded_setup_unpriv::TestCluster;
use postgres::{Client, NoTls};

use super::format_postgres_error;

const ADMIN_DATABASE: &str = "postgres";

/// Drop and recreate `name` on the cluster.
pub fn reset_database(cluster: &TestCluster, name: &str) -> Result<(), String> {
    let admin_url = cluster.connection().database_url(ADMIN_DATABASE);
    let mut client =
        Client::connect(&admin_url, NoTls).map_err(|err| format_postgres_error(&err))?;
    let quoted = name.replace('"', "\"\"");
    client
        .batch_execute(&format!(
            r#"DROP DATABASE IF EXISTS "{quoted}" WITH (FORCE); CREATE DATABASE "{quoted}";"#
        ))
        .map_err(|err| format_postgres_error(&err))
}

/// Apply every migration to the database at `url`.
pub fn migrate_schema(url: &str) -> Result<(), String> {
    run_migrations(url).map_err(|err| err.to_string())
}

//! Helpers shared by the embedded PostgreSQL suites.
//!
//! Each integration test file compiles as its own crate and pulls this module
//! in with `mod support;`, so not every helper is used by every suite.

mod cluster_skip;
mod embedded_postgres;
pub mod pg_embed;
pub mod shop_seed;

pub use cluster_skip::handle_cluster_setup_failure;
pub use embedded_postgres::{migrate_schema, reset_database};

/// Render a `postgres` error with its SQLSTATE and detail.
///
/// `postgres::Error`'s `Display` collapses server errors to `db error`.
pub fn format_postgres_error(error: &postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };
    let mut summary = format!("postgres error {:?}: {}", db_error.code(), db_error.message());
    if let Some(detail) = db_error.detail() {
        summary.push_str("; detail: ");
        summary.push_str(detail);
    }
    summary
}

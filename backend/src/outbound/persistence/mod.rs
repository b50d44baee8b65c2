//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the repository ports, backed by PostgreSQL
//! through `diesel-async` with `bb8` pooling.
//!
//! - **Thin adapters**: repositories translate rows to domain types and run
//!   the domain's pure rules inside a transaction; the rules themselves live
//!   in `domain::ledger` and `domain::staffing`.
//! - **Internal models**: row structs (`models.rs`) and the schema
//!   (`schema.rs`) never leave this module.
//! - **Domain errors**: pool and Diesel failures are mapped in
//!   `error_mapping.rs`; unique constraint names select the field reported
//!   back to the client.
//!
//! ```ignore
//! use mechanic_shop::outbound::persistence::{DbPool, DieselPartRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/shop")).await?;
//! let parts = DieselPartRepository::new(pool);
//! ```

mod diesel_identity_repository;
mod diesel_part_repository;
mod diesel_ticket_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_identity_repository::DieselIdentityRepository;
pub use diesel_part_repository::DieselPartRepository;
pub use diesel_ticket_repository::DieselTicketRepository;
pub use migrations::run_migrations;
pub use pool::{DbPool, PoolConfig, PoolError};

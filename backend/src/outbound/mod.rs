//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **memory**: mutex-guarded in-process store for tests and local runs
//! - **token**: HS256 signed session tokens via `jsonwebtoken`
//! - **password**: salted password hashing via `bcrypt`
//!
//! Adapters translate between domain types and infrastructure
//! representations. Business rules stay in the domain.

pub mod memory;
pub mod password;
pub mod persistence;
pub mod token;

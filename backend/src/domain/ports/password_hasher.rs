//! Port for one-way password hashing.

use crate::domain::{PasswordHash, PlainPassword};

use super::define_port_error;

define_port_error! {
    /// Failures raised by password hashing adapters.
    pub enum PasswordHashError {
        /// Hashing or verification failed inside the adapter.
        Hashing { message: String } => "password hashing failed: {message}",
    }
}

/// Salted, slow password hashing with constant-time verification.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Hash a validated plaintext password.
    fn hash(&self, password: &PlainPassword) -> Result<PasswordHash, PasswordHashError>;

    /// Compare a candidate password with a stored hash.
    fn verify(&self, candidate: &str, hash: &PasswordHash) -> Result<bool, PasswordHashError>;
}

//! bcrypt implementation of [`PasswordHasher`].

use crate::domain::ports::{PasswordHashError, PasswordHasher};
use crate::domain::{PasswordHash, PlainPassword};

/// Salted bcrypt hashing with a configurable work factor.
#[derive(Debug, Clone, Copy)]
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    /// Hasher using the given bcrypt cost.
    pub const fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptPasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher for BcryptPasswordHasher {
    fn hash(&self, password: &PlainPassword) -> Result<PasswordHash, PasswordHashError> {
        bcrypt::hash(password.expose(), self.cost)
            .map(PasswordHash::from_encoded)
            .map_err(|error| PasswordHashError::hashing(error.to_string()))
    }

    fn verify(&self, candidate: &str, hash: &PasswordHash) -> Result<bool, PasswordHashError> {
        bcrypt::verify(candidate, hash.as_str())
            .map_err(|error| PasswordHashError::hashing(error.to_string()))
    }
}

//! Port for customer and mechanic persistence.
//!
//! Identities live in two role partitions with the same shape. Email and
//! phone are unique within a partition. Every mutating method runs in one
//! store transaction.

use async_trait::async_trait;
use serde_json::json;

use crate::domain::{
    EmailAddress, Error, ExternalId, Identity, IdentityChanges, IdentityKey, NewIdentity, Role,
};

/// Persistence contract for identities.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// Insert a new identity.
    ///
    /// Fails with `DuplicateValue` when the email or phone is already taken
    /// within the identity's role.
    async fn insert(&self, identity: NewIdentity) -> Result<Identity, Error>;

    /// Fetch an identity by primary key.
    async fn find(&self, key: IdentityKey) -> Result<Option<Identity>, Error>;

    /// Fetch an identity by the external id embedded in its tokens.
    async fn find_by_external_id(
        &self,
        role: Role,
        external_id: ExternalId,
    ) -> Result<Option<Identity>, Error>;

    /// Fetch an identity by login email.
    async fn find_by_email(
        &self,
        role: Role,
        email: &EmailAddress,
    ) -> Result<Option<Identity>, Error>;

    /// List every identity in a role partition ordered by id.
    async fn list(&self, role: Role) -> Result<Vec<Identity>, Error>;

    /// Merge allow-listed changes into an identity.
    ///
    /// Uniqueness checks exclude the identity's own row. When
    /// `changes.revoke_tokens` is set the revocation counter is incremented
    /// in the same write.
    async fn update(&self, key: IdentityKey, changes: IdentityChanges) -> Result<Identity, Error>;

    /// Delete an identity.
    ///
    /// Deleting a customer cascades to their tickets. Deleting a mechanic
    /// fails with `WouldOrphanTicket` while they are the sole mechanic on any
    /// ticket; otherwise they are unassigned from all tickets first.
    async fn delete(&self, key: IdentityKey) -> Result<(), Error>;
}

/// Error raised when an email is already registered in the role partition.
pub fn duplicate_email() -> Error {
    Error::duplicate("Email already associated with an account")
        .with_details(json!({ "field": "email", "code": "duplicate" }))
}

/// Error raised when a phone number is already registered in the role partition.
pub fn duplicate_phone() -> Error {
    Error::duplicate("Phone number already associated with an account")
        .with_details(json!({ "field": "phone", "code": "duplicate" }))
}

/// Error raised when a path-addressed identity does not exist.
pub fn identity_not_found(key: IdentityKey) -> Error {
    match key {
        IdentityKey::Customer(id) => Error::not_found(format!("Customer {id} not found")),
        IdentityKey::Mechanic(id) => Error::not_found(format!("Mechanic {id} not found")),
    }
}

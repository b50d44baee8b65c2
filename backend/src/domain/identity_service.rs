//! Registration and self-service management of customer and mechanic accounts.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use super::auth_service::map_hash_error;
use super::ports::{IdentityRepository, PasswordHasher, identity_not_found};
use super::{
    Account, AuthService, Error, ExternalId, Identity, IdentityChanges, IdentityKey, IssuedToken,
    NewIdentity, PlainPassword, Principal, Profile, ProfileUpdate, Role, Salary,
};

/// Validated registration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// Register a customer.
    Customer {
        /// Contact details.
        profile: Profile,
        /// Plaintext password to hash.
        password: PlainPassword,
    },
    /// Register a mechanic.
    Mechanic {
        /// Contact details.
        profile: Profile,
        /// Plaintext password to hash.
        password: PlainPassword,
        /// Starting salary.
        salary: Salary,
    },
}

/// Outcome of a self-service profile update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdated {
    /// Identity after the merge.
    pub identity: Identity,
    /// Fresh token when the update revoked earlier ones.
    pub token: Option<IssuedToken>,
}

/// Identity store use-cases.
#[derive(Clone)]
pub struct IdentityService {
    identities: Arc<dyn IdentityRepository>,
    passwords: Arc<dyn PasswordHasher>,
    auth: AuthService,
}

impl IdentityService {
    /// Create a new service.
    pub fn new(
        identities: Arc<dyn IdentityRepository>,
        passwords: Arc<dyn PasswordHasher>,
        auth: AuthService,
    ) -> Self {
        Self {
            identities,
            passwords,
            auth,
        }
    }

    /// Hash the password and persist a new identity.
    pub async fn register(&self, registration: Registration) -> Result<Identity, Error> {
        let new_identity = match registration {
            Registration::Customer { profile, password } => NewIdentity::Customer {
                account: self.new_account(profile, &password)?,
            },
            Registration::Mechanic {
                profile,
                password,
                salary,
            } => NewIdentity::Mechanic {
                account: self.new_account(profile, &password)?,
                salary,
            },
        };
        let identity = self.identities.insert(new_identity).await?;
        info!(role = %identity.role(), external_id = %identity.account().external_id, "identity registered");
        Ok(identity)
    }

    fn new_account(&self, profile: Profile, password: &PlainPassword) -> Result<Account, Error> {
        let password_hash = self.passwords.hash(password).map_err(map_hash_error)?;
        Ok(Account {
            external_id: ExternalId::random(),
            profile,
            password_hash,
            revocation_counter: 0,
        })
    }

    /// Merge an allow-listed update into the caller's own identity.
    ///
    /// Changing the password bumps the revocation counter and returns a new
    /// token bound to the bumped value.
    pub async fn update_self(
        &self,
        principal: &Principal,
        update: ProfileUpdate,
    ) -> Result<ProfileUpdated, Error> {
        if update.salary.is_some() && principal.role() == Role::Customer {
            return Err(Error::validation("Unknown field: salary")
                .with_details(json!({ "field": "salary", "code": "unknown_field" })));
        }
        let password_hash = update
            .password
            .as_ref()
            .map(|password| self.passwords.hash(password))
            .transpose()
            .map_err(map_hash_error)?;
        let revoke_tokens = password_hash.is_some();
        let changes = IdentityChanges {
            name: update.name,
            email: update.email,
            phone: update.phone,
            password_hash,
            salary: update.salary,
            revoke_tokens,
        };
        let identity = self
            .identities
            .update(principal.identity().key(), changes)
            .await?;
        let token = if revoke_tokens {
            info!(external_id = %identity.account().external_id, "password changed; tokens revoked");
            Some(self.auth.issue_for(&identity)?)
        } else {
            None
        };
        Ok(ProfileUpdated { identity, token })
    }

    /// Delete the caller's own identity.
    ///
    /// Customers take their tickets with them; mechanics are refused while
    /// they are the sole mechanic on any ticket.
    pub async fn delete_self(&self, principal: &Principal) -> Result<(), Error> {
        let key = principal.identity().key();
        self.identities.delete(key).await?;
        info!(role = %key.role(), external_id = %principal.identity().account().external_id, "identity deleted");
        Ok(())
    }

    /// Fetch one identity by key.
    pub async fn get(&self, key: IdentityKey) -> Result<Identity, Error> {
        self.identities
            .find(key)
            .await?
            .ok_or_else(|| identity_not_found(key))
    }

    /// List one role partition.
    pub async fn list(&self, role: Role) -> Result<Vec<Identity>, Error> {
        self.identities.list(role).await
    }
}

#[cfg(test)]
#[path = "identity_service_tests.rs"]
mod tests;

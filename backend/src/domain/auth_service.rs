//! Login, logout and the authorization gate.
//!
//! The gate turns a bearer token into a [`Principal`]: the token's signature
//! and expiry are checked, the embedded external id is resolved to a live
//! identity of the embedded role, and the embedded revocation counter must
//! equal the identity's current counter. Bumping the counter therefore
//! invalidates every token issued before the bump.

use std::sync::{Arc, OnceLock};

use tracing::{debug, info, warn};

use super::ports::{IdentityRepository, PasswordHashError, PasswordHasher, TokenError, TokenService};
use super::{
    Error, Identity, IdentityChanges, IssuedToken, LoginCredentials, PasswordHash, PlainPassword,
    Principal, Role,
};

const INVALID_LOGIN: &str = "Invalid email or password";
const TOKEN_EXPIRED: &str = "Token has expired!";
const TOKEN_INVALID: &str = "Invalid token!";
const TOKEN_REVOKED: &str = "Token is no longer valid";
const DECOY_PASSWORD: &str = "decoy-password-never-issued";

/// Authentication use-cases backed by the identity store and token service.
#[derive(Clone)]
pub struct AuthService {
    identities: Arc<dyn IdentityRepository>,
    tokens: Arc<dyn TokenService>,
    passwords: Arc<dyn PasswordHasher>,
    decoy_hash: Arc<OnceLock<PasswordHash>>,
}

impl AuthService {
    /// Create a new service with the given ports.
    pub fn new(
        identities: Arc<dyn IdentityRepository>,
        tokens: Arc<dyn TokenService>,
        passwords: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            identities,
            tokens,
            passwords,
            decoy_hash: Arc::new(OnceLock::new()),
        }
    }

    /// Check credentials for an identity of `role` and issue a token.
    ///
    /// Unknown emails and wrong passwords produce the same message, and both
    /// pay for one hash verification.
    pub async fn login(
        &self,
        role: Role,
        credentials: &LoginCredentials,
    ) -> Result<IssuedToken, Error> {
        let Some(identity) = self.identities.find_by_email(role, credentials.email()).await? else {
            warn!(%role, "login for unknown email");
            self.verify_against_decoy(credentials.password());
            return Err(Error::unauthenticated(INVALID_LOGIN));
        };
        let matches = self
            .passwords
            .verify(credentials.password(), &identity.account().password_hash)
            .map_err(map_hash_error)?;
        if !matches {
            warn!(%role, external_id = %identity.account().external_id, "login with wrong password");
            return Err(Error::unauthenticated(INVALID_LOGIN));
        }
        info!(%role, external_id = %identity.account().external_id, "login succeeded");
        self.issue_for(&identity)
    }

    /// Run a verification whose outcome is discarded.
    ///
    /// The decoy hash is built on first use with the hasher's configured cost.
    fn verify_against_decoy(&self, candidate: &str) {
        let decoy = match self.decoy_hash.get() {
            Some(hash) => hash,
            None => {
                let hashed = PlainPassword::new(DECOY_PASSWORD)
                    .map_err(|error| error.to_string())
                    .and_then(|password| {
                        self.passwords
                            .hash(&password)
                            .map_err(|error| error.to_string())
                    });
                match hashed {
                    Ok(hash) => self.decoy_hash.get_or_init(|| hash),
                    Err(error) => {
                        debug!(%error, "decoy hash unavailable");
                        return;
                    }
                }
            }
        };
        if let Err(error) = self.passwords.verify(candidate, decoy) {
            debug!(%error, "decoy verification failed");
        }
    }

    /// Issue a token bound to the identity's current revocation counter.
    pub fn issue_for(&self, identity: &Identity) -> Result<IssuedToken, Error> {
        let account = identity.account();
        self.tokens
            .issue(&account.external_id, identity.role(), account.revocation_counter)
            .map_err(map_token_error)
    }

    /// Resolve a bearer token to a live, unrevoked principal.
    ///
    /// Role checks are left to the caller via [`Principal::require_role`].
    pub async fn authorize(&self, token: &str) -> Result<Principal, Error> {
        let claims = self.tokens.verify(token).map_err(map_token_error)?;
        let identity = self
            .identities
            .find_by_external_id(claims.role, claims.external_id)
            .await?;
        match identity {
            Some(identity) if identity.revocation_counter() == claims.revocation_counter => {
                Ok(Principal::new(identity))
            }
            Some(_) => {
                warn!(external_id = %claims.external_id, "revoked token presented");
                Err(Error::unauthenticated(TOKEN_REVOKED))
            }
            None => {
                warn!(external_id = %claims.external_id, "token for unknown identity");
                Err(Error::unauthenticated(TOKEN_REVOKED))
            }
        }
    }

    /// Invalidate every outstanding token of the principal.
    pub async fn logout(&self, principal: &Principal) -> Result<(), Error> {
        let changes = IdentityChanges {
            revoke_tokens: true,
            ..IdentityChanges::default()
        };
        let identity = self
            .identities
            .update(principal.identity().key(), changes)
            .await?;
        info!(
            external_id = %identity.account().external_id,
            counter = identity.revocation_counter(),
            "tokens revoked"
        );
        Ok(())
    }
}

fn map_token_error(error: TokenError) -> Error {
    match error {
        TokenError::Expired => Error::unauthenticated(TOKEN_EXPIRED),
        TokenError::Malformed { .. } | TokenError::InvalidSignature => {
            Error::unauthenticated(TOKEN_INVALID)
        }
        TokenError::Signing { message } => {
            tracing::error!(%message, "token signing failed");
            Error::internal("Internal server error")
        }
    }
}

pub(crate) fn map_hash_error(error: PasswordHashError) -> Error {
    tracing::error!(%error, "password hashing failed");
    Error::internal("Internal server error")
}

#[cfg(test)]
#[path = "auth_service_tests.rs"]
mod tests;

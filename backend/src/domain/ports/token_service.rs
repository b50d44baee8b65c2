//! Port for issuing and verifying session tokens.

use crate::domain::{ExternalId, IssuedToken, Role, TokenClaims};

use super::define_port_error;

define_port_error! {
    /// Failures raised by token adapters.
    pub enum TokenError {
        /// The token is past its expiry instant.
        Expired => "token has expired",
        /// The token could not be decoded or carries unexpected claims.
        Malformed { message: String } => "token is malformed: {message}",
        /// The signature does not match the payload.
        InvalidSignature => "token signature is invalid",
        /// Signing a new token failed.
        Signing { message: String } => "failed to sign token: {message}",
    }
}

/// Stateless signed-token issuer and verifier.
///
/// Tokens embed the identity's external id, role and revocation counter.
/// Verification checks signature and expiry only; the revocation counter is
/// compared against the live identity by the authorization gate.
#[cfg_attr(test, mockall::automock)]
pub trait TokenService: Send + Sync {
    /// Sign a token for the given identity snapshot.
    fn issue(
        &self,
        external_id: &ExternalId,
        role: Role,
        revocation_counter: i64,
    ) -> Result<IssuedToken, TokenError>;

    /// Check signature and expiry and return the embedded claims.
    fn verify(&self, token: &str) -> Result<TokenClaims, TokenError>;
}

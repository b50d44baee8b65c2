//! HS256 JSON Web Token implementation of [`TokenService`].
//!
//! Expiry is checked against the injected clock rather than the library's
//! system-time check so behaviour is deterministic under test.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{TokenError, TokenService};
use crate::domain::{ExternalId, IssuedToken, Role, TokenClaims};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    external_id: String,
    role: Role,
    revocation_counter: i64,
    iat: i64,
    exp: i64,
}

/// JWT issuer and verifier keyed by a shared secret.
pub struct JwtTokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl JwtTokenService {
    /// Build a service from raw secret bytes and a token lifetime.
    pub fn new(secret: &[u8], ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
            clock,
        }
    }
}

impl TokenService for JwtTokenService {
    fn issue(
        &self,
        external_id: &ExternalId,
        role: Role,
        revocation_counter: i64,
    ) -> Result<IssuedToken, TokenError> {
        let issued_at = self.clock.utc();
        let expires_at = issued_at + self.ttl;
        let claims = Claims {
            external_id: external_id.to_string(),
            role,
            revocation_counter,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|error| TokenError::signing(error.to_string()))?;
        debug!(%external_id, %role, revocation_counter, "token issued");
        Ok(IssuedToken { token, expires_at })
    }

    fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|error| {
            match error.kind() {
                ErrorKind::InvalidSignature => TokenError::invalid_signature(),
                ErrorKind::ExpiredSignature => TokenError::expired(),
                _ => TokenError::malformed(error.to_string()),
            }
        })?;
        let claims = data.claims;
        if claims.exp <= self.clock.utc().timestamp() {
            return Err(TokenError::expired());
        }
        let external_id = Uuid::parse_str(&claims.external_id)
            .map(ExternalId::from_uuid)
            .map_err(|error| TokenError::malformed(error.to_string()))?;
        Ok(TokenClaims {
            external_id,
            role: claims.role,
            revocation_counter: claims.revocation_counter,
            issued_at: timestamp(claims.iat)?,
            expires_at: timestamp(claims.exp)?,
        })
    }
}

fn timestamp(seconds: i64) -> Result<DateTime<Utc>, TokenError> {
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| TokenError::malformed(format!("timestamp {seconds} out of range")))
}

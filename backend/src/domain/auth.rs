//! Authentication primitives: login credentials, token claims and the
//! authenticated principal handed to protected operations.

use std::fmt;

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use super::error::Error;
use super::identity::{EmailAddress, ExternalId, Identity, Role};
use super::ids::{CustomerId, MechanicId};

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Email was blank or malformed.
    InvalidEmail,
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEmail => write!(f, "Invalid email address"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

impl From<LoginValidationError> for Error {
    fn from(value: LoginValidationError) -> Self {
        let field = match value {
            LoginValidationError::InvalidEmail => "email",
            LoginValidationError::EmptyPassword => "password",
        };
        Self::invalid_field(field, "invalid", value.to_string())
    }
}

/// Validated login credentials.
///
/// ## Invariants
/// - `email` satisfies [`EmailAddress`] validation.
/// - `password` is non-empty; whitespace is preserved.
///
/// # Examples
/// ```
/// use mechanic_shop::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("ana@shop.test", "s3cret-pass").unwrap();
/// assert_eq!(creds.email().as_ref(), "ana@shop.test");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: EmailAddress,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let email = EmailAddress::new(email).map_err(|_| LoginValidationError::InvalidEmail)?;
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email used to look up the account.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Password supplied by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Verified contents of a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    /// Identity the token was issued to.
    pub external_id: ExternalId,
    /// Role partition of the identity.
    pub role: Role,
    /// Revocation counter at issue time.
    pub revocation_counter: i64,
    /// Issue instant.
    pub issued_at: DateTime<Utc>,
    /// Expiry instant.
    pub expires_at: DateTime<Utc>,
}

/// A freshly signed token.
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Encoded bearer credential.
    pub token: String,
    /// Expiry instant.
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Live identity resolved from a verified, unrevoked token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    identity: Identity,
}

impl Principal {
    /// Wrap a live identity.
    #[must_use]
    pub const fn new(identity: Identity) -> Self {
        Self { identity }
    }

    /// Role of the caller.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.identity.role()
    }

    /// The caller's live identity record.
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Consume the principal, returning the identity.
    #[must_use]
    pub fn into_identity(self) -> Identity {
        self.identity
    }

    /// Customer key when the caller is a customer.
    #[must_use]
    pub const fn customer_id(&self) -> Option<CustomerId> {
        match &self.identity {
            Identity::Customer(customer) => Some(customer.id),
            Identity::Mechanic(_) => None,
        }
    }

    /// Mechanic key when the caller is a mechanic.
    #[must_use]
    pub const fn mechanic_id(&self) -> Option<MechanicId> {
        match &self.identity {
            Identity::Mechanic(mechanic) => Some(mechanic.id),
            Identity::Customer(_) => None,
        }
    }

    /// Reject callers whose role is not in `allowed`.
    ///
    /// # Examples
    /// ```no_run
    /// use mechanic_shop::domain::{Principal, Role};
    ///
    /// fn delete_part(principal: &Principal) -> Result<(), mechanic_shop::domain::Error> {
    ///     principal.require_role(&[Role::Mechanic])?;
    ///     Ok(())
    /// }
    /// ```
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), Error> {
        if allowed.contains(&self.role()) {
            Ok(())
        } else {
            Err(Error::forbidden("Forbidden: insufficient role"))
        }
    }
}

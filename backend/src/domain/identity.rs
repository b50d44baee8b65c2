//! Customer and mechanic identities.
//!
//! An [`Identity`] is a tagged union over [`Role`]. Both variants share an
//! [`Account`] carrying credentials and the revocation counter; mechanics add
//! a salary. Profile fields are validated newtypes so a stored identity can
//! never hold a malformed email or phone number.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::Zeroizing;

use super::error::Error;
use super::ids::{CustomerId, MechanicId};

/// Minimum accepted length for a person's name, counted after trimming.
pub const NAME_MIN: usize = 2;
/// Minimum accepted password length.
pub const PASSWORD_MIN: usize = 8;

/// Validation errors raised by identity value constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityValidationError {
    /// Name shorter than [`NAME_MIN`] characters.
    NameTooShort { min: usize },
    /// Email did not match the accepted address shape.
    InvalidEmail,
    /// Phone did not match `XXX-XXX-XXXX`.
    InvalidPhone,
    /// Password shorter than [`PASSWORD_MIN`] characters.
    PasswordTooShort { min: usize },
    /// Salary below zero.
    NegativeSalary,
    /// Role string was neither `customer` nor `mechanic`.
    UnknownRole,
}

impl fmt::Display for IdentityValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NameTooShort { min } => write!(f, "Name must be at least {min} characters long"),
            Self::InvalidEmail => write!(f, "Invalid email address"),
            Self::InvalidPhone => write!(f, "Invalid phone number format (XXX-XXX-XXXX)"),
            Self::PasswordTooShort { min } => {
                write!(f, "Password must be at least {min} characters long")
            }
            Self::NegativeSalary => write!(f, "Salary cannot be negative"),
            Self::UnknownRole => write!(f, "role must be 'customer' or 'mechanic'"),
        }
    }
}

impl std::error::Error for IdentityValidationError {}

impl From<IdentityValidationError> for Error {
    fn from(value: IdentityValidationError) -> Self {
        let (field, code) = match value {
            IdentityValidationError::NameTooShort { .. } => ("name", "too_short"),
            IdentityValidationError::InvalidEmail => ("email", "invalid_format"),
            IdentityValidationError::InvalidPhone => ("phone", "invalid_format"),
            IdentityValidationError::PasswordTooShort { .. } => ("password", "too_short"),
            IdentityValidationError::NegativeSalary => ("salary", "negative"),
            IdentityValidationError::UnknownRole => ("role", "unknown"),
        };
        Self::invalid_field(field, code, value.to_string())
    }
}

/// Role tag carried by identities and tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A vehicle owner.
    Customer,
    /// Shop staff who manage tickets and inventory.
    Mechanic,
}

impl Role {
    /// Wire representation used in tokens.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Mechanic => "mechanic",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = IdentityValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "mechanic" => Ok(Self::Mechanic),
            _ => Err(IdentityValidationError::UnknownRole),
        }
    }
}

/// Globally unique opaque identifier embedded in session tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalId(Uuid);

impl ExternalId {
    /// Generate a fresh identifier for a new identity.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap a stored UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ExternalId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A customer's or mechanic's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PersonName(String);

impl PersonName {
    /// Validate and construct a name; surrounding whitespace is dropped.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, IdentityValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.chars().count() < NAME_MIN {
            return Err(IdentityValidationError::NameTooShort { min: NAME_MIN });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static PHONE_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

fn phone_regex() -> &'static Regex {
    PHONE_RE.get_or_init(|| {
        Regex::new(r"^\d{3}-\d{3}-\d{4}$")
            .unwrap_or_else(|error| panic!("phone regex failed to compile: {error}"))
    })
}

/// Email address, unique within a role partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and construct an email address.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, IdentityValidationError> {
        let trimmed = raw.as_ref().trim();
        if !email_regex().is_match(trimmed) {
            return Err(IdentityValidationError::InvalidEmail);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

/// North American style phone number, unique within a role partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Validate and construct a phone number in `XXX-XXX-XXXX` form.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, IdentityValidationError> {
        let trimmed = raw.as_ref().trim();
        if !phone_regex().is_match(trimmed) {
            return Err(IdentityValidationError::InvalidPhone);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

macro_rules! string_value {
    ($name:ident) => {
        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_ref())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdentityValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }
    };
}

string_value!(PersonName);
string_value!(EmailAddress);
string_value!(PhoneNumber);

/// A plaintext password accepted at registration or password change.
///
/// The buffer is wiped on drop and never serialised.
#[derive(Clone, PartialEq, Eq)]
pub struct PlainPassword(Zeroizing<String>);

impl PlainPassword {
    /// Validate the password length.
    pub fn new(raw: &str) -> Result<Self, IdentityValidationError> {
        if raw.chars().count() < PASSWORD_MIN {
            return Err(IdentityValidationError::PasswordTooShort { min: PASSWORD_MIN });
        }
        Ok(Self(Zeroizing::new(raw.to_owned())))
    }

    /// Borrow the plaintext for hashing.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PlainPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PlainPassword(<redacted>)")
    }
}

/// Salted one-way password hash as produced by the hasher port.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap an encoded hash produced by a hasher or read from storage.
    #[must_use]
    pub const fn from_encoded(encoded: String) -> Self {
        Self(encoded)
    }

    /// Encoded hash string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

/// Annual mechanic salary in whole currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Salary(i64);

impl Salary {
    /// Validate that the salary is not negative.
    pub const fn new(amount: i64) -> Result<Self, IdentityValidationError> {
        if amount < 0 {
            return Err(IdentityValidationError::NegativeSalary);
        }
        Ok(Self(amount))
    }

    /// Salary amount.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Salary {
    type Error = IdentityValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Salary> for i64 {
    fn from(value: Salary) -> Self {
        value.0
    }
}

/// Contact details shared by both roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Display name.
    pub name: PersonName,
    /// Unique email address.
    pub email: EmailAddress,
    /// Unique phone number.
    pub phone: PhoneNumber,
}

/// Credentials and profile common to customers and mechanics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Opaque identifier embedded in tokens.
    pub external_id: ExternalId,
    /// Contact details.
    pub profile: Profile,
    /// Stored password hash.
    pub password_hash: PasswordHash,
    /// Monotonic counter; tokens carrying an older value are rejected.
    pub revocation_counter: i64,
}

/// A registered customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    /// Primary key.
    pub id: CustomerId,
    /// Shared account data.
    pub account: Account,
}

/// A registered mechanic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mechanic {
    /// Primary key.
    pub id: MechanicId,
    /// Shared account data.
    pub account: Account,
    /// Annual salary.
    pub salary: Salary,
}

/// Addresses one identity inside its role partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityKey {
    /// A customer row.
    Customer(CustomerId),
    /// A mechanic row.
    Mechanic(MechanicId),
}

impl IdentityKey {
    /// Role partition the key belongs to.
    #[must_use]
    pub const fn role(self) -> Role {
        match self {
            Self::Customer(_) => Role::Customer,
            Self::Mechanic(_) => Role::Mechanic,
        }
    }
}

/// A customer or mechanic account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// Customer variant.
    Customer(Customer),
    /// Mechanic variant.
    Mechanic(Mechanic),
}

impl Identity {
    /// Role tag of this identity.
    #[must_use]
    pub const fn role(&self) -> Role {
        match self {
            Self::Customer(_) => Role::Customer,
            Self::Mechanic(_) => Role::Mechanic,
        }
    }

    /// Key addressing this identity in the store.
    #[must_use]
    pub const fn key(&self) -> IdentityKey {
        match self {
            Self::Customer(customer) => IdentityKey::Customer(customer.id),
            Self::Mechanic(mechanic) => IdentityKey::Mechanic(mechanic.id),
        }
    }

    /// Shared account data.
    #[must_use]
    pub const fn account(&self) -> &Account {
        match self {
            Self::Customer(customer) => &customer.account,
            Self::Mechanic(mechanic) => &mechanic.account,
        }
    }

    fn account_mut(&mut self) -> &mut Account {
        match self {
            Self::Customer(customer) => &mut customer.account,
            Self::Mechanic(mechanic) => &mut mechanic.account,
        }
    }

    /// Current revocation counter.
    #[must_use]
    pub const fn revocation_counter(&self) -> i64 {
        self.account().revocation_counter
    }
}

/// Identity to be inserted at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewIdentity {
    /// New customer account.
    Customer {
        /// Account data with a freshly hashed password.
        account: Account,
    },
    /// New mechanic account.
    Mechanic {
        /// Account data with a freshly hashed password.
        account: Account,
        /// Starting salary.
        salary: Salary,
    },
}

impl NewIdentity {
    /// Role partition the identity will be stored in.
    #[must_use]
    pub const fn role(&self) -> Role {
        match self {
            Self::Customer { .. } => Role::Customer,
            Self::Mechanic { .. } => Role::Mechanic,
        }
    }

    /// Account data of the pending identity.
    #[must_use]
    pub const fn account(&self) -> &Account {
        match self {
            Self::Customer { account } | Self::Mechanic { account, .. } => account,
        }
    }
}

/// Allow-listed profile update requested by the account owner.
///
/// Only the fields listed here can change; adapters reject anything else
/// before it reaches the domain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    /// Replacement name.
    pub name: Option<PersonName>,
    /// Replacement email.
    pub email: Option<EmailAddress>,
    /// Replacement phone.
    pub phone: Option<PhoneNumber>,
    /// Replacement password in plaintext.
    pub password: Option<PlainPassword>,
    /// Replacement salary; mechanics only.
    pub salary: Option<Salary>,
}

/// Resolved changes ready to be merged into a stored identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityChanges {
    /// Replacement name.
    pub name: Option<PersonName>,
    /// Replacement email.
    pub email: Option<EmailAddress>,
    /// Replacement phone.
    pub phone: Option<PhoneNumber>,
    /// Replacement password hash.
    pub password_hash: Option<PasswordHash>,
    /// Replacement salary; ignored for customers.
    pub salary: Option<Salary>,
    /// Increment the revocation counter as part of the same write.
    pub revoke_tokens: bool,
}

impl IdentityChanges {
    /// Merge the changes into `identity`, field by field.
    pub fn apply_to(&self, identity: &mut Identity) {
        if let (Identity::Mechanic(mechanic), Some(salary)) = (&mut *identity, self.salary) {
            mechanic.salary = salary;
        }
        let account = identity.account_mut();
        if let Some(name) = &self.name {
            account.profile.name = name.clone();
        }
        if let Some(email) = &self.email {
            account.profile.email = email.clone();
        }
        if let Some(phone) = &self.phone {
            account.profile.phone = phone.clone();
        }
        if let Some(hash) = &self.password_hash {
            account.password_hash = hash.clone();
        }
        if self.revoke_tokens {
            account.revocation_counter = account.revocation_counter.saturating_add(1);
        }
    }
}

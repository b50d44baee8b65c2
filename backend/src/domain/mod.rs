//! Domain primitives, aggregates, rules and services.
//!
//! Purpose: Define strongly typed entities for the repair shop and the
//! use-cases that mutate them. Types validate on construction so the services
//! and adapters never see malformed values.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - Identity, Customer, Mechanic: role-tagged accounts.
//! - Part, ServiceTicket: inventory and ticket aggregates.
//! - `ledger` and `staffing`: pure stock and assignment rules.
//! - AuthService, IdentityService, InventoryService, TicketService: use-cases
//!   over the ports in [`ports`].

pub mod auth;
pub mod auth_service;
pub mod error;
pub mod identity;
pub mod identity_service;
pub mod ids;
pub mod inventory_service;
pub mod ledger;
pub mod part;
pub mod ports;
pub mod staffing;
pub mod ticket;
pub mod ticket_service;
pub mod trace_id;

#[cfg(test)]
pub(crate) mod test_support;

pub use self::auth::{
    IssuedToken, LoginCredentials, LoginValidationError, Principal, TokenClaims,
};
pub use self::auth_service::AuthService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::identity::{
    Account, Customer, EmailAddress, ExternalId, Identity, IdentityChanges, IdentityKey,
    IdentityValidationError, Mechanic, NewIdentity, PasswordHash, PersonName, PhoneNumber,
    PlainPassword, Profile, ProfileUpdate, Role, Salary,
};
pub use self::identity_service::{IdentityService, ProfileUpdated, Registration};
pub use self::ids::{CustomerId, MechanicId, PartId, TicketId};
pub use self::inventory_service::InventoryService;
pub use self::part::{
    MAX_QUANTITY, NewPart, Part, PartChanges, PartName, PartValidationError, UnitPrice,
};
pub use self::ticket::{
    MechanicChanges, NewTicket, PartUsage, PartsAdjustment, ServiceDescription, ServiceTicket,
    TicketInfoChanges, TicketValidationError, Vin,
};
pub use self::ticket_service::{PartsUpdated, TicketDraft, TicketService};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use mechanic_shop::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;

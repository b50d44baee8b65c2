//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod identity_repository;
mod part_repository;
mod password_hasher;
mod store_error;
mod ticket_repository;
mod token_service;

#[cfg(test)]
pub use identity_repository::MockIdentityRepository;
pub use identity_repository::{
    IdentityRepository, duplicate_email, duplicate_phone, identity_not_found,
};
#[cfg(test)]
pub use part_repository::MockPartRepository;
pub use part_repository::{PartRepository, duplicate_part_name, part_in_use, part_not_found};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
pub use store_error::StoreError;
#[cfg(test)]
pub use ticket_repository::MockTicketRepository;
pub use ticket_repository::{
    PartsOutcome, TicketRepository, TicketScope, ticket_not_found, unknown_customer,
    unknown_mechanics, unknown_part,
};
#[cfg(test)]
pub use token_service::MockTokenService;
pub use token_service::{TokenError, TokenService};

//! Translation of pool and Diesel failures into domain errors.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::{debug, warn};

use crate::domain::Error;
use crate::domain::ports::{StoreError, duplicate_email, duplicate_phone, duplicate_part_name};

use super::pool::PoolError;

pub(crate) fn map_pool_error(error: PoolError) -> Error {
    StoreError::from(error).into()
}

/// Map a Diesel failure, recognising the named unique constraints from the
/// migrations so duplicates surface as field-level validation errors.
pub(crate) fn map_diesel_error(error: DieselError) -> Error {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(
                ?kind,
                message = info.message(),
                constraint = info.constraint_name(),
                "diesel operation failed"
            );
        }
        _ => debug!(error = %error, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            map_unique_violation(info.constraint_name())
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
            warn!(
                constraint = info.constraint_name(),
                "foreign key violation escaped the reference checks"
            );
            Error::conflict("Referenced record changed concurrently")
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
            StoreError::connection(info.message().to_owned()).into()
        }
        DieselError::DatabaseError(_, info) => StoreError::query(info.message().to_owned()).into(),
        other => StoreError::query(other.to_string()).into(),
    }
}

fn map_unique_violation(constraint: Option<&str>) -> Error {
    match constraint {
        Some("customers_email_key" | "mechanics_email_key") => duplicate_email(),
        Some("customers_phone_key" | "mechanics_phone_key") => duplicate_phone(),
        Some("parts_name_key") => duplicate_part_name(),
        other => {
            warn!(constraint = other, "unrecognised unique violation");
            Error::conflict("Record already exists")
        }
    }
}

/// Error type threaded through Diesel transactions.
///
/// Diesel rolls back whenever the closure returns `Err`, so domain rule
/// failures travel in [`TxError::Domain`] to abort the transaction without
/// being mistaken for database faults.
#[derive(Debug)]
pub(crate) enum TxError {
    Diesel(DieselError),
    Domain(Error),
}

impl From<DieselError> for TxError {
    fn from(error: DieselError) -> Self {
        Self::Diesel(error)
    }
}

impl From<Error> for TxError {
    fn from(error: Error) -> Self {
        Self::Domain(error)
    }
}

impl From<TxError> for Error {
    fn from(error: TxError) -> Self {
        match error {
            TxError::Diesel(error) => map_diesel_error(error),
            TxError::Domain(error) => error,
        }
    }
}

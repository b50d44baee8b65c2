//! Infrastructure failures shared by the persistence adapters.

use tracing::error;

use crate::domain::Error;

use super::define_port_error;

define_port_error! {
    /// Failures raised by storage adapters before a domain outcome is known.
    pub enum StoreError {
        /// A connection could not be checked out or established.
        Connection { message: String } => "store connection failed: {message}",
        /// A query or mutation failed during execution.
        Query { message: String } => "store query failed: {message}",
    }
}

impl From<StoreError> for Error {
    fn from(value: StoreError) -> Self {
        error!(error = %value, "store failure");
        match value {
            StoreError::Connection { .. } => {
                Self::service_unavailable("Service temporarily unavailable")
            }
            StoreError::Query { .. } => Self::internal("Internal server error"),
        }
    }
}

//! OpenAPI schema definitions for domain types.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`. This
//! module provides the schema definitions required for OpenAPI documentation
//! using utoipa's external schema registration.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
///
/// Stable machine-readable error codes returned in API error responses.
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// A request field failed validation.
    #[schema(rename = "validation_failed")]
    ValidationFailed,
    /// The body references a customer, mechanic or part that does not exist.
    #[schema(rename = "invalid_reference")]
    InvalidReference,
    /// Email, phone or part name is already taken.
    #[schema(rename = "duplicate_value")]
    DuplicateValue,
    /// Missing, malformed, expired or revoked token.
    #[schema(rename = "unauthenticated")]
    Unauthenticated,
    /// Authenticated but the role is not allowed.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The addressed resource does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// Not enough stock to reserve.
    #[schema(rename = "insufficient_stock")]
    InsufficientStock,
    /// Returning more units than the ticket used.
    #[schema(rename = "over_return")]
    OverReturn,
    /// Removing the last mechanic from a ticket.
    #[schema(rename = "last_mechanic_violation")]
    LastMechanicViolation,
    /// Deleting a mechanic would leave a ticket unstaffed.
    #[schema(rename = "would_orphan_ticket")]
    WouldOrphanTicket,
    /// The write raced another change or the record is in use.
    #[schema(rename = "conflict")]
    Conflict,
    /// The backing store is unreachable.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
///
/// API error response payload with machine-readable code and human-readable
/// message.
#[derive(ToSchema)]
#[schema(as = crate::domain::Error)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "validation_failed")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "Invalid email address")]
    message: String,
    /// Correlation identifier echoed in the `trace-id` header.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Field-keyed details such as `{"field": "email", "code": "invalid_format"}`.
    details: Option<serde_json::Value>,
}

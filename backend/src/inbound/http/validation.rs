//! Shared validation helpers for inbound HTTP adapters.
//!
//! Body and path extraction failures are converted to domain errors here so
//! clients receive the same `{code, message, details}` payload that handler
//! validation produces.

use actix_web::error::{JsonPayloadError, PathError};
use actix_web::{HttpRequest, web};
use serde_json::json;

use crate::domain::{Error, MAX_QUANTITY};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidBody,
    Negative,
    TooLarge,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidBody => "invalid_body",
            ErrorCode::Negative => "negative",
            ErrorCode::TooLarge => "too_large",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(self) -> &'static str {
        self.0
    }
}

fn field_error(field: FieldName, code: ErrorCode, message: impl Into<String>) -> Error {
    Error::validation(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
    }))
}

/// Convert a signed request quantity into a stock count.
///
/// Negative values are rejected with "Quantity cannot be negative"; values
/// above [`MAX_QUANTITY`] with "Quantity is too large".
pub(crate) fn quantity(field: FieldName, raw: i64) -> Result<u32, Error> {
    if raw < 0 {
        return Err(field_error(
            field,
            ErrorCode::Negative,
            "Quantity cannot be negative",
        ));
    }
    u32::try_from(raw)
        .ok()
        .filter(|quantity| *quantity <= MAX_QUANTITY)
        .ok_or_else(|| field_error(field, ErrorCode::TooLarge, "Quantity is too large"))
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let message = match &err {
        JsonPayloadError::Deserialize(inner) => inner.to_string(),
        JsonPayloadError::ContentType => "Content type must be application/json".to_owned(),
        other => other.to_string(),
    };
    Error::validation(message)
        .with_details(json!({ "code": ErrorCode::InvalidBody.as_str() }))
        .into()
}

fn path_error(err: PathError, req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(error = %err, path = req.path(), "unparseable path segment");
    Error::not_found("Resource not found").into()
}

/// JSON extractor configuration mapping body errors to validation failures.
///
/// Unknown fields surface here because request bodies deny them.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(json_error)
}

/// Path extractor configuration mapping non-numeric ids to 404.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(path_error)
}

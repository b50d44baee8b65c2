//! Bearer-token authentication for HTTP handlers.
//!
//! Handlers that need a caller take an [`Authenticated`] argument. The
//! extractor parses the `Authorization` header, then asks the auth service to
//! verify the token and resolve the live identity. Role checks stay in the
//! domain services.

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, post, web};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{Error, Principal};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

const BEARER: &str = "Bearer";

/// Caller resolved from a verified, unrevoked bearer token.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Principal);

impl Authenticated {
    pub fn principal(&self) -> &Principal {
        &self.0
    }
}

/// Pull the token out of an `Authorization` header value.
///
/// The header splits on whitespace; the scheme matches case-insensitively.
/// Each malformed shape gets its own message.
pub(crate) fn bearer_token(header: Option<&str>) -> Result<&str, Error> {
    let mut parts = header.unwrap_or_default().split_whitespace();
    let Some(scheme) = parts.next() else {
        return Err(Error::unauthenticated("Authorization header missing"));
    };
    let Some(token) = parts.next() else {
        return Err(Error::unauthenticated("Bearer token missing after prefix"));
    };
    if !scheme.eq_ignore_ascii_case(BEARER) {
        return Err(Error::unauthenticated(
            "Authorization header must start with 'Bearer'",
        ));
    }
    Ok(token)
}

impl FromRequest for Authenticated {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let header = req
            .headers()
            .get(AUTHORIZATION)
            .map(|value| value.to_str().map(str::to_owned));
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        Box::pin(async move {
            let Some(state) = state else {
                tracing::error!("HttpState missing from app data");
                return Err(Error::internal("Internal server error").into());
            };
            let header = match header.transpose() {
                Ok(header) => header,
                Err(_) => {
                    warn!("non-ASCII authorization header");
                    return Err(Error::unauthenticated(
                        "Authorization header must start with 'Bearer'",
                    )
                    .into());
                }
            };
            let token = bearer_token(header.as_deref())?;
            let principal = state.auth.authorize(token).await?;
            Ok(Self(principal))
        })
    }
}

/// Revoke every token issued to the caller.
///
/// Bumps the revocation counter; the presented token stops working at once.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 204, description = "Tokens revoked"),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "logout",
    security(("bearer" = []))
)]
#[post("/auth/logout")]
pub async fn logout(state: web::Data<HttpState>, caller: Authenticated) -> ApiResult<HttpResponse> {
    state.auth.logout(caller.principal()).await?;
    Ok(HttpResponse::NoContent().finish())
}

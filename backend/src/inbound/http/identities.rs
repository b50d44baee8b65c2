//! Request and response bodies shared by the customer and mechanic routes.
//!
//! Both role partitions expose the same account operations. The handlers in
//! `customers` and `mechanics` stay thin and delegate to the helpers here,
//! passing the role they serve.

use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::TicketScope;
use crate::domain::staffing::MechanicLoad;
use crate::domain::{
    EmailAddress, Error, Identity, IdentityKey, IssuedToken, LoginCredentials, PersonName,
    PhoneNumber, PlainPassword, Profile, ProfileUpdate, Registration, Role, Salary,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::tickets::TicketResponse;

/// Body for `POST /api/v1/customers`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterCustomerRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

/// Body for `POST /api/v1/mechanics`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterMechanicRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    /// Annual salary in whole currency units.
    pub salary: i64,
}

/// Body for `POST /api/v1/{customers,mechanics}/login`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = Error;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Ok(Self::try_from_parts(&value.email, &value.password)?)
    }
}

/// Issued bearer token.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

impl From<IssuedToken> for LoginResponse {
    fn from(value: IssuedToken) -> Self {
        Self {
            token: value.token,
            message: "Login successful".to_owned(),
            expires_at: value.expires_at,
        }
    }
}

/// Allow-listed self update; absent fields are left unchanged.
///
/// `salary` is accepted for mechanics only.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub salary: Option<i64>,
}

impl TryFrom<UpdateProfileRequest> for ProfileUpdate {
    type Error = Error;

    fn try_from(value: UpdateProfileRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: value.name.map(PersonName::new).transpose()?,
            email: value.email.map(EmailAddress::new).transpose()?,
            phone: value.phone.map(PhoneNumber::new).transpose()?,
            password: value.password.as_deref().map(PlainPassword::new).transpose()?,
            salary: value.salary.map(Salary::new).transpose()?,
        })
    }
}

/// Public view of an account. Credentials never leave the server.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentityResponse {
    pub id: i64,
    #[schema(value_type = String, example = "customer")]
    pub role: Role,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<i64>,
}

impl From<&Identity> for IdentityResponse {
    fn from(identity: &Identity) -> Self {
        let (id, salary) = match identity {
            Identity::Customer(customer) => (customer.id.get(), None),
            Identity::Mechanic(mechanic) => (mechanic.id.get(), Some(mechanic.salary.get())),
        };
        let profile = &identity.account().profile;
        Self {
            id,
            role: identity.role(),
            name: profile.name.to_string(),
            email: profile.email.to_string(),
            phone: profile.phone.to_string(),
            salary,
        }
    }
}

/// Result of a self update. A password change revokes older tokens, so a
/// replacement is returned alongside the profile.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdatedResponse {
    pub profile: IdentityResponse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<LoginResponse>,
}

/// Confirmation body for account deletion.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// One row of the mechanic workload ranking.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadEntry {
    pub mechanic: IdentityResponse,
    pub ticket_count: u64,
}

impl From<MechanicLoad> for WorkloadEntry {
    fn from(load: MechanicLoad) -> Self {
        Self {
            mechanic: IdentityResponse::from(&Identity::Mechanic(load.mechanic)),
            ticket_count: load.ticket_count,
        }
    }
}

pub(crate) fn profile(name: &str, email: &str, phone: &str) -> Result<Profile, Error> {
    Ok(Profile {
        name: PersonName::new(name)?,
        email: EmailAddress::new(email)?,
        phone: PhoneNumber::new(phone)?,
    })
}

pub(crate) async fn register(
    state: &HttpState,
    registration: Registration,
) -> ApiResult<HttpResponse> {
    let identity = state.identities.register(registration).await?;
    Ok(HttpResponse::Created().json(IdentityResponse::from(&identity)))
}

pub(crate) async fn login(
    state: &HttpState,
    role: Role,
    payload: LoginRequest,
) -> ApiResult<web::Json<LoginResponse>> {
    let credentials = LoginCredentials::try_from(payload)?;
    let issued = state.auth.login(role, &credentials).await?;
    Ok(web::Json(issued.into()))
}

pub(crate) async fn list(
    state: &HttpState,
    role: Role,
) -> ApiResult<web::Json<Vec<IdentityResponse>>> {
    let identities = state.identities.list(role).await?;
    Ok(web::Json(identities.iter().map(IdentityResponse::from).collect()))
}

pub(crate) async fn get(state: &HttpState, key: IdentityKey) -> ApiResult<web::Json<IdentityResponse>> {
    let identity = state.identities.get(key).await?;
    Ok(web::Json(IdentityResponse::from(&identity)))
}

pub(crate) fn own_profile(caller: &Authenticated, role: Role) -> ApiResult<web::Json<IdentityResponse>> {
    caller.principal().require_role(&[role])?;
    Ok(web::Json(IdentityResponse::from(caller.principal().identity())))
}

pub(crate) async fn update_profile(
    state: &HttpState,
    caller: &Authenticated,
    role: Role,
    payload: UpdateProfileRequest,
) -> ApiResult<web::Json<ProfileUpdatedResponse>> {
    caller.principal().require_role(&[role])?;
    let update = ProfileUpdate::try_from(payload)?;
    let updated = state.identities.update_self(caller.principal(), update).await?;
    Ok(web::Json(ProfileUpdatedResponse {
        profile: IdentityResponse::from(&updated.identity),
        token: updated.token.map(LoginResponse::from),
    }))
}

pub(crate) async fn delete_profile(
    state: &HttpState,
    caller: &Authenticated,
    role: Role,
) -> ApiResult<web::Json<MessageResponse>> {
    caller.principal().require_role(&[role])?;
    state.identities.delete_self(caller.principal()).await?;
    let message = match caller.principal().identity() {
        Identity::Customer(customer) => format!("Customer id: {}, successfully deleted.", customer.id),
        Identity::Mechanic(mechanic) => format!("Mechanic id: {} deleted successfully.", mechanic.id),
    };
    Ok(web::Json(MessageResponse { message }))
}

pub(crate) async fn own_tickets(
    state: &HttpState,
    caller: &Authenticated,
    role: Role,
) -> ApiResult<web::Json<Vec<TicketResponse>>> {
    let principal = caller.principal();
    principal.require_role(&[role])?;
    let scope = match (principal.customer_id(), principal.mechanic_id()) {
        (Some(customer_id), _) => TicketScope::Customer(customer_id),
        (None, Some(mechanic_id)) => TicketScope::Mechanic(mechanic_id),
        (None, None) => return Err(Error::forbidden("Forbidden: insufficient role")),
    };
    let tickets = state.tickets.list(scope).await?;
    Ok(web::Json(tickets.iter().map(TicketResponse::from).collect()))
}

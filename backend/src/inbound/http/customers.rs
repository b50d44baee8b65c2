//! Customer account handlers.
//!
//! ```text
//! POST /api/v1/customers {"name":"Ana","email":"ana@shop.test","phone":"555-123-4567","password":"..."}
//! POST /api/v1/customers/login {"email":"ana@shop.test","password":"..."}
//! GET /api/v1/customers/me
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::domain::{CustomerId, IdentityKey, PlainPassword, Registration, Role};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::identities::{
    self, IdentityResponse, LoginRequest, LoginResponse, MessageResponse, ProfileUpdatedResponse,
    RegisterCustomerRequest, UpdateProfileRequest,
};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::tickets::TicketResponse;

/// Mount the customer routes; `me` is registered before `{id}`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(register_customer)
        .service(login_customer)
        .service(list_customers)
        .service(current_customer)
        .service(update_current_customer)
        .service(delete_current_customer)
        .service(current_customer_tickets)
        .service(get_customer);
}

/// Register a customer account.
#[utoipa::path(
    post,
    path = "/api/v1/customers",
    request_body = RegisterCustomerRequest,
    responses(
        (status = 201, description = "Customer registered", body = IdentityResponse),
        (status = 400, description = "Invalid or duplicate field", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["customers"],
    operation_id = "registerCustomer",
    security([])
)]
#[post("/customers")]
pub async fn register_customer(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterCustomerRequest>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let registration = Registration::Customer {
        profile: identities::profile(&body.name, &body.email, &body.phone)?,
        password: PlainPassword::new(&body.password)?,
    };
    identities::register(&state, registration).await
}

/// Exchange customer credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/api/v1/customers/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid email or password", body = ErrorSchema)
    ),
    tags = ["customers"],
    operation_id = "loginCustomer",
    security([])
)]
#[post("/customers/login")]
pub async fn login_customer(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<LoginResponse>> {
    identities::login(&state, Role::Customer, payload.into_inner()).await
}

/// List customers.
#[utoipa::path(
    get,
    path = "/api/v1/customers",
    responses(
        (status = 200, description = "Customers", body = [IdentityResponse]),
        (status = 401, description = "Unauthenticated", body = ErrorSchema)
    ),
    tags = ["customers"],
    operation_id = "listCustomers"
)]
#[get("/customers")]
pub async fn list_customers(
    state: web::Data<HttpState>,
    _caller: Authenticated,
) -> ApiResult<web::Json<Vec<IdentityResponse>>> {
    identities::list(&state, Role::Customer).await
}

/// Fetch one customer.
#[utoipa::path(
    get,
    path = "/api/v1/customers/{id}",
    params(("id" = i64, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer", body = IdentityResponse),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 404, description = "Customer not found", body = ErrorSchema)
    ),
    tags = ["customers"],
    operation_id = "getCustomer"
)]
#[get("/customers/{id}")]
pub async fn get_customer(
    state: web::Data<HttpState>,
    _caller: Authenticated,
    path: web::Path<i64>,
) -> ApiResult<web::Json<IdentityResponse>> {
    let key = IdentityKey::Customer(CustomerId::new(path.into_inner()));
    identities::get(&state, key).await
}

/// The caller's own customer profile.
#[utoipa::path(
    get,
    path = "/api/v1/customers/me",
    responses(
        (status = 200, description = "Own profile", body = IdentityResponse),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 403, description = "Caller is not a customer", body = ErrorSchema)
    ),
    tags = ["customers"],
    operation_id = "currentCustomer"
)]
#[get("/customers/me")]
pub async fn current_customer(caller: Authenticated) -> ApiResult<web::Json<IdentityResponse>> {
    identities::own_profile(&caller, Role::Customer)
}

/// Update the caller's own profile.
#[utoipa::path(
    put,
    path = "/api/v1/customers/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileUpdatedResponse),
        (status = 400, description = "Invalid or duplicate field", body = ErrorSchema),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 403, description = "Caller is not a customer", body = ErrorSchema)
    ),
    tags = ["customers"],
    operation_id = "updateCurrentCustomer"
)]
#[put("/customers/me")]
pub async fn update_current_customer(
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: web::Json<UpdateProfileRequest>,
) -> ApiResult<web::Json<ProfileUpdatedResponse>> {
    identities::update_profile(&state, &caller, Role::Customer, payload.into_inner()).await
}

/// Delete the caller's account together with their tickets.
#[utoipa::path(
    delete,
    path = "/api/v1/customers/me",
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 403, description = "Caller is not a customer", body = ErrorSchema)
    ),
    tags = ["customers"],
    operation_id = "deleteCurrentCustomer"
)]
#[delete("/customers/me")]
pub async fn delete_current_customer(
    state: web::Data<HttpState>,
    caller: Authenticated,
) -> ApiResult<web::Json<MessageResponse>> {
    identities::delete_profile(&state, &caller, Role::Customer).await
}

/// Tickets owned by the caller.
#[utoipa::path(
    get,
    path = "/api/v1/customers/me/tickets",
    responses(
        (status = 200, description = "Own tickets", body = [TicketResponse]),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 403, description = "Caller is not a customer", body = ErrorSchema)
    ),
    tags = ["customers"],
    operation_id = "currentCustomerTickets"
)]
#[get("/customers/me/tickets")]
pub async fn current_customer_tickets(
    state: web::Data<HttpState>,
    caller: Authenticated,
) -> ApiResult<web::Json<Vec<TicketResponse>>> {
    identities::own_tickets(&state, &caller, Role::Customer).await
}

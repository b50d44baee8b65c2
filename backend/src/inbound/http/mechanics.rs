//! Mechanic account handlers and the workload ranking.
//!
//! ```text
//! POST /api/v1/mechanics {"name":"Max","email":"max@shop.test","phone":"555-123-4567","password":"...","salary":60000}
//! GET /api/v1/mechanics/workload
//! DELETE /api/v1/mechanics/me
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::domain::{IdentityKey, MechanicId, PlainPassword, Registration, Role, Salary};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::identities::{
    self, IdentityResponse, LoginRequest, LoginResponse, MessageResponse, ProfileUpdatedResponse,
    RegisterMechanicRequest, UpdateProfileRequest, WorkloadEntry,
};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::tickets::TicketResponse;

/// Mount the mechanic routes; `me` and `workload` precede `{id}`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(register_mechanic)
        .service(login_mechanic)
        .service(list_mechanics)
        .service(mechanic_workload)
        .service(current_mechanic)
        .service(update_current_mechanic)
        .service(delete_current_mechanic)
        .service(current_mechanic_tickets)
        .service(get_mechanic);
}

/// Register a mechanic account.
#[utoipa::path(
    post,
    path = "/api/v1/mechanics",
    request_body = RegisterMechanicRequest,
    responses(
        (status = 201, description = "Mechanic registered", body = IdentityResponse),
        (status = 400, description = "Invalid or duplicate field", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["mechanics"],
    operation_id = "registerMechanic",
    security([])
)]
#[post("/mechanics")]
pub async fn register_mechanic(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterMechanicRequest>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let registration = Registration::Mechanic {
        profile: identities::profile(&body.name, &body.email, &body.phone)?,
        password: PlainPassword::new(&body.password)?,
        salary: Salary::new(body.salary)?,
    };
    identities::register(&state, registration).await
}

/// Exchange mechanic credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/api/v1/mechanics/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid email or password", body = ErrorSchema)
    ),
    tags = ["mechanics"],
    operation_id = "loginMechanic",
    security([])
)]
#[post("/mechanics/login")]
pub async fn login_mechanic(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<LoginResponse>> {
    identities::login(&state, Role::Mechanic, payload.into_inner()).await
}

/// List mechanics.
#[utoipa::path(
    get,
    path = "/api/v1/mechanics",
    responses(
        (status = 200, description = "Mechanics", body = [IdentityResponse]),
        (status = 401, description = "Unauthenticated", body = ErrorSchema)
    ),
    tags = ["mechanics"],
    operation_id = "listMechanics"
)]
#[get("/mechanics")]
pub async fn list_mechanics(
    state: web::Data<HttpState>,
    _caller: Authenticated,
) -> ApiResult<web::Json<Vec<IdentityResponse>>> {
    identities::list(&state, Role::Mechanic).await
}

/// Mechanics ordered by assigned ticket count, busiest first.
///
/// Ties are broken by ascending mechanic id.
#[utoipa::path(
    get,
    path = "/api/v1/mechanics/workload",
    responses(
        (status = 200, description = "Mechanic ranking", body = [WorkloadEntry]),
        (status = 401, description = "Unauthenticated", body = ErrorSchema)
    ),
    tags = ["mechanics"],
    operation_id = "mechanicWorkload"
)]
#[get("/mechanics/workload")]
pub async fn mechanic_workload(
    state: web::Data<HttpState>,
    _caller: Authenticated,
) -> ApiResult<web::Json<Vec<WorkloadEntry>>> {
    let loads = state.tickets.workload().await?;
    Ok(web::Json(loads.into_iter().map(WorkloadEntry::from).collect()))
}

/// Fetch one mechanic.
#[utoipa::path(
    get,
    path = "/api/v1/mechanics/{id}",
    params(("id" = i64, Path, description = "Mechanic id")),
    responses(
        (status = 200, description = "Mechanic", body = IdentityResponse),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 404, description = "Mechanic not found", body = ErrorSchema)
    ),
    tags = ["mechanics"],
    operation_id = "getMechanic"
)]
#[get("/mechanics/{id}")]
pub async fn get_mechanic(
    state: web::Data<HttpState>,
    _caller: Authenticated,
    path: web::Path<i64>,
) -> ApiResult<web::Json<IdentityResponse>> {
    let key = IdentityKey::Mechanic(MechanicId::new(path.into_inner()));
    identities::get(&state, key).await
}

/// The caller's own mechanic profile.
#[utoipa::path(
    get,
    path = "/api/v1/mechanics/me",
    responses(
        (status = 200, description = "Own profile", body = IdentityResponse),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 403, description = "Caller is not a mechanic", body = ErrorSchema)
    ),
    tags = ["mechanics"],
    operation_id = "currentMechanic"
)]
#[get("/mechanics/me")]
pub async fn current_mechanic(caller: Authenticated) -> ApiResult<web::Json<IdentityResponse>> {
    identities::own_profile(&caller, Role::Mechanic)
}

/// Update the caller's own profile, salary included.
#[utoipa::path(
    put,
    path = "/api/v1/mechanics/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileUpdatedResponse),
        (status = 400, description = "Invalid or duplicate field", body = ErrorSchema),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 403, description = "Caller is not a mechanic", body = ErrorSchema)
    ),
    tags = ["mechanics"],
    operation_id = "updateCurrentMechanic"
)]
#[put("/mechanics/me")]
pub async fn update_current_mechanic(
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: web::Json<UpdateProfileRequest>,
) -> ApiResult<web::Json<ProfileUpdatedResponse>> {
    identities::update_profile(&state, &caller, Role::Mechanic, payload.into_inner()).await
}

/// Delete the caller's account and unassign them from their tickets.
///
/// Rejected while the caller is the only mechanic on any ticket.
#[utoipa::path(
    delete,
    path = "/api/v1/mechanics/me",
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 400, description = "A ticket would be left without mechanics", body = ErrorSchema),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 403, description = "Caller is not a mechanic", body = ErrorSchema)
    ),
    tags = ["mechanics"],
    operation_id = "deleteCurrentMechanic"
)]
#[delete("/mechanics/me")]
pub async fn delete_current_mechanic(
    state: web::Data<HttpState>,
    caller: Authenticated,
) -> ApiResult<web::Json<MessageResponse>> {
    identities::delete_profile(&state, &caller, Role::Mechanic).await
}

/// Tickets the caller is assigned to.
#[utoipa::path(
    get,
    path = "/api/v1/mechanics/me/tickets",
    responses(
        (status = 200, description = "Assigned tickets", body = [TicketResponse]),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 403, description = "Caller is not a mechanic", body = ErrorSchema)
    ),
    tags = ["mechanics"],
    operation_id = "currentMechanicTickets"
)]
#[get("/mechanics/me/tickets")]
pub async fn current_mechanic_tickets(
    state: web::Data<HttpState>,
    caller: Authenticated,
) -> ApiResult<web::Json<Vec<TicketResponse>>> {
    identities::own_tickets(&state, &caller, Role::Mechanic).await
}

//! Service ticket handlers.
//!
//! ```text
//! POST /api/v1/tickets {"vin":"1HGCM82633A123456","serviceDate":"2030-06-15","serviceDesc":"Brake inspection","customerId":1,"mechanicIds":[1]}
//! PUT /api/v1/tickets/1/parts {"partId":1,"quantityUsed":3,"quantityReturned":1}
//! PUT /api/v1/tickets/1/mechanics {"addMechanicIds":[2],"removeMechanicIds":[1]}
//! ```
//!
//! Customers may read the tickets they own; every mutation needs a mechanic.

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::TicketScope;
use crate::domain::{
    CustomerId, Error, MechanicChanges, MechanicId, PartId, PartUsage, PartsAdjustment,
    Principal, Role, ServiceDescription, ServiceTicket, TicketDraft, TicketId, TicketInfoChanges,
    Vin,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::identities::MessageResponse;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, quantity};

/// Body for `POST /api/v1/tickets`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateTicketRequest {
    #[schema(example = "1HGCM82633A123456")]
    pub vin: String,
    pub service_date: NaiveDate,
    pub service_desc: String,
    pub customer_id: i64,
    pub mechanic_ids: Vec<i64>,
}

impl TryFrom<CreateTicketRequest> for TicketDraft {
    type Error = Error;

    fn try_from(value: CreateTicketRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            customer_id: CustomerId::new(value.customer_id),
            vin: Vin::new(&value.vin)?,
            service_date: value.service_date,
            description: ServiceDescription::new(&value.service_desc)?,
            mechanic_ids: value.mechanic_ids.into_iter().map(MechanicId::new).collect(),
        })
    }
}

/// Body for `PUT /api/v1/tickets/{id}/info`; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateTicketInfoRequest {
    pub vin: Option<String>,
    pub service_date: Option<NaiveDate>,
    pub service_desc: Option<String>,
}

impl TryFrom<UpdateTicketInfoRequest> for TicketInfoChanges {
    type Error = Error;

    fn try_from(value: UpdateTicketInfoRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            vin: value.vin.map(Vin::new).transpose()?,
            service_date: value.service_date,
            description: value
                .service_desc
                .map(ServiceDescription::new)
                .transpose()?,
        })
    }
}

/// Body for `PUT /api/v1/tickets/{id}/mechanics`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateMechanicsRequest {
    #[serde(default)]
    pub add_mechanic_ids: Vec<i64>,
    #[serde(default)]
    pub remove_mechanic_ids: Vec<i64>,
}

impl From<UpdateMechanicsRequest> for MechanicChanges {
    fn from(value: UpdateMechanicsRequest) -> Self {
        Self {
            add: value.add_mechanic_ids.into_iter().map(MechanicId::new).collect(),
            remove: value
                .remove_mechanic_ids
                .into_iter()
                .map(MechanicId::new)
                .collect(),
        }
    }
}

/// Body for `PUT /api/v1/tickets/{id}/parts`.
///
/// Reserves `quantityUsed` units first, then returns `quantityReturned`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdatePartsRequest {
    pub part_id: i64,
    #[serde(default)]
    pub quantity_used: i64,
    #[serde(default)]
    pub quantity_returned: i64,
}

impl TryFrom<UpdatePartsRequest> for PartsAdjustment {
    type Error = Error;

    fn try_from(value: UpdatePartsRequest) -> Result<Self, Self::Error> {
        let used = quantity(FieldName::new("quantityUsed"), value.quantity_used)?;
        let returned = quantity(FieldName::new("quantityReturned"), value.quantity_returned)?;
        Ok(Self::new(PartId::new(value.part_id), used, returned)?)
    }
}

/// Confirmation of a committed parts update.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartsUpdatedResponse {
    #[schema(example = "3 Headlights(s) added and 1 Headlights(s) removed")]
    pub message: String,
    pub ticket_id: i64,
}

/// Part usage embedded in a ticket view.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartUsageResponse {
    pub part_id: i64,
    pub part_name: String,
    pub quantity_used: u32,
}

impl From<&PartUsage> for PartUsageResponse {
    fn from(usage: &PartUsage) -> Self {
        Self {
            part_id: usage.part_id.get(),
            part_name: usage.part_name.to_string(),
            quantity_used: usage.quantity_used,
        }
    }
}

/// Ticket view with its mechanics and part usages.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketResponse {
    pub id: i64,
    pub vin: String,
    pub service_date: NaiveDate,
    pub service_desc: String,
    pub customer_id: i64,
    pub mechanic_ids: Vec<i64>,
    pub parts: Vec<PartUsageResponse>,
}

impl From<&ServiceTicket> for TicketResponse {
    fn from(ticket: &ServiceTicket) -> Self {
        Self {
            id: ticket.id.get(),
            vin: ticket.vin.to_string(),
            service_date: ticket.service_date,
            service_desc: ticket.description.to_string(),
            customer_id: ticket.customer_id.get(),
            mechanic_ids: ticket.mechanic_ids.iter().map(|id| id.get()).collect(),
            parts: ticket.parts.iter().map(PartUsageResponse::from).collect(),
        }
    }
}

/// Customers only ever see their own tickets.
fn visible_scope(principal: &Principal) -> TicketScope {
    principal
        .customer_id()
        .map_or(TicketScope::All, TicketScope::Customer)
}

fn ensure_visible(principal: &Principal, ticket: &ServiceTicket) -> Result<(), Error> {
    match principal.customer_id() {
        Some(owner) if owner != ticket.customer_id => {
            Err(Error::forbidden("Forbidden: ticket belongs to another customer"))
        }
        _ => Ok(()),
    }
}

/// Mount the ticket routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_ticket)
        .service(list_tickets)
        .service(get_ticket)
        .service(update_ticket_info)
        .service(update_ticket_mechanics)
        .service(update_ticket_parts)
        .service(delete_ticket);
}

/// Open a service ticket.
#[utoipa::path(
    post,
    path = "/api/v1/tickets",
    request_body = CreateTicketRequest,
    responses(
        (status = 201, description = "Ticket created", body = TicketResponse),
        (status = 400, description = "Invalid field or unknown reference", body = ErrorSchema),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 403, description = "Caller is not a mechanic", body = ErrorSchema)
    ),
    tags = ["tickets"],
    operation_id = "createTicket"
)]
#[post("/tickets")]
pub async fn create_ticket(
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: web::Json<CreateTicketRequest>,
) -> ApiResult<HttpResponse> {
    caller.principal().require_role(&[Role::Mechanic])?;
    let draft = TicketDraft::try_from(payload.into_inner())?;
    let ticket = state.tickets.create(caller.principal(), draft).await?;
    Ok(HttpResponse::Created().json(TicketResponse::from(&ticket)))
}

/// List tickets; customers see only their own.
#[utoipa::path(
    get,
    path = "/api/v1/tickets",
    responses(
        (status = 200, description = "Tickets", body = [TicketResponse]),
        (status = 401, description = "Unauthenticated", body = ErrorSchema)
    ),
    tags = ["tickets"],
    operation_id = "listTickets"
)]
#[get("/tickets")]
pub async fn list_tickets(
    state: web::Data<HttpState>,
    caller: Authenticated,
) -> ApiResult<web::Json<Vec<TicketResponse>>> {
    let tickets = state.tickets.list(visible_scope(caller.principal())).await?;
    Ok(web::Json(tickets.iter().map(TicketResponse::from).collect()))
}

/// Fetch one ticket.
#[utoipa::path(
    get,
    path = "/api/v1/tickets/{id}",
    params(("id" = i64, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Ticket", body = TicketResponse),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 403, description = "Ticket belongs to another customer", body = ErrorSchema),
        (status = 404, description = "Ticket not found", body = ErrorSchema)
    ),
    tags = ["tickets"],
    operation_id = "getTicket"
)]
#[get("/tickets/{id}")]
pub async fn get_ticket(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<i64>,
) -> ApiResult<web::Json<TicketResponse>> {
    let ticket = state.tickets.get(TicketId::new(path.into_inner())).await?;
    ensure_visible(caller.principal(), &ticket)?;
    Ok(web::Json(TicketResponse::from(&ticket)))
}

/// Change the VIN, service date or description.
#[utoipa::path(
    put,
    path = "/api/v1/tickets/{id}/info",
    params(("id" = i64, Path, description = "Ticket id")),
    request_body = UpdateTicketInfoRequest,
    responses(
        (status = 200, description = "Ticket updated", body = TicketResponse),
        (status = 400, description = "Invalid field", body = ErrorSchema),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 403, description = "Caller is not a mechanic", body = ErrorSchema),
        (status = 404, description = "Ticket not found", body = ErrorSchema)
    ),
    tags = ["tickets"],
    operation_id = "updateTicketInfo"
)]
#[put("/tickets/{id}/info")]
pub async fn update_ticket_info(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<i64>,
    payload: web::Json<UpdateTicketInfoRequest>,
) -> ApiResult<web::Json<TicketResponse>> {
    caller.principal().require_role(&[Role::Mechanic])?;
    let changes = TicketInfoChanges::try_from(payload.into_inner())?;
    let ticket = state
        .tickets
        .update_info(caller.principal(), TicketId::new(path.into_inner()), changes)
        .await?;
    Ok(web::Json(TicketResponse::from(&ticket)))
}

/// Assign and unassign mechanics in one all-or-nothing step.
#[utoipa::path(
    put,
    path = "/api/v1/tickets/{id}/mechanics",
    params(("id" = i64, Path, description = "Ticket id")),
    request_body = UpdateMechanicsRequest,
    responses(
        (status = 200, description = "Mechanics updated", body = TicketResponse),
        (status = 400, description = "Would remove the last mechanic", body = ErrorSchema),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 403, description = "Caller is not a mechanic", body = ErrorSchema),
        (status = 404, description = "Ticket not found", body = ErrorSchema)
    ),
    tags = ["tickets"],
    operation_id = "updateTicketMechanics"
)]
#[put("/tickets/{id}/mechanics")]
pub async fn update_ticket_mechanics(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<i64>,
    payload: web::Json<UpdateMechanicsRequest>,
) -> ApiResult<web::Json<TicketResponse>> {
    let ticket = state
        .tickets
        .update_mechanics(
            caller.principal(),
            TicketId::new(path.into_inner()),
            payload.into_inner().into(),
        )
        .await?;
    Ok(web::Json(TicketResponse::from(&ticket)))
}

/// Reserve and return stock for one part on the ticket.
#[utoipa::path(
    put,
    path = "/api/v1/tickets/{id}/parts",
    params(("id" = i64, Path, description = "Ticket id")),
    request_body = UpdatePartsRequest,
    responses(
        (status = 200, description = "Stock moved", body = PartsUpdatedResponse),
        (status = 400, description = "Insufficient stock or over-return", body = ErrorSchema),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 403, description = "Caller is not a mechanic", body = ErrorSchema),
        (status = 404, description = "Ticket not found", body = ErrorSchema)
    ),
    tags = ["tickets"],
    operation_id = "updateTicketParts"
)]
#[put("/tickets/{id}/parts")]
pub async fn update_ticket_parts(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<i64>,
    payload: web::Json<UpdatePartsRequest>,
) -> ApiResult<web::Json<PartsUpdatedResponse>> {
    caller.principal().require_role(&[Role::Mechanic])?;
    let adjustment = PartsAdjustment::try_from(payload.into_inner())?;
    let updated = state
        .tickets
        .update_parts(caller.principal(), TicketId::new(path.into_inner()), adjustment)
        .await?;
    Ok(web::Json(PartsUpdatedResponse {
        message: updated.message,
        ticket_id: updated.ticket_id.get(),
    }))
}

/// Delete a ticket. Consumed parts are not returned to stock.
#[utoipa::path(
    delete,
    path = "/api/v1/tickets/{id}",
    params(("id" = i64, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Ticket deleted", body = MessageResponse),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 403, description = "Caller is not a mechanic", body = ErrorSchema),
        (status = 404, description = "Ticket not found", body = ErrorSchema)
    ),
    tags = ["tickets"],
    operation_id = "deleteTicket"
)]
#[delete("/tickets/{id}")]
pub async fn delete_ticket(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<i64>,
) -> ApiResult<web::Json<MessageResponse>> {
    let id = TicketId::new(path.into_inner());
    state.tickets.delete(caller.principal(), id).await?;
    Ok(web::Json(MessageResponse {
        message: format!("Service ticket {id} deleted successfully."),
    }))
}

#[cfg(test)]
#[path = "tickets_tests.rs"]
mod tests;

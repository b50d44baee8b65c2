//! Inventory catalogue handlers.
//!
//! Reads are public; mutations need a mechanic token. Prices travel as JSON
//! numbers and are validated to cent precision.

use actix_web::{HttpResponse, delete, get, post, put, web};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    Error, NewPart, Part, PartChanges, PartId, PartName, Role, UnitPrice,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::identities::MessageResponse;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, quantity};

const QUANTITY: FieldName = FieldName::new("quantity");

/// Body for `POST /api/v1/parts`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreatePartRequest {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 59.99)]
    pub price: Decimal,
    /// Initial stock; defaults to zero.
    #[serde(default)]
    pub quantity: Option<i64>,
}

impl TryFrom<CreatePartRequest> for NewPart {
    type Error = Error;

    fn try_from(value: CreatePartRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: PartName::new(&value.name)?,
            price: UnitPrice::new(value.price)?,
            quantity_on_hand: quantity(QUANTITY, value.quantity.unwrap_or(0))?,
        })
    }
}

/// Body for `PUT /api/v1/parts/{id}`; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdatePartRequest {
    pub name: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>, example = 64.5)]
    pub price: Option<Decimal>,
    pub quantity: Option<i64>,
}

impl TryFrom<UpdatePartRequest> for PartChanges {
    type Error = Error;

    fn try_from(value: UpdatePartRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: value.name.map(PartName::new).transpose()?,
            price: value.price.map(UnitPrice::new).transpose()?,
            quantity_on_hand: value
                .quantity
                .map(|raw| quantity(QUANTITY, raw))
                .transpose()?,
        })
    }
}

/// Public view of a part.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartResponse {
    pub id: i64,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 59.99)]
    pub price: Decimal,
    /// Units on the shelf.
    pub quantity: u32,
}

impl From<&Part> for PartResponse {
    fn from(part: &Part) -> Self {
        Self {
            id: part.id.get(),
            name: part.name.to_string(),
            price: part.price.amount(),
            quantity: part.quantity_on_hand,
        }
    }
}

/// Mount the part routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_part)
        .service(list_parts)
        .service(get_part)
        .service(update_part)
        .service(delete_part);
}

/// Add a part to the catalogue.
#[utoipa::path(
    post,
    path = "/api/v1/parts",
    request_body = CreatePartRequest,
    responses(
        (status = 201, description = "Part created", body = PartResponse),
        (status = 400, description = "Invalid or duplicate field", body = ErrorSchema),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 403, description = "Caller is not a mechanic", body = ErrorSchema)
    ),
    tags = ["parts"],
    operation_id = "createPart"
)]
#[post("/parts")]
pub async fn create_part(
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: web::Json<CreatePartRequest>,
) -> ApiResult<HttpResponse> {
    caller.principal().require_role(&[Role::Mechanic])?;
    let new_part = NewPart::try_from(payload.into_inner())?;
    let part = state.inventory.create(caller.principal(), new_part).await?;
    Ok(HttpResponse::Created().json(PartResponse::from(&part)))
}

/// List the catalogue ordered by id.
#[utoipa::path(
    get,
    path = "/api/v1/parts",
    responses((status = 200, description = "Parts", body = [PartResponse])),
    tags = ["parts"],
    operation_id = "listParts",
    security([])
)]
#[get("/parts")]
pub async fn list_parts(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<PartResponse>>> {
    let parts = state.inventory.list().await?;
    Ok(web::Json(parts.iter().map(PartResponse::from).collect()))
}

/// Fetch one part.
#[utoipa::path(
    get,
    path = "/api/v1/parts/{id}",
    params(("id" = i64, Path, description = "Part id")),
    responses(
        (status = 200, description = "Part", body = PartResponse),
        (status = 404, description = "Part not found", body = ErrorSchema)
    ),
    tags = ["parts"],
    operation_id = "getPart",
    security([])
)]
#[get("/parts/{id}")]
pub async fn get_part(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<web::Json<PartResponse>> {
    let part = state.inventory.get(PartId::new(path.into_inner())).await?;
    Ok(web::Json(PartResponse::from(&part)))
}

/// Rename, reprice or restock a part.
#[utoipa::path(
    put,
    path = "/api/v1/parts/{id}",
    params(("id" = i64, Path, description = "Part id")),
    request_body = UpdatePartRequest,
    responses(
        (status = 200, description = "Part updated", body = PartResponse),
        (status = 400, description = "Invalid or duplicate field", body = ErrorSchema),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 403, description = "Caller is not a mechanic", body = ErrorSchema),
        (status = 404, description = "Part not found", body = ErrorSchema)
    ),
    tags = ["parts"],
    operation_id = "updatePart"
)]
#[put("/parts/{id}")]
pub async fn update_part(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<i64>,
    payload: web::Json<UpdatePartRequest>,
) -> ApiResult<web::Json<PartResponse>> {
    caller.principal().require_role(&[Role::Mechanic])?;
    let changes = PartChanges::try_from(payload.into_inner())?;
    let part = state
        .inventory
        .update(caller.principal(), PartId::new(path.into_inner()), changes)
        .await?;
    Ok(web::Json(PartResponse::from(&part)))
}

/// Remove a part that no ticket still uses.
#[utoipa::path(
    delete,
    path = "/api/v1/parts/{id}",
    params(("id" = i64, Path, description = "Part id")),
    responses(
        (status = 200, description = "Part deleted", body = MessageResponse),
        (status = 400, description = "Part is in use by service tickets", body = ErrorSchema),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 403, description = "Caller is not a mechanic", body = ErrorSchema),
        (status = 404, description = "Part not found", body = ErrorSchema)
    ),
    tags = ["parts"],
    operation_id = "deletePart"
)]
#[delete("/parts/{id}")]
pub async fn delete_part(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<i64>,
) -> ApiResult<web::Json<MessageResponse>> {
    let removed = state
        .inventory
        .delete(caller.principal(), PartId::new(path.into_inner()))
        .await?;
    Ok(web::Json(MessageResponse {
        message: format!("Successfully deleted part id {}: {}", removed.id, removed.name),
    }))
}

//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every `/api/v1` handler, the health probes, the
//! request and response bodies, and the domain error wrappers
//! ([`ErrorSchema`], [`ErrorCodeSchema`]) that describe the error envelope
//! without coupling domain types to utoipa.
//!
//! The document is served by Swagger UI in debug builds.

use crate::inbound::http::identities::{
    IdentityResponse, LoginRequest, LoginResponse, MessageResponse, ProfileUpdatedResponse,
    RegisterCustomerRequest, RegisterMechanicRequest, UpdateProfileRequest, WorkloadEntry,
};
use crate::inbound::http::parts::{CreatePartRequest, PartResponse, UpdatePartRequest};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::tickets::{
    CreateTicketRequest, PartUsageResponse, PartsUpdatedResponse, TicketResponse,
    UpdateMechanicsRequest, UpdatePartsRequest, UpdateTicketInfoRequest,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Name of the bearer token security scheme.
pub const BEARER_SCHEME: &str = "bearer";

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            BEARER_SCHEME,
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some(
                        "Token issued by POST /api/v1/customers/login or /api/v1/mechanics/login.",
                    ))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Mechanic shop API",
        description = "Customers, mechanics, parts inventory and service tickets."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("bearer" = [])),
    paths(
        crate::inbound::http::auth::logout,
        crate::inbound::http::customers::register_customer,
        crate::inbound::http::customers::login_customer,
        crate::inbound::http::customers::list_customers,
        crate::inbound::http::customers::get_customer,
        crate::inbound::http::customers::current_customer,
        crate::inbound::http::customers::update_current_customer,
        crate::inbound::http::customers::delete_current_customer,
        crate::inbound::http::customers::current_customer_tickets,
        crate::inbound::http::mechanics::register_mechanic,
        crate::inbound::http::mechanics::login_mechanic,
        crate::inbound::http::mechanics::list_mechanics,
        crate::inbound::http::mechanics::mechanic_workload,
        crate::inbound::http::mechanics::get_mechanic,
        crate::inbound::http::mechanics::current_mechanic,
        crate::inbound::http::mechanics::update_current_mechanic,
        crate::inbound::http::mechanics::delete_current_mechanic,
        crate::inbound::http::mechanics::current_mechanic_tickets,
        crate::inbound::http::parts::create_part,
        crate::inbound::http::parts::list_parts,
        crate::inbound::http::parts::get_part,
        crate::inbound::http::parts::update_part,
        crate::inbound::http::parts::delete_part,
        crate::inbound::http::tickets::create_ticket,
        crate::inbound::http::tickets::list_tickets,
        crate::inbound::http::tickets::get_ticket,
        crate::inbound::http::tickets::update_ticket_info,
        crate::inbound::http::tickets::update_ticket_mechanics,
        crate::inbound::http::tickets::update_ticket_parts,
        crate::inbound::http::tickets::delete_ticket,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        RegisterCustomerRequest,
        RegisterMechanicRequest,
        LoginRequest,
        LoginResponse,
        UpdateProfileRequest,
        IdentityResponse,
        ProfileUpdatedResponse,
        MessageResponse,
        WorkloadEntry,
        CreatePartRequest,
        UpdatePartRequest,
        PartResponse,
        CreateTicketRequest,
        UpdateTicketInfoRequest,
        UpdateMechanicsRequest,
        UpdatePartsRequest,
        PartsUpdatedResponse,
        PartUsageResponse,
        TicketResponse,
    )),
    tags(
        (name = "auth", description = "Token revocation"),
        (name = "customers", description = "Customer accounts"),
        (name = "mechanics", description = "Mechanic accounts and workload"),
        (name = "parts", description = "Parts inventory"),
        (name = "tickets", description = "Service tickets and part usage"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

//! Test helpers for inbound HTTP components.
//!
//! [`TestShop`] wires the real domain services over the in-memory store, a
//! JWT service keyed by a fixed secret and a low-cost bcrypt hasher, with the
//! clock pinned to [`today`].

use std::sync::Arc;

use actix_http::Request;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::http::header::AUTHORIZATION;
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use chrono::Duration;
use serde_json::{Value, json};

use crate::Trace;
use crate::domain::test_support::{FixtureClock, today, unique_phone};
use crate::inbound::http::configure_api;
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::inbound::http::validation::{json_config, path_config};
use crate::outbound::memory::MemoryStore;
use crate::outbound::password::BcryptPasswordHasher;
use crate::outbound::token::JwtTokenService;

const SECRET: &[u8] = b"test-secret-test-secret-test-secret";
pub const PASSWORD: &str = "correct-horse";

/// In-memory shop with helpers for registering callers.
pub struct TestShop {
    pub state: web::Data<HttpState>,
}

impl TestShop {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixtureClock::on(today()));
        let state = HttpState::new(HttpStatePorts {
            identities: store.clone(),
            parts: store.clone(),
            tickets: store,
            tokens: Arc::new(JwtTokenService::new(SECRET, Duration::hours(1), clock.clone())),
            passwords: Arc::new(BcryptPasswordHasher::new(4)),
            clock,
        });
        Self {
            state: web::Data::new(state),
        }
    }

    /// Initialise the full `/api/v1` service.
    pub async fn service(
        &self,
    ) -> impl Service<Request, Response = ServiceResponse, Error = actix_web::Error> {
        test::init_service(
            App::new()
                .wrap(Trace)
                .app_data(self.state.clone())
                .app_data(json_config())
                .app_data(path_config())
                .service(web::scope("/api/v1").configure(configure_api)),
        )
        .await
    }

    /// Register and log in a customer, returning its id and token.
    pub async fn customer(
        &self,
        app: &impl Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
        seed: &str,
    ) -> (i64, String) {
        register_and_login(app, "customers", seed, None).await
    }

    /// Register and log in a mechanic, returning its id and token.
    pub async fn mechanic(
        &self,
        app: &impl Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
        seed: &str,
    ) -> (i64, String) {
        register_and_login(app, "mechanics", seed, Some(60_000)).await
    }
}

async fn register_and_login(
    app: &impl Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
    collection: &str,
    seed: &str,
    salary: Option<i64>,
) -> (i64, String) {
    let email = format!("{seed}@shop.test");
    let mut body = json!({
        "name": format!("Person {seed}"),
        "email": email,
        "phone": unique_phone().to_string(),
        "password": PASSWORD,
    });
    if let Some(salary) = salary {
        body["salary"] = json!(salary);
    }
    let request = TestRequest::post()
        .uri(&format!("/api/v1/{collection}"))
        .set_json(&body)
        .to_request();
    let (status, created) = send(app, request).await;
    assert_eq!(status, StatusCode::CREATED, "registration failed: {created}");
    let id = created["id"].as_i64().expect("numeric id");

    let request = TestRequest::post()
        .uri(&format!("/api/v1/{collection}/login"))
        .set_json(json!({ "email": email, "password": PASSWORD }))
        .to_request();
    let (status, login) = send(app, request).await;
    assert_eq!(status, StatusCode::OK, "login failed: {login}");
    let token = login["token"].as_str().expect("token").to_owned();
    (id, token)
}

/// `Authorization` header carrying `token`.
pub fn bearer(token: &str) -> (actix_web::http::header::HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {token}"))
}

/// Call the service and decode the JSON body, if any.
pub async fn send(
    app: &impl Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
    request: Request,
) -> (StatusCode, Value) {
    let response = test::call_service(app, request).await;
    let status = response.status();
    let bytes = test::read_body(response).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON response body")
    };
    (status, body)
}

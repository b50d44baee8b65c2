//! HTTP inbound adapter exposing REST endpoints.

pub mod auth;
pub mod customers;
pub mod error;
pub mod health;
pub mod identities;
pub mod mechanics;
pub mod parts;
pub mod schemas;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod tickets;
pub mod token_config;
pub mod validation;

pub use error::ApiResult;

use actix_web::web;

/// Register every `/api/v1` resource on `cfg`.
///
/// Order matters: the literal `me` and `workload` segments are registered
/// before the `{id}` resources that would otherwise capture them.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use mechanic_shop::inbound::http::configure_api;
///
/// let _app = App::new().service(web::scope("/api/v1").configure(configure_api));
/// ```
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(auth::logout)
        .configure(customers::configure)
        .configure(mechanics::configure)
        .configure(parts::configure)
        .configure(tickets::configure);
}

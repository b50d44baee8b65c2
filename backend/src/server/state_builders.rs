//! Builders for HTTP state ports.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};

use mechanic_shop::domain::ports::{IdentityRepository, PartRepository, TicketRepository};
use mechanic_shop::inbound::http::state::{HttpState, HttpStatePorts};
use mechanic_shop::outbound::memory::MemoryStore;
use mechanic_shop::outbound::password::BcryptPasswordHasher;
use mechanic_shop::outbound::persistence::{
    DbPool, DieselIdentityRepository, DieselPartRepository, DieselTicketRepository,
};
use mechanic_shop::outbound::token::JwtTokenService;

use super::ServerConfig;

/// Repository trio backing the services.
struct Repositories {
    identities: Arc<dyn IdentityRepository>,
    parts: Arc<dyn PartRepository>,
    tickets: Arc<dyn TicketRepository>,
}

fn build_repositories(pool: Option<&DbPool>) -> Repositories {
    match pool {
        Some(pool) => Repositories {
            identities: Arc::new(DieselIdentityRepository::new(pool.clone())),
            parts: Arc::new(DieselPartRepository::new(pool.clone())),
            tickets: Arc::new(DieselTicketRepository::new(pool.clone())),
        },
        None => {
            let store = Arc::new(MemoryStore::new());
            Repositories {
                identities: store.clone(),
                parts: store.clone(),
                tickets: store,
            }
        }
    }
}

/// Wire the domain services from the server configuration.
pub fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let Repositories {
        identities,
        parts,
        tickets,
    } = build_repositories(config.db_pool.as_ref());
    let tokens = JwtTokenService::new(&config.token.secret, config.token_ttl, clock.clone());
    web::Data::new(HttpState::new(HttpStatePorts {
        identities,
        parts,
        tickets,
        tokens: Arc::new(tokens),
        passwords: Arc::new(BcryptPasswordHasher::new(config.password_cost)),
        clock,
    }))
}

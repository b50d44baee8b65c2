//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain services and remain testable without I/O.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{
    IdentityRepository, PartRepository, PasswordHasher, TicketRepository, TokenService,
};
use crate::domain::{AuthService, IdentityService, InventoryService, TicketService};

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub identities: Arc<dyn IdentityRepository>,
    pub parts: Arc<dyn PartRepository>,
    pub tickets: Arc<dyn TicketRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordHasher>,
    pub clock: Arc<dyn Clock>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub auth: AuthService,
    pub identities: IdentityService,
    pub inventory: InventoryService,
    pub tickets: TicketService,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}

impl HttpState {
    /// Wire the domain services over one set of ports.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use chrono::Duration;
    /// use mechanic_shop::inbound::http::state::{HttpState, HttpStatePorts};
    /// use mechanic_shop::outbound::memory::MemoryStore;
    /// use mechanic_shop::outbound::password::BcryptPasswordHasher;
    /// use mechanic_shop::outbound::token::JwtTokenService;
    /// use mockable::DefaultClock;
    ///
    /// let store = Arc::new(MemoryStore::new());
    /// let clock = Arc::new(DefaultClock);
    /// let state = HttpState::new(HttpStatePorts {
    ///     identities: store.clone(),
    ///     parts: store.clone(),
    ///     tickets: store,
    ///     tokens: Arc::new(JwtTokenService::new(
    ///         b"0123456789abcdef0123456789abcdef",
    ///         Duration::hours(1),
    ///         clock.clone(),
    ///     )),
    ///     passwords: Arc::new(BcryptPasswordHasher::default()),
    ///     clock,
    /// });
    /// let _auth = state.auth.clone();
    /// ```
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            identities,
            parts,
            tickets,
            tokens,
            passwords,
            clock,
        } = ports;
        let auth = AuthService::new(identities.clone(), tokens, passwords.clone());
        Self {
            identities: IdentityService::new(identities, passwords, auth.clone()),
            inventory: InventoryService::new(parts),
            tickets: TicketService::new(tickets, clock),
            auth,
        }
    }
}

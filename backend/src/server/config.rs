//! HTTP server configuration object and helpers.

use chrono::Duration;
use mechanic_shop::inbound::http::token_config::TokenSettings;
use mechanic_shop::outbound::persistence::DbPool;
use std::net::SocketAddr;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) token: TokenSettings,
    pub(crate) token_ttl: Duration,
    pub(crate) password_cost: u32,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    /// Construct a configuration with one-hour tokens and the default bcrypt cost.
    #[must_use]
    pub fn new(token: TokenSettings, bind_addr: SocketAddr) -> Self {
        Self {
            token,
            token_ttl: Duration::hours(1),
            password_cost: bcrypt::DEFAULT_COST,
            bind_addr,
            db_pool: None,
        }
    }

    /// Override the token lifetime.
    #[must_use]
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Override the bcrypt work factor.
    #[must_use]
    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }

    /// Attach a database connection pool.
    ///
    /// Without one the server runs on the in-memory store.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }
}

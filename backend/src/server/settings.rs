//! Server settings loaded via OrthoConfig.
//!
//! Values layer CLI flags over `SHOP_*` environment variables over config
//! files. The token secret is not here; see `token_config`.

use std::net::{Ipv4Addr, SocketAddr};

use chrono::Duration;
use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60;

/// Runtime settings for the HTTP server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SHOP")]
pub struct ServerSettings {
    /// Socket address to listen on.
    pub bind_address: Option<SocketAddr>,
    /// PostgreSQL URL; absent means the in-memory store.
    pub database_url: Option<String>,
    /// Lifetime of issued tokens in minutes.
    pub token_ttl_minutes: Option<i64>,
    /// bcrypt work factor for new password hashes.
    pub password_cost: Option<u32>,
}

impl ServerSettings {
    /// Configured bind address, defaulting to `0.0.0.0:8080`.
    pub fn bind_address(&self) -> SocketAddr {
        self.bind_address
            .unwrap_or_else(|| SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)))
    }

    /// Configured database URL, if any.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref().filter(|url| !url.trim().is_empty())
    }

    /// Token lifetime; non-positive values fall back to the default.
    pub fn token_ttl(&self) -> Duration {
        let minutes = self
            .token_ttl_minutes
            .filter(|minutes| *minutes > 0)
            .unwrap_or(DEFAULT_TOKEN_TTL_MINUTES);
        Duration::minutes(minutes)
    }

    /// bcrypt cost, defaulting to [`bcrypt::DEFAULT_COST`].
    pub fn password_cost(&self) -> u32 {
        self.password_cost.unwrap_or(bcrypt::DEFAULT_COST)
    }
}

//! Backend entry-point: loads settings, prepares storage and serves the API.

mod server;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr, eyre};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use mechanic_shop::inbound::http::health::HealthState;
use mechanic_shop::inbound::http::token_config::{BuildMode, token_settings_from_env};
use mechanic_shop::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use server::{ServerConfig, ServerSettings, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ServerSettings::load().map_err(|err| eyre!("failed to load settings: {err}"))?;
    let token = token_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .wrap_err("failed to load token secret")?;
    info!(
        fingerprint = %token.fingerprint(),
        ephemeral = token.ephemeral,
        "token secret loaded"
    );

    let mut config = ServerConfig::new(token, settings.bind_address())
        .with_token_ttl(settings.token_ttl())
        .with_password_cost(settings.password_cost());

    if let Some(url) = settings.database_url() {
        let migration_url = url.to_owned();
        tokio::task::spawn_blocking(move || run_migrations(&migration_url))
            .await
            .wrap_err("migration task panicked")?
            .map_err(|err| eyre!("failed to apply migrations: {err}"))?;
        let pool = DbPool::new(PoolConfig::new(url))
            .await
            .map_err(|err| eyre!("failed to build database pool: {err}"))?;
        config = config.with_db_pool(pool);
    } else {
        warn!("SHOP_DATABASE_URL not set; state lives in memory and is lost on exit");
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, &config)?;
    info!(address = %settings.bind_address(), "listening");
    server.await?;
    Ok(())
}

/// Auth Service - HTTP Server
///
/// Serves the JWKS document and the login endpoints.
use std::sync::Arc;

use actix_middleware::{init_tracing, CorrelationIdMiddleware, RateLimitMiddleware};
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use auth_service::services::HttpCredentialDirectory;
use auth_service::{Config, LoginService};
use crypto_core::jwt::TokenIssuer;
use tracing_actix_web::TracingLogger;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing("auth_service", config.log_format);

    // No key, no service: refuse to start rather than issue unsigned tokens.
    let keys = Arc::new(
        config
            .load_key_store()
            .map_err(|e| {
                tracing::error!(error = %e, "signing key unavailable");
                e
            })
            .context("Failed to load signing key")?,
    );
    tracing::info!(kid = %keys.kid(), ttl_secs = ?config.token_ttl_secs, "signing key loaded");

    let jwks = web::Data::new(keys.public_key_set());
    let issuer = Arc::new(TokenIssuer::new(keys).with_ttl(config.token_ttl()));

    let directory = HttpCredentialDirectory::new(
        config.student_service_url.clone(),
        config.professor_service_url.clone(),
        issuer.clone(),
        config.service_token_ttl(),
        config.outbound_timeout(),
    )
    .context("Failed to build directory client")?;

    let login = web::Data::new(LoginService::new(Arc::new(directory), issuer));
    let limiter = RateLimitMiddleware::new(config.rate_limit());

    let bind_address = config.bind_address();
    tracing::info!("Starting auth service on {}", bind_address);

    HttpServer::new(move || {
        let limiter = limiter.clone();
        App::new()
            .app_data(login.clone())
            .app_data(jwks.clone())
            .wrap(CorrelationIdMiddleware)
            .wrap(TracingLogger::default())
            .configure(|cfg| auth_service::configure(cfg, limiter))
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {bind_address}"))?
    .run()
    .await
    .context("Server error")
}

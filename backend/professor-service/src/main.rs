/// Professor Service - HTTP Server
use std::sync::Arc;

use actix_middleware::{init_tracing, CorrelationIdMiddleware};
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use professor_service::{AppState, Config, InMemoryProfessorRepository};
use tracing_actix_web::TracingLogger;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing("professor_service", config.log_format);

    let verifier = Arc::new(
        config
            .token_verifier()
            .context("Failed to build token verifier")?,
    );
    let students = Arc::new(
        config
            .student_client()
            .context("Failed to build student service client")?,
    );
    tracing::info!(
        jwks_url = %config.jwks_url,
        student_service_url = %config.student_service_url,
        "upstreams configured"
    );

    let state = web::Data::new(AppState::new(
        Arc::new(InMemoryProfessorRepository::new()),
        students,
    ));

    let bind_address = config.bind_address();
    tracing::info!("Starting professor service on {}", bind_address);

    HttpServer::new(move || {
        let verifier = verifier.clone();
        App::new()
            .app_data(state.clone())
            .wrap(CorrelationIdMiddleware)
            .wrap(TracingLogger::default())
            .configure(|cfg| professor_service::configure(cfg, verifier))
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {bind_address}"))?
    .run()
    .await
    .context("Server error")
}

// Auth Service Library
//
// Owns the signing key. Serves the public half as a JWKS document and issues
// tokens to students and professors whose credentials check out against the
// owning service's records.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

use actix_middleware::RateLimitMiddleware;
use actix_web::web;
use crypto_core::jwks::JWKS_PATH;

pub use config::Config;
pub use error::{AuthError, Result};
pub use services::LoginService;

/// Reject unreadable login bodies with the same 400 as missing fields.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(16 * 1024)
        .error_handler(|err, _req| {
            tracing::debug!(error = %err, "unreadable login body");
            AuthError::MissingCredentials.into()
        })
}

/// Register routes. Expects `web::Data<LoginService>` and
/// `web::Data<JwksDocument>` in app data; `limiter` is shared by all workers.
pub fn configure(cfg: &mut web::ServiceConfig, limiter: RateLimitMiddleware) {
    cfg.route("/health", web::get().to(handlers::health))
        .route(JWKS_PATH, web::get().to(handlers::get_jwks))
        .service(
            web::scope("/api/login")
                .app_data(json_config())
                .wrap(limiter)
                .route("/student", web::post().to(handlers::login_student))
                .route("/professor", web::post().to(handlers::login_professor)),
        );
}

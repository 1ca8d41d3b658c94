// Professor Service Library
//
// Owns professor records and lets professors read student profiles through
// the student service under their own identity.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod services;

use std::sync::Arc;

use actix_middleware::{OwnershipGuard, OwnershipPolicy, RequireRoles};
use actix_web::web;
use crypto_core::jwt::{Role, RoleSet, TokenVerifier};

pub use config::Config;
pub use error::{AppError, Result};
pub use repository::{InMemoryProfessorRepository, ProfessorRepository, RepositoryError};
pub use services::{StudentClient, UpstreamError};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub professors: Arc<dyn ProfessorRepository>,
    pub students: Arc<StudentClient>,
}

impl AppState {
    pub fn new(professors: Arc<dyn ProfessorRepository>, students: Arc<StudentClient>) -> Self {
        Self {
            professors,
            students,
        }
    }
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(256 * 1024)
        .error_handler(|err, _req| AppError::InvalidRequest(err.to_string()).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::InvalidRequest(err.to_string()).into())
}

/// Professors may edit only themselves; admins anyone.
fn self_edit_policy() -> OwnershipPolicy {
    OwnershipPolicy {
        bypass: RoleSet::from([Role::Admin]),
        restricted: RoleSet::from([Role::Professor]),
    }
}

/// Register routes. Expects `web::Data<AppState>` in app data.
pub fn configure(cfg: &mut web::ServiceConfig, verifier: Arc<TokenVerifier>) {
    let require = |roles: RoleSet| RequireRoles::new(verifier.clone(), roles);

    let professors_only = RoleSet::from([Role::Professor]);
    let can_update = RoleSet::from([Role::Professor, Role::Admin]);
    let admins_only = RoleSet::from([Role::Admin]);

    cfg.route("/health", web::get().to(handlers::health))
        .service(
            web::scope("/api/professors")
                .app_data(json_config())
                .service(
                    web::resource("")
                        .route(web::post().to(handlers::create_professors))
                        .route(web::get().to(handlers::list_professors)),
                )
                // Registered before "/{professor_id}" so the literal segment wins.
                .service(
                    web::resource("/studentProfiles")
                        .wrap(require(professors_only.clone()))
                        .route(web::get().to(handlers::list_student_profiles)),
                )
                .service(
                    web::resource("/studentProfiles/{student_id}")
                        .wrap(require(professors_only))
                        .route(web::get().to(handlers::get_student_profile)),
                )
                .service(
                    web::resource("/{professor_id}")
                        .route(web::get().to(handlers::get_professor))
                        .route(
                            web::put()
                                .to(handlers::update_professor)
                                .wrap(OwnershipGuard::with_policy(
                                    "professor_id",
                                    self_edit_policy(),
                                ))
                                .wrap(require(can_update)),
                        )
                        .route(
                            web::delete()
                                .to(handlers::delete_professor)
                                .wrap(require(admins_only)),
                        ),
                ),
        )
        .service(
            web::scope("/internal/professors")
                .app_data(query_config())
                .wrap(require(RoleSet::from([Role::AuthService])))
                .route("/credentials", web::get().to(handlers::get_credentials)),
        );
}

// Student Service Library
//
// Owns student records. Everything except account creation sits behind the
// role gate; students are further held to their own record.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;

use std::sync::Arc;

use actix_middleware::{OwnershipGuard, RequireRoles};
use actix_web::web;
use crypto_core::jwt::{Role, RoleSet, TokenVerifier};

pub use config::Config;
pub use error::{AppError, Result};
pub use repository::{InMemoryStudentRepository, RepositoryError, StudentRepository};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub students: Arc<dyn StudentRepository>,
}

impl AppState {
    pub fn new(students: Arc<dyn StudentRepository>) -> Self {
        Self { students }
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

/// Register routes. Expects `web::Data<AppState>` in app data.
pub fn configure(cfg: &mut web::ServiceConfig, verifier: Arc<TokenVerifier>) {
    let require = |roles: RoleSet| RequireRoles::new(verifier.clone(), roles);

    let can_list = RoleSet::from([Role::Professor, Role::Admin, Role::AuthService]);
    let can_view = RoleSet::from([Role::Student, Role::Professor]);
    let can_update = RoleSet::from([Role::Student, Role::Professor, Role::Admin]);
    let can_delete = RoleSet::from([Role::Professor, Role::Admin]);

    cfg.route("/health", web::get().to(handlers::health))
        .service(
            web::scope("/api/students")
                .app_data(json_config())
                .service(
                    web::resource("")
                        .route(web::post().to(handlers::create_students))
                        .route(
                            web::get()
                                .to(handlers::list_students)
                                .wrap(require(can_list)),
                        ),
                )
                .service(
                    web::resource("/{student_id}")
                        .route(
                            web::get()
                                .to(handlers::get_student)
                                .wrap(OwnershipGuard::new("student_id"))
                                .wrap(require(can_view)),
                        )
                        .route(
                            web::put()
                                .to(handlers::update_student)
                                .wrap(OwnershipGuard::new("student_id"))
                                .wrap(require(can_update)),
                        )
                        .route(
                            web::delete()
                                .to(handlers::delete_student)
                                .wrap(require(can_delete)),
                        ),
                ),
        )
        .service(
            web::scope("/internal/students")
                .app_data(query_config())
                .wrap(require(RoleSet::from([Role::AuthService])))
                .route("/credentials", web::get().to(handlers::get_credentials)),
        );
}

/// Credential lookup for the auth service
use actix_web::{web, HttpResponse};
use tracing::debug;

use crate::error::{AppError, Result};
use crate::models::{normalize_email, CredentialQuery};
use crate::AppState;

/// GET /internal/professors/credentials?email=
///
/// 404 when no professor has the email; the auth service turns that into a
/// failed login.
pub async fn get_credentials(
    state: web::Data<AppState>,
    query: web::Query<CredentialQuery>,
) -> Result<HttpResponse> {
    let email = normalize_email(&query.email);
    match state.professors.find_by_email(&email).await? {
        Some(record) => Ok(HttpResponse::Ok().json(record.credentials())),
        None => {
            debug!("credential lookup for unknown email");
            Err(AppError::NotFound)
        }
    }
}

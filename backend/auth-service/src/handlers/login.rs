/// Login handlers
use actix_middleware::CorrelationId;
use actix_web::{web, HttpResponse};

use crate::error::AuthError;
use crate::models::{AccountKind, LoginRequest};
use crate::services::LoginService;

/// POST /api/login/student
pub async fn login_student(
    service: web::Data<LoginService>,
    correlation_id: CorrelationId,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, AuthError> {
    login(AccountKind::Student, &service, &correlation_id, &payload).await
}

/// POST /api/login/professor
pub async fn login_professor(
    service: web::Data<LoginService>,
    correlation_id: CorrelationId,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, AuthError> {
    login(AccountKind::Professor, &service, &correlation_id, &payload).await
}

async fn login(
    kind: AccountKind,
    service: &LoginService,
    correlation_id: &CorrelationId,
    payload: &LoginRequest,
) -> Result<HttpResponse, AuthError> {
    let (email, password) = payload.credentials().ok_or(AuthError::MissingCredentials)?;

    let response = service
        .login(kind, email, password, Some(correlation_id.as_str()))
        .await?;

    Ok(HttpResponse::Ok().json(response))
}

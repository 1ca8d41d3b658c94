/// Professor CRUD handlers
use std::collections::HashSet;

use actix_middleware::Authenticated;
use actix_web::{web, HttpResponse};
use crypto_core::{password, PasswordError};
use tracing::{info, warn};
use validator::Validate;

use super::parse_id;
use crate::error::{AppError, Result};
use crate::models::{
    CreateProfessorRequest, CreatedProfessors, DeletedProfessor, NewProfessor, OneOrMany,
    Professor, ProfessorChanges, UpdateProfessorRequest, UpdatedProfessor,
};
use crate::AppState;

async fn hash_on_blocking_pool<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> std::result::Result<T, PasswordError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))?
        .map_err(AppError::from)
}

/// POST /api/professors
pub async fn create_professors(
    state: web::Data<AppState>,
    payload: web::Json<OneOrMany<CreateProfessorRequest>>,
) -> Result<HttpResponse> {
    let requests: Vec<CreateProfessorRequest> = payload
        .into_inner()
        .into_vec()
        .into_iter()
        .map(CreateProfessorRequest::normalized)
        .collect();

    if requests.is_empty() {
        return Err(AppError::Validation("All fields are required".into()));
    }
    for request in &requests {
        request.validate()?;
    }

    {
        let mut emails = HashSet::new();
        let mut phones = HashSet::new();
        for r in &requests {
            if !emails.insert(r.email.as_str())
                || !phones.insert(r.phone.as_str())
                || state
                    .professors
                    .contact_taken(Some(&r.email), Some(&r.phone), None)
                    .await?
            {
                warn!("professor create with duplicate email or phone");
                return Err(AppError::Duplicate);
            }
        }
    }

    let new_professors = hash_on_blocking_pool(move || {
        requests
            .into_iter()
            .map(|r| {
                Ok(NewProfessor {
                    password_hash: password::hash_password(&r.password)?,
                    name: r.name,
                    email: r.email,
                    phone: r.phone,
                })
            })
            .collect()
    })
    .await?;

    let created = state.professors.create_many(new_professors).await?;
    info!(count = created.len(), "professors created");

    Ok(HttpResponse::Created().json(CreatedProfessors {
        message: "Professor created successfully".into(),
        saved_professor: created.iter().map(|r| r.public_view()).collect(),
    }))
}

/// GET /api/professors
pub async fn list_professors(state: web::Data<AppState>) -> Result<HttpResponse> {
    let professors: Vec<Professor> = state
        .professors
        .list()
        .await?
        .iter()
        .map(|r| r.public_view())
        .collect();
    Ok(HttpResponse::Ok().json(professors))
}

/// GET /api/professors/{professor_id}
pub async fn get_professor(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let professor_id = parse_id(&path).ok_or(AppError::NotFound)?;
    let record = state
        .professors
        .find(professor_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(record.public_view()))
}

/// PUT /api/professors/{professor_id}
///
/// A new password is re-hashed before it is stored.
pub async fn update_professor(
    state: web::Data<AppState>,
    caller: Authenticated,
    path: web::Path<String>,
    payload: web::Json<UpdateProfessorRequest>,
) -> Result<HttpResponse> {
    let professor_id = parse_id(&path).ok_or(AppError::NotFound)?;
    let request = payload.into_inner().normalized();
    request.validate()?;

    let password_hash = match request.password {
        Some(plain) => Some(hash_on_blocking_pool(move || password::hash_password(&plain)).await?),
        None => None,
    };
    let changes = ProfessorChanges {
        name: request.name,
        email: request.email,
        phone: request.phone,
        password_hash,
    };

    let record = state
        .professors
        .update(professor_id, changes)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(professor_id, updated_by = caller.id, "professor updated");

    Ok(HttpResponse::Ok().json(UpdatedProfessor {
        message: "Professor updated successfully".into(),
        professor: record.public_view(),
    }))
}

/// DELETE /api/professors/{professor_id}
pub async fn delete_professor(
    state: web::Data<AppState>,
    caller: Authenticated,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let professor_id = parse_id(&path).ok_or(AppError::NotFound)?;
    let record = state
        .professors
        .delete(professor_id)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(professor_id, deleted_by = caller.id, "professor deleted");

    Ok(HttpResponse::Ok().json(DeletedProfessor {
        message: "Professor deleted successfully".into(),
        deleted_professor: record.public_view(),
    }))
}

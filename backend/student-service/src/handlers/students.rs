/// Student CRUD handlers
///
/// Role and ownership checks run in middleware before these handlers; see
/// `crate::configure`.
use std::collections::HashSet;

use actix_middleware::Authenticated;
use actix_web::{web, HttpResponse};
use crypto_core::password;
use tracing::{info, warn};
use validator::Validate;

use super::parse_student_id;
use crate::error::{AppError, Result};
use crate::models::{
    CreateStudentRequest, NewStudent, OneOrMany, Student, StudentMessage, UpdateStudentRequest,
};
use crate::AppState;

/// POST /api/students
///
/// Accepts one student or an array. Either every student is created or none.
pub async fn create_students(
    state: web::Data<AppState>,
    payload: web::Json<OneOrMany<CreateStudentRequest>>,
) -> Result<HttpResponse> {
    let requests: Vec<CreateStudentRequest> = payload
        .into_inner()
        .into_vec()
        .into_iter()
        .map(CreateStudentRequest::normalized)
        .collect();

    if requests.is_empty() {
        return Err(AppError::Validation("All credentials are required".into()));
    }
    for request in &requests {
        request.validate()?;
    }

    // Reject duplicates before paying for any hashing.
    {
        let mut seen = HashSet::new();
        for request in &requests {
            if !seen.insert(request.email.as_str())
                || state.students.find_by_email(&request.email).await?.is_some()
            {
                warn!("student create with duplicate email");
                return Err(AppError::DuplicateEmail);
            }
        }
    }

    let new_students = tokio::task::spawn_blocking(move || {
        requests
            .into_iter()
            .map(|r| {
                Ok(NewStudent {
                    password_hash: password::hash_password(&r.password)?,
                    name: r.name,
                    email: r.email,
                })
            })
            .collect::<std::result::Result<Vec<_>, crypto_core::PasswordError>>()
    })
    .await
    .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))??;

    let created = state.students.create_many(new_students).await?;
    info!(count = created.len(), "students created");

    let body: Vec<Student> = created.iter().map(|r| r.public_view()).collect();
    Ok(HttpResponse::Created().json(body))
}

/// GET /api/students
pub async fn list_students(state: web::Data<AppState>) -> Result<HttpResponse> {
    let students: Vec<Student> = state
        .students
        .list()
        .await?
        .iter()
        .map(|r| r.public_view())
        .collect();
    Ok(HttpResponse::Ok().json(students))
}

/// GET /api/students/{student_id}
pub async fn get_student(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let student_id = parse_student_id(&path).ok_or(AppError::NotFound)?;
    let record = state
        .students
        .find(student_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(record.public_view()))
}

/// PUT /api/students/{student_id}
pub async fn update_student(
    state: web::Data<AppState>,
    caller: Authenticated,
    path: web::Path<String>,
    payload: web::Json<UpdateStudentRequest>,
) -> Result<HttpResponse> {
    let student_id = parse_student_id(&path).ok_or(AppError::NotFound)?;
    let request = payload.into_inner().normalized();
    request.validate()?;

    let record = state
        .students
        .update(student_id, request.into_changes())
        .await?
        .ok_or(AppError::NotFound)?;
    info!(student_id, updated_by = caller.id, "student updated");

    Ok(HttpResponse::Ok().json(StudentMessage {
        message: "Student updated successfully".into(),
        data: record.public_view(),
    }))
}

/// DELETE /api/students/{student_id}
pub async fn delete_student(
    state: web::Data<AppState>,
    caller: Authenticated,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let student_id = parse_student_id(&path).ok_or(AppError::NotFound)?;
    let record = state
        .students
        .delete(student_id)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(student_id, deleted_by = caller.id, "student deleted");

    Ok(HttpResponse::Ok().json(StudentMessage {
        message: "Student deleted successfully".into(),
        data: record.public_view(),
    }))
}

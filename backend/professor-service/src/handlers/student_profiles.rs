/// Student profiles, fetched from the student service as the calling professor
use actix_middleware::ForwardedAuth;
use actix_web::{web, HttpResponse};

use crate::error::{AppError, Result};
use crate::models::{StudentProfile, StudentProfiles};
use crate::AppState;

/// GET /api/professors/studentProfiles
pub async fn list_student_profiles(
    state: web::Data<AppState>,
    auth: ForwardedAuth,
) -> Result<HttpResponse> {
    let students = state.students.list_students(&auth).await?;

    Ok(HttpResponse::Ok().json(StudentProfiles {
        message: "Student profiles fetched successfully".into(),
        all_students: students,
    }))
}

/// GET /api/professors/studentProfiles/{student_id}
pub async fn get_student_profile(
    state: web::Data<AppState>,
    auth: ForwardedAuth,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let student_id = super::parse_id(&path)
        .ok_or_else(|| AppError::InvalidRequest("student_id must be a number".into()))?;
    let student = state.students.get_student(student_id, &auth).await?;

    Ok(HttpResponse::Ok().json(StudentProfile {
        message: "Student data fetched successfully".into(),
        student_data: student,
    }))
}

pub mod internal;
pub mod students;

use actix_web::HttpResponse;
use serde_json::json;

pub use internal::get_credentials;
pub use students::{create_students, delete_student, get_student, list_students, update_student};

/// GET /health
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

/// Path ids that do not parse cannot name a stored student.
pub(crate) fn parse_student_id(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

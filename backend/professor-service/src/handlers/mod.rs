pub mod internal;
pub mod professors;
pub mod student_profiles;

use actix_web::HttpResponse;
use serde_json::json;

pub use internal::get_credentials;
pub use professors::{
    create_professors, delete_professor, get_professor, list_professors, update_professor,
};
pub use student_profiles::{get_student_profile, list_student_profiles};

/// GET /health
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

pub(crate) fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

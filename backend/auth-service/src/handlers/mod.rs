pub mod jwks;
pub mod login;

pub use jwks::get_jwks;
pub use login::{login_professor, login_student};

use actix_web::HttpResponse;

/// GET /health
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

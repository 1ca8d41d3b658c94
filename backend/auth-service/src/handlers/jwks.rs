/// JWKS (JSON Web Key Set) endpoint for JWT public key distribution
/// Lets the other services verify signatures without holding the private key
use actix_web::{http::header, web, HttpResponse};
use crypto_core::JwksDocument;

/// GET /.well-known/jwks.json
///
/// The document is computed once at startup; the key never changes while the
/// process runs.
pub async fn get_jwks(jwks: web::Data<JwksDocument>) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((header::CACHE_CONTROL, "public, max-age=300"))
        .json(jwks.get_ref())
}

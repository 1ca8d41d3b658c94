//! Professor -> student forwarding against a real student service listening
//! on a local port. Both services trust the same in-memory key set.

use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::time::Duration;

use actix_middleware::{CorrelationIdMiddleware, CORRELATION_ID_HEADER};
use actix_web::{http::StatusCode, test, web, App, HttpServer};
use crypto_core::jwt::{Role, RoleSet, TokenIssuer, TokenVerifier};
use crypto_core::test_utils::{test_key_store, StaticJwksSource};
use crypto_core::JwksClient;
use professor_service::{AppState, InMemoryProfessorRepository, StudentClient};
use serde_json::Value;
use student_service::models::NewStudent;
use student_service::{InMemoryStudentRepository, StudentRepository};

fn verifier(issuer: &TokenIssuer) -> Arc<TokenVerifier> {
    let source = Arc::new(StaticJwksSource::new(issuer.key_store().public_key_set()));
    Arc::new(TokenVerifier::new(Arc::new(JwksClient::new(source))))
}

/// Start the student service with students 1 and 2 and return its address.
async fn start_student_service(issuer: &TokenIssuer, require_expiry: bool) -> SocketAddr {
    let repo = InMemoryStudentRepository::new();
    repo.create_many(
        ["ada", "alan"]
            .into_iter()
            .map(|name| NewStudent {
                name: name.into(),
                email: format!("{name}@campus.edu"),
                password_hash: "$argon2id$fixture".into(),
            })
            .collect(),
    )
    .await
    .unwrap();

    let state = web::Data::new(student_service::AppState::new(Arc::new(repo)));
    let source = Arc::new(StaticJwksSource::new(issuer.key_store().public_key_set()));
    let verifier = Arc::new(
        TokenVerifier::new(Arc::new(JwksClient::new(source))).require_expiry(require_expiry),
    );

    let server = HttpServer::new(move || {
        let verifier = verifier.clone();
        App::new()
            .app_data(state.clone())
            .wrap(CorrelationIdMiddleware)
            .configure(|cfg| student_service::configure(cfg, verifier))
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();

    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    addr
}

fn professor_state(student_url: String, timeout: Duration) -> web::Data<AppState> {
    let students = Arc::new(StudentClient::new(student_url, timeout).unwrap());
    web::Data::new(AppState::new(
        Arc::new(InMemoryProfessorRepository::new()),
        students,
    ))
}

fn bearer(issuer: &TokenIssuer, id: i64, roles: impl Into<RoleSet>) -> (&'static str, String) {
    let token = issuer.issue(id, roles.into()).unwrap();
    ("Authorization", format!("Bearer {token}"))
}

macro_rules! professor_app {
    ($state:expr, $verifier:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .wrap(CorrelationIdMiddleware)
                .configure(|cfg| professor_service::configure(cfg, $verifier.clone())),
        )
        .await
    };
}

#[actix_web::test]
async fn test_professor_reads_student_profiles_with_own_token() {
    let issuer = TokenIssuer::new(Arc::new(test_key_store()));
    let addr = start_student_service(&issuer, false).await;

    let state = professor_state(format!("http://{addr}"), Duration::from_secs(5));
    let verifier = verifier(&issuer);
    let app = professor_app!(state, verifier);

    let req = test::TestRequest::get()
        .uri("/api/professors/studentProfiles")
        .insert_header(bearer(&issuer, 7, [Role::Professor]))
        .insert_header((CORRELATION_ID_HEADER, "prof-list-1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Student profiles fetched successfully");
    assert_eq!(body["allStudents"].as_array().unwrap().len(), 2);

    let req = test::TestRequest::get()
        .uri("/api/professors/studentProfiles/2")
        .insert_header(bearer(&issuer, 7, [Role::Professor]))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["message"], "Student data fetched successfully");
    assert_eq!(body["studentData"]["name"], "alan");
}

#[actix_web::test]
async fn test_upstream_rejections_pass_through() {
    let issuer = TokenIssuer::new(Arc::new(test_key_store()));
    let addr = start_student_service(&issuer, false).await;

    let state = professor_state(format!("http://{addr}"), Duration::from_secs(5));
    let verifier = verifier(&issuer);
    let app = professor_app!(state, verifier);

    let missing = test::TestRequest::get()
        .uri("/api/professors/studentProfiles/404")
        .insert_header(bearer(&issuer, 7, [Role::Professor]))
        .to_request();
    let resp = test::call_service(&app, missing).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "STUDENT_NOT_FOUND");

    let student = test::TestRequest::get()
        .uri("/api/professors/studentProfiles")
        .insert_header(bearer(&issuer, 1, [Role::Student]))
        .to_request();
    assert_eq!(test::call_service(&app, student).await.status(), StatusCode::FORBIDDEN);

    let bad_id = test::TestRequest::get()
        .uri("/api/professors/studentProfiles/abc")
        .insert_header(bearer(&issuer, 7, [Role::Professor]))
        .to_request();
    assert_eq!(test::call_service(&app, bad_id).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_upstream_unauthorized_passes_through() {
    let issuer = TokenIssuer::new(Arc::new(test_key_store()));
    // The student service insists on `exp`; the professor service does not.
    let addr = start_student_service(&issuer, true).await;

    let state = professor_state(format!("http://{addr}"), Duration::from_secs(5));
    let verifier = verifier(&issuer);
    let app = professor_app!(state, verifier);

    let req = test::TestRequest::get()
        .uri("/api/professors/studentProfiles")
        .insert_header(bearer(&issuer, 7, [Role::Professor]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "TOKEN_INVALID");
}

#[actix_web::test]
async fn test_unreachable_student_service_is_bad_gateway() {
    let issuer = TokenIssuer::new(Arc::new(test_key_store()));

    // Reserve a port, then free it so nothing is listening.
    let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();

    let state = professor_state(format!("http://127.0.0.1:{port}"), Duration::from_secs(2));
    let verifier = verifier(&issuer);
    let app = professor_app!(state, verifier);

    let req = test::TestRequest::get()
        .uri("/api/professors/studentProfiles")
        .insert_header(bearer(&issuer, 7, [Role::Professor]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "UPSTREAM_FAILED");
}

#[actix_web::test]
async fn test_silent_student_service_times_out() {
    let issuer = TokenIssuer::new(Arc::new(test_key_store()));

    // Accepts connections (via the backlog) but never answers.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let state = professor_state(format!("http://{addr}"), Duration::from_millis(300));
    let verifier = verifier(&issuer);
    let app = professor_app!(state, verifier);

    let req = test::TestRequest::get()
        .uri("/api/professors/studentProfiles")
        .insert_header(bearer(&issuer, 7, [Role::Professor]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "UPSTREAM_TIMEOUT");

    drop(listener);
}

//! Student API behind the real role gate, with tokens signed by the fixture
//! key and verified through an in-memory key set.

use std::sync::Arc;

use actix_middleware::CorrelationIdMiddleware;
use actix_web::{http::StatusCode, test, web, App};
use crypto_core::jwt::{Role, RoleSet, TokenIssuer, TokenVerifier};
use crypto_core::test_utils::{test_key_store, StaticJwksSource};
use crypto_core::JwksClient;
use serde_json::{json, Value};
use student_service::models::NewStudent;
use student_service::{AppState, InMemoryStudentRepository, StudentRepository};

struct Harness {
    issuer: TokenIssuer,
    verifier: Arc<TokenVerifier>,
    state: web::Data<AppState>,
}

/// Seeds students 1 (Ada) and 2 (Alan).
async fn harness() -> Harness {
    let keys = Arc::new(test_key_store());
    let source = Arc::new(StaticJwksSource::new(keys.public_key_set()));
    let verifier = Arc::new(TokenVerifier::new(Arc::new(JwksClient::new(source))));

    let repo = InMemoryStudentRepository::new();
    repo.create_many(vec![
        NewStudent {
            name: "Ada".into(),
            email: "ada@campus.edu".into(),
            password_hash: "$argon2id$fixture".into(),
        },
        NewStudent {
            name: "Alan".into(),
            email: "alan@campus.edu".into(),
            password_hash: "$argon2id$fixture".into(),
        },
    ])
    .await
    .unwrap();

    Harness {
        issuer: TokenIssuer::new(keys),
        verifier,
        state: web::Data::new(AppState::new(Arc::new(repo))),
    }
}

impl Harness {
    fn bearer(&self, id: i64, roles: impl Into<RoleSet>) -> (&'static str, String) {
        let token = self.issuer.issue(id, roles.into()).unwrap();
        ("Authorization", format!("Bearer {token}"))
    }
}

macro_rules! app {
    ($h:expr) => {
        test::init_service(
            App::new()
                .app_data($h.state.clone())
                .wrap(CorrelationIdMiddleware)
                .configure(|cfg| student_service::configure(cfg, $h.verifier.clone())),
        )
        .await
    };
}

#[actix_web::test]
async fn test_create_single_student_without_token() {
    let h = harness().await;
    let app = app!(h);

    let req = test::TestRequest::post()
        .uri("/api/students")
        .set_json(json!({"name": " Grace ", "email": "Grace@Campus.edu", "password": "hopper1"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body[0]["student_id"], 3);
    assert_eq!(body[0]["name"], "Grace");
    assert_eq!(body[0]["email"], "grace@campus.edu");
    assert!(body[0].get("password").is_none());

    let stored = h.state.students.find(3).await.unwrap().unwrap();
    assert!(stored.password_hash.starts_with("$argon2id$"));
}

#[actix_web::test]
async fn test_create_rejects_duplicates_and_invalid_bodies() {
    let h = harness().await;
    let app = app!(h);

    let duplicate = test::TestRequest::post()
        .uri("/api/students")
        .set_json(json!([
            {"name": "New", "email": "new@campus.edu", "password": "secret"},
            {"name": "Ada again", "email": "ADA@campus.edu", "password": "secret"}
        ]))
        .to_request();
    let resp = test::call_service(&app, duplicate).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "DUPLICATE_RECORD");
    assert!(h.state.students.find_by_email("new@campus.edu").await.unwrap().is_none());

    for payload in [
        json!([]),
        json!({"name": "No Email", "password": "secret"}),
        json!({"name": "Bad", "email": "not-an-email", "password": "secret"}),
        json!({"name": "Short", "email": "s@campus.edu", "password": "12345"}),
        json!(42),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/students")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{payload}");
    }
}

#[actix_web::test]
async fn test_list_requires_elevated_role() {
    let h = harness().await;
    let app = app!(h);

    let anonymous = test::TestRequest::get().uri("/api/students").to_request();
    assert_eq!(test::call_service(&app, anonymous).await.status(), StatusCode::UNAUTHORIZED);

    let student = test::TestRequest::get()
        .uri("/api/students")
        .insert_header(h.bearer(1, [Role::Student]))
        .to_request();
    let resp = test::call_service(&app, student).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "ACCESS_DENIED");

    for role in [Role::Professor, Role::Admin, Role::AuthService] {
        let req = test::TestRequest::get()
            .uri("/api/students")
            .insert_header(h.bearer(50, [role]))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().unwrap().len(), 2, "{role}");
    }
}

#[actix_web::test]
async fn test_student_sees_only_own_record() {
    let h = harness().await;
    let app = app!(h);

    let own = test::TestRequest::get()
        .uri("/api/students/1")
        .insert_header(h.bearer(1, [Role::Student]))
        .to_request();
    let resp = test::call_service(&app, own).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["name"], "Ada");

    let other = test::TestRequest::get()
        .uri("/api/students/2")
        .insert_header(h.bearer(1, [Role::Student]))
        .to_request();
    let resp = test::call_service(&app, other).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "NOT_RESOURCE_OWNER");

    let professor = test::TestRequest::get()
        .uri("/api/students/2")
        .insert_header(h.bearer(9, [Role::Professor]))
        .to_request();
    assert_eq!(test::call_service(&app, professor).await.status(), StatusCode::OK);

    // Admin is not among the roles allowed to read a single record.
    let admin = test::TestRequest::get()
        .uri("/api/students/2")
        .insert_header(h.bearer(9, [Role::Admin]))
        .to_request();
    assert_eq!(test::call_service(&app, admin).await.status(), StatusCode::FORBIDDEN);

    let missing = test::TestRequest::get()
        .uri("/api/students/404")
        .insert_header(h.bearer(9, [Role::Professor]))
        .to_request();
    let resp = test::call_service(&app, missing).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "STUDENT_NOT_FOUND");
}

#[actix_web::test]
async fn test_update_respects_ownership() {
    let h = harness().await;
    let app = app!(h);

    let own = test::TestRequest::put()
        .uri("/api/students/1")
        .insert_header(h.bearer(1, [Role::Student]))
        .set_json(json!({"name": "Ada Lovelace"}))
        .to_request();
    let resp = test::call_service(&app, own).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Student updated successfully");
    assert_eq!(body["data"]["name"], "Ada Lovelace");
    assert_eq!(body["data"]["email"], "ada@campus.edu");

    let other = test::TestRequest::put()
        .uri("/api/students/2")
        .insert_header(h.bearer(1, [Role::Student]))
        .set_json(json!({"name": "Hacked"}))
        .to_request();
    assert_eq!(test::call_service(&app, other).await.status(), StatusCode::FORBIDDEN);
    assert_eq!(h.state.students.find(2).await.unwrap().unwrap().name, "Alan");

    let admin = test::TestRequest::put()
        .uri("/api/students/2")
        .insert_header(h.bearer(100, [Role::Admin]))
        .set_json(json!({"email": "ALAN.T@campus.edu"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, admin).await;
    assert_eq!(body["data"]["email"], "alan.t@campus.edu");

    let taken = test::TestRequest::put()
        .uri("/api/students/2")
        .insert_header(h.bearer(100, [Role::Admin]))
        .set_json(json!({"email": "ada@campus.edu"}))
        .to_request();
    assert_eq!(test::call_service(&app, taken).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_delete_requires_professor_or_admin() {
    let h = harness().await;
    let app = app!(h);

    let student = test::TestRequest::delete()
        .uri("/api/students/1")
        .insert_header(h.bearer(1, [Role::Student]))
        .to_request();
    assert_eq!(test::call_service(&app, student).await.status(), StatusCode::FORBIDDEN);

    let professor = || {
        test::TestRequest::delete()
            .uri("/api/students/1")
            .insert_header(h.bearer(9, [Role::Professor]))
            .to_request()
    };
    let resp = test::call_service(&app, professor()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Student deleted successfully");
    assert_eq!(body["data"]["student_id"], 1);

    assert_eq!(test::call_service(&app, professor()).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_credentials_endpoint_is_for_auth_service_only() {
    let h = harness().await;
    let app = app!(h);

    let service = test::TestRequest::get()
        .uri("/internal/students/credentials?email=ADA%40campus.edu")
        .insert_header(h.bearer(0, [Role::AuthService]))
        .to_request();
    let resp = test::call_service(&app, service).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["id"], 1);
    assert_eq!(body["passwordHash"], "$argon2id$fixture");

    let professor = test::TestRequest::get()
        .uri("/internal/students/credentials?email=ada%40campus.edu")
        .insert_header(h.bearer(9, [Role::Professor]))
        .to_request();
    assert_eq!(test::call_service(&app, professor).await.status(), StatusCode::FORBIDDEN);

    let unknown = test::TestRequest::get()
        .uri("/internal/students/credentials?email=nobody%40campus.edu")
        .insert_header(h.bearer(0, [Role::AuthService]))
        .to_request();
    assert_eq!(test::call_service(&app, unknown).await.status(), StatusCode::NOT_FOUND);

    let no_query = test::TestRequest::get()
        .uri("/internal/students/credentials")
        .insert_header(h.bearer(0, [Role::AuthService]))
        .to_request();
    assert_eq!(test::call_service(&app, no_query).await.status(), StatusCode::BAD_REQUEST);
}

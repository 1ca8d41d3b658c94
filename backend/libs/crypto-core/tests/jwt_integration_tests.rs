/// Integration tests for crypto-core token functionality
///
/// This test module covers:
/// - Issue/verify round trip through the key set
/// - Algorithm confusion (`none`, HS256 signed with the public key)
/// - Tampered bodies and foreign keys
/// - Key cache behaviour under concurrency
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use crypto_core::jwks::JwksClient;
use crypto_core::jwt::{Role, RoleSet, TokenIssuer, TokenVerifier};
use crypto_core::test_utils::{test_key_store, StaticJwksSource, TEST_PUBLIC_KEY};
use crypto_core::{JwksError, VerifyError};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::json;

struct Fixture {
    issuer: TokenIssuer,
    source: Arc<StaticJwksSource>,
    verifier: TokenVerifier,
}

fn fixture() -> Fixture {
    let keys = Arc::new(test_key_store());
    let source = Arc::new(StaticJwksSource::new(keys.public_key_set()));
    let verifier = TokenVerifier::new(Arc::new(JwksClient::new(source.clone())));
    Fixture {
        issuer: TokenIssuer::new(keys),
        source,
        verifier,
    }
}

fn forge(header: serde_json::Value, body: serde_json::Value, signature: &str) -> String {
    format!(
        "{}.{}.{}",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(body.to_string()),
        signature
    )
}

#[tokio::test]
async fn test_student_token_round_trip() {
    let f = fixture();
    let token = f.issuer.issue(1001, RoleSet::from([Role::Student])).unwrap();

    let principal = f.verifier.verify(&token).await.unwrap();
    assert_eq!(principal.id, 1001);
    assert_eq!(principal.roles, RoleSet::from([Role::Student]));
}

#[tokio::test]
async fn test_alg_none_is_rejected() {
    let f = fixture();
    let kid = f.issuer.key_store().kid().to_string();
    let token = forge(
        json!({"alg": "none", "typ": "JWT", "kid": kid}),
        json!({"id": 1, "roles": ["ADMIN"], "iat": 0}),
        "",
    );

    let err = f.verifier.verify(&token).await.unwrap_err();
    assert!(matches!(err, VerifyError::DisallowedAlgorithm(alg) if alg == "none"));
    assert_eq!(f.source.fetch_count(), 0, "no key lookup for a rejected algorithm");
}

#[tokio::test]
async fn test_hs256_signed_with_public_key_is_rejected() {
    let f = fixture();
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(f.issuer.key_store().kid().to_string());
    let token = encode(
        &header,
        &json!({"id": 1, "roles": ["ADMIN"], "iat": 0}),
        &EncodingKey::from_secret(TEST_PUBLIC_KEY.as_bytes()),
    )
    .unwrap();

    let err = f.verifier.verify(&token).await.unwrap_err();
    assert!(matches!(err, VerifyError::DisallowedAlgorithm(alg) if alg == "HS256"));
}

#[tokio::test]
async fn test_tampered_body_is_rejected() {
    let f = fixture();
    let token = f.issuer.issue(7, RoleSet::from([Role::Student])).unwrap();
    let parts: Vec<&str> = token.split('.').collect();

    let escalated = URL_SAFE_NO_PAD.encode(json!({"id": 7, "roles": ["ADMIN"], "iat": 0}).to_string());
    let tampered = format!("{}.{}.{}", parts[0], escalated, parts[2]);

    let err = f.verifier.verify(&tampered).await.unwrap_err();
    assert!(matches!(err, VerifyError::BadSignature));
}

#[tokio::test]
async fn test_unknown_kid_is_rejected() {
    let f = fixture();
    let token = forge(
        json!({"alg": "RS256", "typ": "JWT", "kid": "rotated-out"}),
        json!({"id": 1, "roles": ["STUDENT"], "iat": 0}),
        "c2ln",
    );

    let err = f.verifier.verify(&token).await.unwrap_err();
    assert!(matches!(err, VerifyError::Key(JwksError::KeyNotFound(_))));
}

#[tokio::test]
async fn test_expired_token_within_leeway_is_accepted() {
    let f = fixture();
    let issuer = f.issuer.clone().with_ttl(Some(Duration::from_secs(60)));
    let issued = chrono::Utc::now() - chrono::Duration::seconds(70);
    let token = issuer.issue_at(5, RoleSet::from([Role::Professor]), issued).unwrap();

    // Expired 10s ago, default leeway is 30s.
    assert!(f.verifier.verify(&token).await.is_ok());

    let strict = TokenVerifier::new(Arc::new(JwksClient::new(f.source.clone()))).with_leeway(0);
    assert!(matches!(strict.verify(&token).await.unwrap_err(), VerifyError::Expired));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_verifications_share_one_fetch() {
    let f = fixture();
    let verifier = Arc::new(f.verifier);
    let token = f.issuer.issue(3, RoleSet::from([Role::Admin])).unwrap();

    let mut handles = Vec::new();
    for _ in 0..32 {
        let verifier = verifier.clone();
        let token = token.clone();
        handles.push(tokio::spawn(async move { verifier.verify(&token).await }));
    }
    for handle in handles {
        let principal = handle.await.unwrap().unwrap();
        assert_eq!(principal.id, 3);
    }

    assert_eq!(f.source.fetch_count(), 1);
    assert_eq!(verifier.jwks().cached_key_count(), 1);
}

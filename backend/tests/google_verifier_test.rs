use std::time::Duration;

use chrono::Duration as ChronoDuration;
use google_login_backend::app;
use google_login_backend::auth::{GoogleIdTokenVerifier, IdTokenVerifier, VerifyError};
use google_login_backend::config::GoogleConfig;
use google_login_backend::test_util::keys::{mint_id_token, test_jwks, TestIdToken, TEST_KID};
use google_login_backend::test_util::{create_test_state, TEST_CLIENT_ID};
use axum::body::Body;
use http::{header, Method, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_google() -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "issuer": "https://accounts.google.com",
            "jwks_uri": format!("{}/oauth2/v3/certs", mock_server.uri()),
        })))
        .mount(&mock_server)
        .await;

    mock_server
}

async fn mount_jwks(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/oauth2/v3/certs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn google_config(issuer: &str) -> GoogleConfig {
    GoogleConfig {
        client_ids: vec![TEST_CLIENT_ID.to_string()],
        issuer: format!("{}/", issuer),
        allowed_issuers: vec![
            "accounts.google.com".to_string(),
            "https://accounts.google.com".to_string(),
        ],
    }
}

async fn verifier() -> (MockServer, GoogleIdTokenVerifier) {
    let server = mock_google().await;
    mount_jwks(&server, test_jwks(TEST_KID)).await;
    let verifier = GoogleIdTokenVerifier::new(&google_config(&server.uri())).await.unwrap();
    (server, verifier)
}

#[tokio::test]
async fn test_valid_token_yields_claims() {
    let (_server, verifier) = verifier().await;

    let mut id_token = TestIdToken::new("110169484474386276334", TEST_CLIENT_ID);
    id_token.given_name = Some("Ada".to_string());
    id_token.family_name = Some("Lovelace".to_string());

    let claims = verifier.verify(&mint_id_token(&id_token)).await.unwrap();
    assert_eq!(claims.subject, "110169484474386276334");
    assert_eq!(claims.given_name.as_deref(), Some("Ada"));
    assert_eq!(claims.family_name.as_deref(), Some("Lovelace"));
    assert_eq!(claims.email.as_deref(), Some("110169484474386276334@example.com"));
}

#[tokio::test]
async fn test_short_issuer_form_accepted() {
    let (_server, verifier) = verifier().await;

    let mut id_token = TestIdToken::new("u1", TEST_CLIENT_ID);
    id_token.iss = "accounts.google.com".to_string();

    assert!(verifier.verify(&mint_id_token(&id_token)).await.is_ok());
}

#[tokio::test]
async fn test_wrong_audience_rejected() {
    let (_server, verifier) = verifier().await;

    let id_token = TestIdToken::new("u1", "someone-else.apps.googleusercontent.com");
    let result = verifier.verify(&mint_id_token(&id_token)).await;
    assert!(matches!(result, Err(VerifyError::Invalid(_))));
}

#[tokio::test]
async fn test_wrong_issuer_rejected() {
    let (_server, verifier) = verifier().await;

    let mut id_token = TestIdToken::new("u1", TEST_CLIENT_ID);
    id_token.iss = "https://evil.example.com".to_string();
    let result = verifier.verify(&mint_id_token(&id_token)).await;
    assert!(matches!(result, Err(VerifyError::Invalid(_))));
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let (_server, verifier) = verifier().await;

    let mut id_token = TestIdToken::new("u1", TEST_CLIENT_ID);
    id_token.expires_in = ChronoDuration::hours(-2);
    let result = verifier.verify(&mint_id_token(&id_token)).await;
    assert!(matches!(result, Err(VerifyError::Invalid(_))));
}

#[tokio::test]
async fn test_tampered_signature_rejected() {
    let (_server, verifier) = verifier().await;

    let token = mint_id_token(&TestIdToken::new("u1", TEST_CLIENT_ID));
    let (signed, signature) = token.rsplit_once('.').unwrap();
    let tampered = format!("{}.{}", signed, signature.chars().rev().collect::<String>());

    let result = verifier.verify(&tampered).await;
    assert!(matches!(result, Err(VerifyError::Invalid(_))));
}

#[tokio::test]
async fn test_garbage_token_is_malformed() {
    let (_server, verifier) = verifier().await;

    let result = verifier.verify("not-a-jwt").await;
    assert!(matches!(result, Err(VerifyError::Malformed(_))));
}

#[tokio::test]
async fn test_unknown_kid_rejected() {
    let (_server, verifier) = verifier().await;

    let mut id_token = TestIdToken::new("u1", TEST_CLIENT_ID);
    id_token.kid = "rotated-away".to_string();
    let result = verifier.verify(&mint_id_token(&id_token)).await;
    assert!(matches!(result, Err(VerifyError::KeyNotFound(ref kid)) if kid == "rotated-away"));
}

#[tokio::test]
async fn test_unknown_kid_triggers_key_refresh() {
    let server = mock_google().await;

    // First fetch serves an empty key set, later fetches the real key.
    Mock::given(method("GET"))
        .and(path("/oauth2/v3/certs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "keys": [] })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_jwks(&server, test_jwks(TEST_KID)).await;

    let verifier = GoogleIdTokenVerifier::new(&google_config(&server.uri()))
        .await
        .unwrap()
        .with_min_refresh_interval(Duration::ZERO);

    let token = mint_id_token(&TestIdToken::new("u1", TEST_CLIENT_ID));
    let claims = verifier.verify(&token).await.unwrap();
    assert_eq!(claims.subject, "u1");
}

#[tokio::test]
async fn test_discovery_failure_is_key_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = GoogleIdTokenVerifier::new(&google_config(&server.uri())).await;
    assert!(matches!(result, Err(VerifyError::KeyFetch(_))));
}

#[tokio::test]
async fn test_no_client_ids_rejects_everything() {
    let server = mock_google().await;
    mount_jwks(&server, test_jwks(TEST_KID)).await;
    let mut config = google_config(&server.uri());
    config.client_ids.clear();
    let verifier = GoogleIdTokenVerifier::new(&config).await.unwrap();

    let token = mint_id_token(&TestIdToken::new("u1", TEST_CLIENT_ID));
    assert!(matches!(verifier.verify(&token).await, Err(VerifyError::Invalid(_))));
}

#[tokio::test]
async fn test_end_to_end_login_with_google_verifier() {
    let (_server, verifier) = verifier().await;
    let state = create_test_state(verifier, true);
    let app = app(state.clone());

    let mut id_token = TestIdToken::new("u1", TEST_CLIENT_ID);
    id_token.given_name = Some("Ada".to_string());
    let body = json!({ "idToken": mint_id_token(&id_token) }).to_string();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/google-login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::AUTHORIZATION).is_some());

    let user = state.store.find_user_by_username("u1").unwrap().unwrap();
    assert_eq!(user.first_name.as_deref(), Some("Ada"));
    assert!(user.last_login_at.is_some());
}

#[tokio::test]
async fn test_end_to_end_forged_token_is_bad_credentials() {
    let (_server, verifier) = verifier().await;
    let state = create_test_state(verifier, true);
    let app = app(state.clone());

    let token = mint_id_token(&TestIdToken::new("u1", TEST_CLIENT_ID));
    let (signed, _) = token.rsplit_once('.').unwrap();
    let body = json!({ "idToken": format!("{}.AAAA", signed) }).to_string();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/google-login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(state.store.count_users().unwrap(), 0);
}

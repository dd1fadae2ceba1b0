use axum::{
    extract::FromRequestParts,
    http::{Method, Request, StatusCode, Uri, header, request::Parts},
};
use article_hub::{
    AppState, InMemoryRepository, Messages,
    auth::{AuthUser, bearer_token},
    config::AppConfig,
    error::{AppError, AuthError},
    messages::MessageKey,
    token::TokenIssuer,
};
use chrono::{Duration as ChronoDuration, Utc};
use std::{sync::Arc, time::Duration};

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";
const TEST_USER_ID: i64 = 7;

fn create_app_state(jwt_secret: &str, ttl: Duration) -> AppState {
    let config = AppConfig {
        jwt_secret: jwt_secret.to_string(),
        token_ttl: ttl,
        bcrypt_cost: 4,
        ..AppConfig::default()
    };

    AppState::new(config, Arc::new(InMemoryRepository::new()), Messages::default())
}

/// Helper to get the mutable Parts struct from a generated Request
fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn parts_with_authorization(value: &str) -> Parts {
    let mut parts = get_request_parts(Method::POST, "/articles".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(value).unwrap(),
    );
    parts
}

fn auth_error(result: Result<AuthUser, AppError>) -> AuthError {
    match result {
        Err(AppError::Auth(e)) => e,
        Err(other) => panic!("expected an auth error, got {other:?}"),
        Ok(user) => panic!("expected rejection, got {user:?}"),
    }
}

// --- Tests ---

#[tokio::test]
async fn test_auth_success_with_valid_jwt() {
    let app_state = create_app_state(TEST_JWT_SECRET, Duration::from_secs(900));
    let token = app_state.tokens.issue(TEST_USER_ID).unwrap();

    let mut parts = parts_with_authorization(&format!("Bearer {}", token));
    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(auth_user.unwrap(), AuthUser { id: TEST_USER_ID });
}

#[tokio::test]
async fn test_auth_failure_with_missing_header() {
    let app_state = create_app_state(TEST_JWT_SECRET, Duration::from_secs(900));
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());

    let err = auth_error(AuthUser::from_request_parts(&mut parts, &app_state).await);

    assert_eq!(err, AuthError::Missing);
    let (status, key) = AppError::Auth(err).status_and_key();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(key, MessageKey::MissingToken);
}

#[tokio::test]
async fn test_auth_failure_with_wrong_scheme() {
    let app_state = create_app_state(TEST_JWT_SECRET, Duration::from_secs(900));
    let token = app_state.tokens.issue(TEST_USER_ID).unwrap();

    let mut parts = parts_with_authorization(&format!("Basic {}", token));
    let err = auth_error(AuthUser::from_request_parts(&mut parts, &app_state).await);

    assert_eq!(err, AuthError::Invalid);
}

#[tokio::test]
async fn test_auth_failure_with_garbage_token() {
    let app_state = create_app_state(TEST_JWT_SECRET, Duration::from_secs(900));

    let mut parts = parts_with_authorization("Bearer not.a.jwt");
    let err = auth_error(AuthUser::from_request_parts(&mut parts, &app_state).await);

    assert_eq!(err, AuthError::Invalid);
}

#[tokio::test]
async fn test_auth_failure_with_foreign_signature() {
    let app_state = create_app_state(TEST_JWT_SECRET, Duration::from_secs(900));
    let foreign = TokenIssuer::new(b"some-other-secret", Duration::from_secs(900));
    let token = foreign.issue(TEST_USER_ID).unwrap();

    let mut parts = parts_with_authorization(&format!("Bearer {}", token));
    let err = auth_error(AuthUser::from_request_parts(&mut parts, &app_state).await);

    assert_eq!(err, AuthError::Invalid);
}

#[tokio::test]
async fn test_auth_failure_with_expired_jwt() {
    let app_state = create_app_state(TEST_JWT_SECRET, Duration::from_secs(900));
    // Issued 16 minutes ago with a 15 minute lifetime.
    let token = app_state
        .tokens
        .issue_at(TEST_USER_ID, Utc::now() - ChronoDuration::minutes(16))
        .unwrap();

    let mut parts = parts_with_authorization(&format!("Bearer {}", token));
    let err = auth_error(AuthUser::from_request_parts(&mut parts, &app_state).await);

    assert_eq!(err, AuthError::Expired);
    assert_eq!(
        AppError::Auth(err).status_and_key(),
        (StatusCode::UNAUTHORIZED, MessageKey::ExpiredToken)
    );
}

#[tokio::test]
async fn test_auth_success_just_before_expiry() {
    let app_state = create_app_state(TEST_JWT_SECRET, Duration::from_secs(900));
    // 14 minutes into a 15 minute lifetime.
    let token = app_state
        .tokens
        .issue_at(TEST_USER_ID, Utc::now() - ChronoDuration::minutes(14))
        .unwrap();

    let mut parts = parts_with_authorization(&format!("Bearer {}", token));
    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(auth_user.unwrap().id, TEST_USER_ID);
}

#[tokio::test]
async fn test_auth_reuses_resolved_identity() {
    let app_state = create_app_state(TEST_JWT_SECRET, Duration::from_secs(900));
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    // No header at all: only the identity stored by the guard is available.
    parts.extensions.insert(AuthUser { id: 42 });

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(auth_user.unwrap().id, 42);
}

#[test]
fn test_bearer_token_shapes() {
    let parts = parts_with_authorization("Bearer abc");
    assert_eq!(bearer_token(&parts), Ok("abc"));

    let parts = parts_with_authorization("bearer abc");
    assert_eq!(bearer_token(&parts), Ok("abc"));

    let parts = parts_with_authorization("Bearer");
    assert_eq!(bearer_token(&parts), Err(AuthError::Missing));

    let parts = parts_with_authorization("Bearer abc def");
    assert_eq!(bearer_token(&parts), Err(AuthError::Invalid));

    let parts = parts_with_authorization("   ");
    assert_eq!(bearer_token(&parts), Err(AuthError::Missing));
}

#[test]
fn test_token_verify_round_trip_and_empty() {
    let issuer = TokenIssuer::new(TEST_JWT_SECRET.as_bytes(), Duration::from_secs(60));
    let token = issuer.issue(TEST_USER_ID).unwrap();

    assert_eq!(issuer.verify(&token), Ok(TEST_USER_ID));
    assert_eq!(issuer.verify(""), Err(AuthError::Missing));
    assert_eq!(issuer.ttl(), Duration::from_secs(60));
}

#[test]
fn test_token_with_unbounded_ttl_still_verifies() {
    // Seconds beyond i64 saturate the expiry instead of wrapping into the past.
    let issuer = TokenIssuer::new(TEST_JWT_SECRET.as_bytes(), Duration::from_secs(u64::MAX));
    let token = issuer.issue(TEST_USER_ID).unwrap();

    assert_eq!(issuer.verify(&token), Ok(TEST_USER_ID));
}

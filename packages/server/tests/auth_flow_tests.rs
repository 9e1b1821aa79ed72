//! Integration tests for the Google sign-in flow over HTTP.
//!
//! Tests all critical auth paths:
//! - Consent redirect and callback landing (signup, login, denial, failures)
//! - Session introspection with bearer tokens
//! - Linking-code issuance for signed-in users
//! - Health reporting

mod common;

use axum::http::StatusCode;
use common::{
    body_json, get, get_with_token, location, location_param, post, post_with_token, session_token,
};
use serde_json::json;
use server_core::domains::auth::{Claims, TokenCodec};
use server_core::kernel::test_dependencies::{
    test_user, MockIdentityProvider, MockUserDirectory,
};
use server_core::kernel::TestDependencies;
use server_core::server::build_router;

// ============================================================================
// Consent Flow Tests
// ============================================================================

#[tokio::test]
async fn test_login_redirects_to_consent_screen() {
    let app = build_router(TestDependencies::new().into_deps());

    let response = get(&app, "/auth/google").await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location(&response),
        "https://provider.test/authorize?client_id=mock"
    );
}

#[tokio::test]
async fn test_callback_signs_up_a_new_user() {
    let deps = TestDependencies::new();
    let provider = deps.provider.clone();
    let directory = deps.directory.clone();
    let app = build_router(deps.into_deps());

    let response = get(&app, "/auth/google/callback?code=4%2F0adQt8xyz").await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert!(location(&response).starts_with("https://app.tempo.test/auth/callback?"));
    assert_eq!(location_param(&response, "status").as_deref(), Some("signup"));
    assert!(
        provider.was_exchanged("4/0adQt8xyz"),
        "the code should reach the provider percent-decoded"
    );

    let user = directory
        .user_by_email("ada@example.com")
        .expect("signup should persist the user");
    assert_eq!(
        location_param(&response, "userId").as_deref(),
        Some(user.id.to_string().as_str())
    );

    // The token in the redirect is a session token for that user
    let token = location_param(&response, "token").unwrap();
    let claims = TokenCodec::new("test-secret").verify(&token).unwrap();
    assert_eq!(claims["userId"], json!(user.id));
    assert_eq!(claims["email"], json!("ada@example.com"));
}

#[tokio::test]
async fn test_callback_logs_in_an_existing_user() {
    let existing = test_user("ada@example.com");
    let existing_id = existing.id;
    let deps =
        TestDependencies::new().mock_directory(MockUserDirectory::new().with_user(existing));
    let directory = deps.directory.clone();
    let app = build_router(deps.into_deps());

    let response = get(&app, "/auth/google/callback?code=4%2F0abc").await;

    assert_eq!(location_param(&response, "status").as_deref(), Some("login"));
    assert_eq!(
        location_param(&response, "userId").as_deref(),
        Some(existing_id.to_string().as_str())
    );
    assert_eq!(directory.user_count(), 1, "login must not create a second user");

    let user = directory.user_by_id(existing_id).unwrap();
    assert_eq!(
        user.access_token, "mock-access-token",
        "login should refresh the stored OAuth tokens"
    );
}

#[tokio::test]
async fn test_callback_denied_consent_lands_on_error_page() {
    let deps = TestDependencies::new();
    let provider = deps.provider.clone();
    let app = build_router(deps.into_deps());

    let response = get(&app, "/auth/google/callback?error=access_denied").await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert!(location(&response).starts_with("https://app.tempo.test/auth/error?"));
    assert_eq!(
        location_param(&response, "error").as_deref(),
        Some("access_denied")
    );
    assert!(
        provider.exchanged_codes().is_empty(),
        "a denied consent must never reach the provider"
    );
}

#[tokio::test]
async fn test_callback_without_code_is_rejected() {
    let app = build_router(TestDependencies::new().into_deps());

    let response = get(&app, "/auth/google/callback").await;

    assert!(location(&response).starts_with("https://app.tempo.test/auth/error?"));
    assert_eq!(
        location_param(&response, "error").as_deref(),
        Some("missing_code")
    );
}

#[tokio::test]
async fn test_callback_with_rejected_code() {
    let deps =
        TestDependencies::new().mock_provider(MockIdentityProvider::new().rejecting_codes());
    let app = build_router(deps.into_deps());

    let response = get(&app, "/auth/google/callback?code=stale").await;

    assert_eq!(
        location_param(&response, "error").as_deref(),
        Some("invalid_authorization_code")
    );
}

#[tokio::test]
async fn test_callback_backend_outage_reads_as_authentication_failed() {
    let deps = TestDependencies::new().mock_directory(MockUserDirectory::failing());
    let app = build_router(deps.into_deps());

    let response = get(&app, "/auth/google/callback?code=fine").await;

    assert_eq!(
        location_param(&response, "error").as_deref(),
        Some("authentication_failed")
    );
    let message = location_param(&response, "message").unwrap();
    assert!(
        !message.contains("offline"),
        "backend details must not leak into the redirect: {message}"
    );
}

// ============================================================================
// Session Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_session_returns_identity_without_token_material() {
    let user = test_user("ada@example.com");
    let token = session_token(&user);
    let deps =
        TestDependencies::new().mock_directory(MockUserDirectory::new().with_user(user.clone()));
    let app = build_router(deps.into_deps());

    let response = get_with_token(&app, "/auth/session", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["id"], json!(user.id));
    assert_eq!(body["email"], "ada@example.com");
    assert_eq!(body["is_phone_connected"], false);
    assert!(
        body.get("access_token").is_none() && body.get("refresh_token").is_none(),
        "OAuth token material must stay server-side"
    );
}

#[tokio::test]
async fn test_session_requires_a_token() {
    let app = build_router(TestDependencies::new().into_deps());

    let response = get(&app, "/auth/session").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_session_rejects_a_forged_token() {
    let user = test_user("ada@example.com");
    let deps =
        TestDependencies::new().mock_directory(MockUserDirectory::new().with_user(user.clone()));
    let app = build_router(deps.into_deps());

    let mut claims = Claims::new();
    claims.insert("userId".to_string(), json!(user.id));
    claims.insert("email".to_string(), json!(user.email));
    let forged = TokenCodec::new("not-the-server-secret").issue(&claims, 3600);

    let response = get_with_token(&app, "/auth/session", &forged).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Linking-Code Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_linking_code_is_issued_then_repeated() {
    let user = test_user("ada@example.com");
    let token = session_token(&user);
    let deps = TestDependencies::new().mock_directory(MockUserDirectory::new().with_user(user));
    let app = build_router(deps.into_deps());

    let response = post_with_token(&app, "/auth/phone/code", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let first = body_json(response).await;
    assert_eq!(first["status"], "created");

    let code = first["code"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_digit()));

    // Asking again returns the live code instead of minting a new one
    let second = body_json(post_with_token(&app, "/auth/phone/code", &token).await).await;
    assert_eq!(second["status"], "exists");
    assert_eq!(second["code"], code.as_str());
}

#[tokio::test]
async fn test_linking_code_requires_a_token() {
    let app = build_router(TestDependencies::new().into_deps());

    let response = post(&app, "/auth/phone/code").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_linking_code_for_an_unknown_user_is_not_found() {
    // Valid token, but the user behind it is gone from the directory
    let ghost = test_user("ghost@example.com");
    let token = session_token(&ghost);
    let app = build_router(TestDependencies::new().into_deps());

    let response = post_with_token(&app, "/auth/phone/code", &token).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "user_not_found");
}

// ============================================================================
// Health Tests
// ============================================================================

#[tokio::test]
async fn test_health_reports_healthy_backends() {
    let app = build_router(TestDependencies::new().into_deps());

    let response = get(&app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["directory"]["status"], "ok");
    assert_eq!(body["session_store"]["status"], "ok");
}

#[tokio::test]
async fn test_health_reports_a_directory_outage() {
    let deps = TestDependencies::new().mock_directory(MockUserDirectory::failing());
    let app = build_router(deps.into_deps());

    let response = get(&app, "/health").await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["directory"]["status"], "error");
    assert_eq!(body["session_store"]["status"], "ok");
}

#[tokio::test]
async fn test_health_reports_a_session_store_outage() {
    let deps = TestDependencies::new().broken_store();
    let app = build_router(deps.into_deps());

    let response = get(&app, "/health").await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["session_store"]["status"], "error");
}

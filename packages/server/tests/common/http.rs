//! HTTP driver for integration tests.
//!
//! Requests run through the full router (auth middleware, extensions, CORS)
//! without binding a socket, against whatever mocks the test wired in.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use server_core::domains::auth::models::User;
use server_core::domains::auth::{Claims, TokenCodec};
use tower::ServiceExt;

/// Must match the secret TestDependencies wires into ServerDeps.
const TOKEN_SECRET: &str = "test-secret";

pub async fn get(app: &Router, uri: &str) -> Response {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get_with_token(app: &Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn post(app: &Router, uri: &str) -> Response {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn post_with_token(app: &Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn post_json(app: &Router, uri: &str, body: &Value) -> Response {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

/// Collect the response body as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Collect the response body as text.
pub async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Location header of a redirect response.
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect should carry a Location header")
        .to_str()
        .unwrap()
        .to_string()
}

/// One query parameter out of a redirect's Location URL.
pub fn location_param(response: &Response, key: &str) -> Option<String> {
    let url = url::Url::parse(&location(response)).unwrap();
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// Bearer token the session middleware will accept for this user.
pub fn session_token(user: &User) -> String {
    let mut claims = Claims::new();
    claims.insert("userId".to_string(), json!(user.id));
    claims.insert("email".to_string(), json!(user.email));
    TokenCodec::new(TOKEN_SECRET).issue(&claims, 3600)
}

/// WhatsApp Cloud API envelope for one inbound text message.
pub fn text_message_payload(from: &str, body: &str) -> Value {
    json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "1029384756",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "metadata": {
                        "display_phone_number": "15550001111",
                        "phone_number_id": "111222333"
                    },
                    "contacts": [{
                        "profile": { "name": "Test Sender" },
                        "wa_id": from
                    }],
                    "messages": [{
                        "from": from,
                        "id": "wamid.test",
                        "timestamp": "1700000000",
                        "type": "text",
                        "text": { "body": body }
                    }]
                }
            }]
        }]
    })
}

/// Wait for spawned webhook work to settle.
pub async fn settle() {
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
}

use axum::{middleware::Next, response::Response};
use tracing::debug;
use uuid::Uuid;

use crate::domains::auth::token::TokenCodec;

/// Authenticated user information from a verified session token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

/// Session token authentication middleware
///
/// Extracts the token from the Authorization header, verifies it, and adds
/// AuthUser to request extensions. If no token or invalid token, the request
/// continues without AuthUser (public access); handlers decide what requires one.
pub async fn token_auth_middleware(
    codec: TokenCodec,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let auth_user = extract_auth_user(&request, &codec);

    if let Some(user) = auth_user {
        debug!("Authenticated user: {}", user.user_id);
        request.extensions_mut().insert(user);
    } else {
        debug!("No valid authentication token");
    }

    next.run(request).await
}

/// Extract and verify the session token from a request
fn extract_auth_user(
    request: &axum::http::Request<axum::body::Body>,
    codec: &TokenCodec,
) -> Option<AuthUser> {
    // Get Authorization header
    let auth_header = request.headers().get("authorization")?;
    let auth_str = auth_header.to_str().ok()?;

    // Extract token (handle both "Bearer <token>" and raw token)
    let token = auth_str.strip_prefix("Bearer ").unwrap_or(auth_str);

    // Verify signature and expiry
    let claims = codec.verify(token).ok()?;

    let user_id = claims.get("userId")?.as_str()?.parse().ok()?;
    let email = claims.get("email")?.as_str()?.to_string();

    Some(AuthUser { user_id, email })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn token_for(codec: &TokenCodec, user_id: Uuid) -> String {
        let mut claims = crate::domains::auth::token::Claims::new();
        claims.insert("userId".to_string(), json!(user_id));
        claims.insert("email".to_string(), json!("ada@example.com"));
        codec.issue(&claims, 3600)
    }

    #[test]
    fn test_extract_token_with_bearer() {
        let codec = TokenCodec::new("test_secret");
        let user_id = Uuid::new_v4();
        let token = token_for(&codec, user_id);

        let request = axum::http::Request::builder()
            .header("authorization", format!("Bearer {}", token))
            .body(axum::body::Body::empty())
            .unwrap();

        let auth_user = extract_auth_user(&request, &codec);
        assert!(auth_user.is_some());
        assert_eq!(auth_user.unwrap().user_id, user_id);
    }

    #[test]
    fn test_extract_token_without_bearer() {
        let codec = TokenCodec::new("test_secret");
        let user_id = Uuid::new_v4();
        let token = token_for(&codec, user_id);

        let request = axum::http::Request::builder()
            .header("authorization", token)
            .body(axum::body::Body::empty())
            .unwrap();

        let auth_user = extract_auth_user(&request, &codec);
        assert!(auth_user.is_some());
        assert_eq!(auth_user.unwrap().user_id, user_id);
    }

    #[test]
    fn test_no_auth_header() {
        let codec = TokenCodec::new("test_secret");
        let request = axum::http::Request::builder()
            .body(axum::body::Body::empty())
            .unwrap();

        let auth_user = extract_auth_user(&request, &codec);
        assert!(auth_user.is_none());
    }

    #[test]
    fn test_invalid_token() {
        let codec = TokenCodec::new("test_secret");
        let request = axum::http::Request::builder()
            .header("authorization", "Bearer invalid_token")
            .body(axum::body::Body::empty())
            .unwrap();

        let auth_user = extract_auth_user(&request, &codec);
        assert!(auth_user.is_none());
    }

    #[test]
    fn test_token_from_another_secret() {
        let codec = TokenCodec::new("test_secret");
        let other = TokenCodec::new("another_secret");
        let token = token_for(&other, Uuid::new_v4());

        let request = axum::http::Request::builder()
            .header("authorization", format!("Bearer {}", token))
            .body(axum::body::Body::empty())
            .unwrap();

        let auth_user = extract_auth_user(&request, &codec);
        assert!(auth_user.is_none());
    }
}

//! Auth routes - Google consent flow, linking codes, session introspection

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::common::AuthError;
use crate::domains::auth::actions::{create_linking_code, oauth_callback};
use crate::domains::auth::models::User;
use crate::kernel::ServerDeps;
use crate::server::middleware::AuthUser;

#[derive(Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    error: Option<String>,
}

#[derive(Serialize)]
pub struct LinkingCodeResponse {
    status: &'static str,
    code: String,
}

/// Identity view returned to the dashboard. OAuth token material stays
/// server-side.
#[derive(Serialize)]
pub struct SessionResponse {
    id: Uuid,
    email: String,
    name: String,
    profile_url: Option<String>,
    phone: String,
    is_phone_connected: bool,
    created_at: DateTime<Utc>,
}

impl From<User> for SessionResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            profile_url: user.profile_url,
            phone: user.phone,
            is_phone_connected: user.is_phone_connected,
            created_at: user.created_at,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: &'static str,
}

/// Send the browser to the Google consent screen
pub async fn google_login_handler(Extension(deps): Extension<Arc<ServerDeps>>) -> Redirect {
    Redirect::temporary(&deps.provider.authorize_url())
}

/// Land the consent redirect: finish the flow, then bounce to the frontend
/// with either `{status, userId, token}` or `{error, message}` query params.
pub async fn google_callback_handler(
    Query(params): Query<CallbackParams>,
    Extension(deps): Extension<Arc<ServerDeps>>,
) -> Redirect {
    match oauth_callback(params.code, params.error, &deps).await {
        Ok(outcome) => redirect_with_params(
            &deps.frontend_callback_url,
            &[
                ("status", outcome.status),
                ("userId", &outcome.user.id.to_string()),
                ("token", &outcome.token),
            ],
        ),
        Err(err) => {
            error!("OAuth callback failed: {}", err);
            redirect_with_params(
                &deps.frontend_error_url,
                &[("error", err.code()), ("message", public_message(&err))],
            )
        }
    }
}

/// Issue a linking code for the signed-in user
pub async fn create_linking_code_handler(
    Extension(deps): Extension<Arc<ServerDeps>>,
    auth: Option<Extension<AuthUser>>,
) -> Response {
    let Some(Extension(auth_user)) = auth else {
        return unauthorized();
    };

    match create_linking_code(auth_user.user_id, &deps).await {
        Ok(issue) => (
            StatusCode::OK,
            Json(LinkingCodeResponse {
                status: issue.status(),
                code: issue.code().to_string(),
            }),
        )
            .into_response(),
        Err(err) => error_response(&err),
    }
}

/// Return the identity behind a valid session token
pub async fn session_handler(
    Extension(deps): Extension<Arc<ServerDeps>>,
    auth: Option<Extension<AuthUser>>,
) -> Response {
    let Some(Extension(auth_user)) = auth else {
        return unauthorized();
    };

    match deps.directory.find_by_id(auth_user.user_id).await {
        Ok(Some(user)) => (StatusCode::OK, Json(SessionResponse::from(user))).into_response(),
        Ok(None) => error_response(&AuthError::IdentityNotFound),
        Err(err) => error_response(&err.into()),
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorBody {
            error: "unauthorized",
            message: "A valid session token is required.",
        }),
    )
        .into_response()
}

fn error_response(err: &AuthError) -> Response {
    let status = match err {
        AuthError::AccessDenied
        | AuthError::MissingAuthorizationCode
        | AuthError::InvalidAuthorizationCode => StatusCode::BAD_REQUEST,
        AuthError::SessionNotFound | AuthError::IdentityNotFound => StatusCode::NOT_FOUND,
        AuthError::DuplicateIdentity => StatusCode::CONFLICT,
        AuthError::Token(_) => StatusCode::UNAUTHORIZED,
        AuthError::ProviderExchangeFailed(_)
        | AuthError::StoreUnavailable(_)
        | AuthError::DirectoryUnavailable(_)
        | AuthError::GatewaySendFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    (
        status,
        Json(ErrorBody {
            error: err.code(),
            message: public_message(err),
        }),
    )
        .into_response()
}

/// User-facing text: validation errors stay specific, backend failures stay
/// generic so internals never leak into a redirect or response body.
fn public_message(err: &AuthError) -> &'static str {
    match err {
        AuthError::AccessDenied => "You declined the sign-in request.",
        AuthError::MissingAuthorizationCode => "The sign-in response was incomplete. Please try again.",
        AuthError::InvalidAuthorizationCode => "The sign-in link has expired. Please start over.",
        AuthError::SessionNotFound => "That code is no longer valid.",
        AuthError::IdentityNotFound => "We could not find your account.",
        AuthError::DuplicateIdentity => "An account with this email already exists.",
        AuthError::Token(_) => "Your session has expired. Please sign in again.",
        _ => "We could not complete the request. Please try again shortly.",
    }
}

/// Append query params to a configured frontend URL
fn redirect_with_params(base: &str, params: &[(&str, &str)]) -> Redirect {
    match url::Url::parse_with_params(base, params) {
        Ok(url) => Redirect::temporary(url.as_str()),
        // A misconfigured base URL still gets the user off this endpoint
        Err(_) => Redirect::temporary(base),
    }
}

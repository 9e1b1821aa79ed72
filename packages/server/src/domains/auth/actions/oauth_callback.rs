//! OAuth callback action

use serde_json::json;
use tracing::{info, warn};

use crate::common::AuthError;
use crate::domains::auth::models::User;
use crate::domains::auth::token::Claims;
use crate::kernel::ServerDeps;

/// Result of a completed callback: a persisted identity plus its session token
#[derive(Debug)]
pub struct CallbackOutcome {
    pub status: &'static str,
    pub user: User,
    pub token: String,
}

/// Finish the consent flow: exchange the code, resolve the identity, issue a token.
///
/// The token is only issued once the identity is known to be persisted; a
/// directory failure surfaces before any token exists.
pub async fn oauth_callback(
    code: Option<String>,
    error: Option<String>,
    deps: &ServerDeps,
) -> Result<CallbackOutcome, AuthError> {
    if let Some(error) = error {
        warn!("Consent screen returned an error: {}", error);
        return Err(AuthError::AccessDenied);
    }
    let code = code.ok_or(AuthError::MissingAuthorizationCode)?;

    let (profile, oauth_tokens) = deps.provider.exchange_code(&code).await?;
    let resolution = deps.resolver.resolve(&profile, &oauth_tokens).await?;

    let status = resolution.status();
    let user = resolution.into_user();
    info!("Resolved {} as {}", user.email, status);

    let mut claims = Claims::new();
    claims.insert("userId".to_string(), json!(user.id));
    claims.insert("email".to_string(), json!(user.email));
    claims.insert("name".to_string(), json!(user.name));
    claims.insert("googleId".to_string(), json!(user.google_id));
    let token = deps.tokens.issue(&claims, deps.token_ttl_seconds);

    Ok(CallbackOutcome {
        status,
        user,
        token,
    })
}

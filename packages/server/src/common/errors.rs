use thiserror::Error;

use crate::domains::auth::token::TokenError;

/// User directory errors
///
/// `Duplicate` is load-bearing: the identity resolver relies on the unique
/// email constraint to collapse two concurrent signups for the same address
/// into one identity.
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("An account with this email already exists")]
    Duplicate,

    #[error("User not found")]
    NotFound,

    #[error("User directory unavailable: {0}")]
    Unavailable(#[source] anyhow::Error),
}

/// Identity provider errors
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Authorization code was rejected by the identity provider")]
    InvalidCode,

    #[error("Identity provider exchange failed: {0}")]
    ExchangeFailed(#[source] anyhow::Error),
}

/// Auth flow errors for the Tempo linking platform
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("User denied the consent screen")]
    AccessDenied,

    #[error("Authorization response carried no code")]
    MissingAuthorizationCode,

    #[error("Invalid authorization code")]
    InvalidAuthorizationCode,

    #[error("Identity provider exchange failed: {0}")]
    ProviderExchangeFailed(#[source] anyhow::Error),

    #[error("No linking session for that code")]
    SessionNotFound,

    #[error("Linking session store unavailable: {0}")]
    StoreUnavailable(#[source] anyhow::Error),

    #[error("User not found")]
    IdentityNotFound,

    #[error("An account with this email already exists")]
    DuplicateIdentity,

    #[error("User directory unavailable: {0}")]
    DirectoryUnavailable(#[source] anyhow::Error),

    #[error("Message gateway send failed: {0}")]
    GatewaySendFailed(#[source] anyhow::Error),

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl AuthError {
    /// Stable wire code carried in redirect query strings and error bodies.
    ///
    /// Validation failures keep a distinguishing code; transient dependency
    /// failures all collapse to `authentication_failed` so callers cannot
    /// probe which backend fell over.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::AccessDenied => "access_denied",
            AuthError::MissingAuthorizationCode => "missing_code",
            AuthError::InvalidAuthorizationCode => "invalid_authorization_code",
            AuthError::ProviderExchangeFailed(_) => "authentication_failed",
            AuthError::SessionNotFound => "session_not_found",
            AuthError::StoreUnavailable(_) => "authentication_failed",
            AuthError::IdentityNotFound => "user_not_found",
            AuthError::DuplicateIdentity => "duplicate_identity",
            AuthError::DirectoryUnavailable(_) => "authentication_failed",
            AuthError::GatewaySendFailed(_) => "send_failed",
            AuthError::Token(_) => "unauthorized",
        }
    }
}

impl From<DirectoryError> for AuthError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Duplicate => AuthError::DuplicateIdentity,
            DirectoryError::NotFound => AuthError::IdentityNotFound,
            DirectoryError::Unavailable(e) => AuthError::DirectoryUnavailable(e),
        }
    }
}

impl From<ProviderError> for AuthError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::InvalidCode => AuthError::InvalidAuthorizationCode,
            ProviderError::ExchangeFailed(e) => AuthError::ProviderExchangeFailed(e),
        }
    }
}

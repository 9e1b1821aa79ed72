// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (like "resolve identity") should be domain functions that use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseMessenger, BaseUserDirectory)

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use uuid::Uuid;

use crate::common::{DirectoryError, ProviderError};
use crate::domains::auth::models::User;

// =============================================================================
// Identity Provider Trait (Infrastructure - OAuth)
// =============================================================================

/// Profile fields returned by the provider's userinfo endpoint
#[derive(Debug, Clone)]
pub struct OAuthProfile {
    pub subject: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

/// Token material returned by the provider's code exchange
///
/// `refresh_token` is only present on first consent; later logins must keep
/// the one already on file.
#[derive(Debug, Clone)]
pub struct OAuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

#[async_trait]
pub trait BaseIdentityProvider: Send + Sync {
    /// Build the consent screen URL the browser is redirected to
    fn authorize_url(&self) -> String;

    /// Exchange an authorization code for tokens and the user's profile
    async fn exchange_code(&self, code: &str) -> Result<(OAuthProfile, OAuthTokens), ProviderError>;
}

// =============================================================================
// User Directory Trait (Infrastructure - identity records)
// =============================================================================

#[async_trait]
pub trait BaseUserDirectory: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DirectoryError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError>;

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, DirectoryError>;

    /// Create a user, failing with `DirectoryError::Duplicate` if the email
    /// is already taken
    async fn create(&self, user: &User) -> Result<User, DirectoryError>;

    /// Attach a verified phone number and mark the identity as connected
    async fn attach_phone(&self, id: Uuid, phone: &str) -> Result<User, DirectoryError>;

    /// Store fresh OAuth tokens after a repeat login
    async fn update_oauth_tokens(
        &self,
        id: Uuid,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<User, DirectoryError>;
}

// =============================================================================
// Messenger Trait (Infrastructure - outbound chat messages)
// =============================================================================

#[async_trait]
pub trait BaseMessenger: Send + Sync {
    /// Send a plain text message to a phone number
    async fn send_text(&self, phone: &str, body: &str) -> Result<()>;
}

// =============================================================================
// Expiring Store Trait (Infrastructure - ephemeral key/value state)
// =============================================================================

#[async_trait]
pub trait BaseExpiringStore: Send + Sync {
    /// Write `value` under `key` only if the key is absent (or expired).
    /// Returns true if the write happened.
    async fn set_if_absent(&self, key: &str, value: serde_json::Value, ttl: Duration)
        -> Result<bool>;

    /// Read a live value; expired entries read as None
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;

    /// Atomically remove and return a live value
    async fn take(&self, key: &str) -> Result<Option<serde_json::Value>>;

    async fn delete(&self, key: &str) -> Result<()>;
}

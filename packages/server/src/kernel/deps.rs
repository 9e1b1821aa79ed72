//! Server dependencies for domain actions (using traits for testability)
//!
//! This module provides the central dependency container used by all domain
//! actions. All external services use trait abstractions to enable testing.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use whatsapp::WhatsAppService;

use crate::common::DirectoryError;
use crate::domains::auth::linking::LinkingSessionStore;
use crate::domains::auth::models::User;
use crate::domains::auth::resolver::IdentityResolver;
use crate::domains::auth::token::TokenCodec;
use crate::kernel::traits::{
    BaseExpiringStore, BaseIdentityProvider, BaseMessenger, BaseUserDirectory,
};

// =============================================================================
// WhatsAppService Adapter (implements BaseMessenger trait)
// =============================================================================

/// Wrapper around WhatsAppService that implements BaseMessenger trait
pub struct WhatsAppAdapter(pub Arc<WhatsAppService>);

impl WhatsAppAdapter {
    pub fn new(service: Arc<WhatsAppService>) -> Self {
        Self(service)
    }
}

#[async_trait]
impl BaseMessenger for WhatsAppAdapter {
    async fn send_text(&self, phone: &str, body: &str) -> Result<()> {
        self.0
            .send_text(phone, body)
            .await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("{}", e))
    }
}

// =============================================================================
// Postgres User Directory (implements BaseUserDirectory trait)
// =============================================================================

/// Postgres-backed user directory over the queries in models/
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Pick the duplicate-email case out of an insert failure
fn classify_insert_error(err: anyhow::Error) -> DirectoryError {
    match err.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db)) if db.is_unique_violation() => DirectoryError::Duplicate,
        _ => DirectoryError::Unavailable(err),
    }
}

#[async_trait]
impl BaseUserDirectory for PgUserDirectory {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DirectoryError> {
        User::find_by_id(id, &self.pool)
            .await
            .map_err(DirectoryError::Unavailable)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError> {
        User::find_by_email(email, &self.pool)
            .await
            .map_err(DirectoryError::Unavailable)
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, DirectoryError> {
        User::find_by_phone(phone, &self.pool)
            .await
            .map_err(DirectoryError::Unavailable)
    }

    async fn create(&self, user: &User) -> Result<User, DirectoryError> {
        user.insert(&self.pool).await.map_err(classify_insert_error)
    }

    async fn attach_phone(&self, id: Uuid, phone: &str) -> Result<User, DirectoryError> {
        User::attach_phone(id, phone, &self.pool)
            .await
            .map_err(DirectoryError::Unavailable)?
            .ok_or(DirectoryError::NotFound)
    }

    async fn update_oauth_tokens(
        &self,
        id: Uuid,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<User, DirectoryError> {
        User::update_oauth_tokens(id, access_token, refresh_token, &self.pool)
            .await
            .map_err(DirectoryError::Unavailable)?
            .ok_or(DirectoryError::NotFound)
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Server dependencies accessible to domain actions (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub provider: Arc<dyn BaseIdentityProvider>,
    pub directory: Arc<dyn BaseUserDirectory>,
    pub messenger: Arc<dyn BaseMessenger>,
    /// Identity resolution over the directory handle above
    pub resolver: IdentityResolver,
    /// Linking sessions over the injected expiring store
    pub sessions: LinkingSessionStore,
    /// Session token codec
    pub tokens: TokenCodec,
    pub token_ttl_seconds: i64,
    /// Shared secret echoed by the webhook verification handshake
    pub webhook_verify_token: String,
    pub frontend_callback_url: String,
    pub frontend_error_url: String,
}

impl ServerDeps {
    /// Create new ServerDeps with the given dependencies
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        provider: Arc<dyn BaseIdentityProvider>,
        directory: Arc<dyn BaseUserDirectory>,
        messenger: Arc<dyn BaseMessenger>,
        link_store: Arc<dyn BaseExpiringStore>,
        link_ttl: Duration,
        tokens: TokenCodec,
        token_ttl_seconds: i64,
        webhook_verify_token: String,
        frontend_callback_url: String,
        frontend_error_url: String,
    ) -> Self {
        Self {
            resolver: IdentityResolver::new(directory.clone()),
            sessions: LinkingSessionStore::new(link_store, link_ttl),
            provider,
            directory,
            messenger,
            tokens,
            token_ttl_seconds,
            webhook_verify_token,
            frontend_callback_url,
            frontend_error_url,
        }
    }
}

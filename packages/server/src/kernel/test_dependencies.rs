// TestDependencies - mock implementations for testing
//
// Provides mock services that can be injected into ServerDeps for tests.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use crate::common::{DirectoryError, ProviderError};
use crate::domains::auth::models::User;
use crate::domains::auth::token::TokenCodec;
use crate::kernel::kv::MemoryExpiringStore;
use crate::kernel::traits::{
    BaseExpiringStore, BaseIdentityProvider, BaseMessenger, BaseUserDirectory, OAuthProfile,
    OAuthTokens,
};
use crate::kernel::ServerDeps;

/// A persisted-looking user for seeding mocks
pub fn test_user(email: &str) -> User {
    User {
        id: Uuid::new_v4(),
        google_id: format!("google-{email}"),
        name: "Test User".to_string(),
        email: email.to_string(),
        profile_url: None,
        access_token: "at-seed".to_string(),
        refresh_token: None,
        phone: "0000000000".to_string(),
        is_phone_connected: false,
        created_at: Utc::now(),
    }
}

// =============================================================================
// Mock Identity Provider
// =============================================================================

pub struct MockIdentityProvider {
    profile: OAuthProfile,
    tokens: OAuthTokens,
    reject_codes: bool,
    offline: bool,
    exchanged_codes: Arc<Mutex<Vec<String>>>,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self {
            profile: OAuthProfile {
                subject: "google-sub-1".to_string(),
                email: "ada@example.com".to_string(),
                name: "Ada Lovelace".to_string(),
                picture: Some("https://lh3.example.com/a/photo".to_string()),
            },
            tokens: OAuthTokens {
                access_token: "mock-access-token".to_string(),
                refresh_token: Some("mock-refresh-token".to_string()),
            },
            reject_codes: false,
            offline: false,
            exchanged_codes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the profile returned by every exchange
    pub fn with_profile(mut self, profile: OAuthProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Shortcut: same default profile under a different email
    pub fn with_email(mut self, email: &str) -> Self {
        self.profile.subject = format!("google-{email}");
        self.profile.email = email.to_string();
        self
    }

    pub fn with_tokens(mut self, access: &str, refresh: Option<&str>) -> Self {
        self.tokens = OAuthTokens {
            access_token: access.to_string(),
            refresh_token: refresh.map(str::to_string),
        };
        self
    }

    /// Every exchange fails as an invalid authorization code
    pub fn rejecting_codes(mut self) -> Self {
        self.reject_codes = true;
        self
    }

    /// Every exchange fails as a provider outage
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    /// Get all codes that were exchanged
    pub fn exchanged_codes(&self) -> Vec<String> {
        self.exchanged_codes.lock().unwrap().clone()
    }

    /// Check if a code was exchanged
    pub fn was_exchanged(&self, code: &str) -> bool {
        self.exchanged_codes.lock().unwrap().iter().any(|c| c == code)
    }
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseIdentityProvider for MockIdentityProvider {
    fn authorize_url(&self) -> String {
        "https://provider.test/authorize?client_id=mock".to_string()
    }

    async fn exchange_code(&self, code: &str) -> Result<(OAuthProfile, OAuthTokens), ProviderError> {
        self.exchanged_codes.lock().unwrap().push(code.to_string());

        if self.reject_codes {
            return Err(ProviderError::InvalidCode);
        }
        if self.offline {
            return Err(ProviderError::ExchangeFailed(anyhow::anyhow!(
                "identity provider offline"
            )));
        }
        Ok((self.profile.clone(), self.tokens.clone()))
    }
}

// =============================================================================
// Mock User Directory
// =============================================================================

pub struct MockUserDirectory {
    users: Arc<Mutex<Vec<User>>>,
    race_on_create: Arc<Mutex<Option<User>>>,
    fail: bool,
}

impl MockUserDirectory {
    pub fn new() -> Self {
        Self {
            users: Arc::new(Mutex::new(Vec::new())),
            race_on_create: Arc::new(Mutex::new(None)),
            fail: false,
        }
    }

    /// Directory whose every call fails (outage tests)
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Seed an existing user
    pub fn with_user(self, user: User) -> Self {
        self.users.lock().unwrap().push(user);
        self
    }

    /// Simulate a concurrent signup: the next create inserts `winner` first
    /// and reports a duplicate, as the database unique index would
    pub fn with_race_on_create(self, winner: User) -> Self {
        *self.race_on_create.lock().unwrap() = Some(winner);
        self
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn user_by_email(&self, email: &str) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned()
    }

    pub fn user_by_id(&self, id: Uuid) -> Option<User> {
        self.users.lock().unwrap().iter().find(|u| u.id == id).cloned()
    }

    fn guard(&self) -> Result<(), DirectoryError> {
        if self.fail {
            return Err(DirectoryError::Unavailable(anyhow::anyhow!(
                "user directory offline"
            )));
        }
        Ok(())
    }
}

impl Default for MockUserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseUserDirectory for MockUserDirectory {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DirectoryError> {
        self.guard()?;
        Ok(self.user_by_id(id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError> {
        self.guard()?;
        Ok(self.user_by_email(email))
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, DirectoryError> {
        self.guard()?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.phone == phone)
            .cloned())
    }

    async fn create(&self, user: &User) -> Result<User, DirectoryError> {
        self.guard()?;

        if let Some(winner) = self.race_on_create.lock().unwrap().take() {
            self.users.lock().unwrap().push(winner);
            return Err(DirectoryError::Duplicate);
        }

        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(DirectoryError::Duplicate);
        }
        users.push(user.clone());
        Ok(user.clone())
    }

    async fn attach_phone(&self, id: Uuid, phone: &str) -> Result<User, DirectoryError> {
        self.guard()?;
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(DirectoryError::NotFound)?;
        user.phone = phone.to_string();
        user.is_phone_connected = true;
        Ok(user.clone())
    }

    async fn update_oauth_tokens(
        &self,
        id: Uuid,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<User, DirectoryError> {
        self.guard()?;
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(DirectoryError::NotFound)?;
        user.access_token = access_token.to_string();
        if let Some(refresh) = refresh_token {
            user.refresh_token = Some(refresh.to_string());
        }
        Ok(user.clone())
    }
}

// =============================================================================
// Mock Messenger
// =============================================================================

pub struct MockMessenger {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    fail: bool,
}

impl MockMessenger {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        }
    }

    /// Messenger that records the attempt, then fails the send
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Get all (phone, body) pairs that were sent
    pub fn sent_messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Get all bodies sent to a phone
    pub fn sent_to(&self, phone: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == phone)
            .map(|(_, body)| body.clone())
            .collect()
    }

    /// Check if a message containing the given text went to a phone
    pub fn was_text_sent(&self, phone: &str, needle: &str) -> bool {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .any(|(p, body)| p == phone && body.contains(needle))
    }

    pub fn send_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl Default for MockMessenger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseMessenger for MockMessenger {
    async fn send_text(&self, phone: &str, body: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((phone.to_string(), body.to_string()));

        if self.fail {
            anyhow::bail!("message gateway offline");
        }
        Ok(())
    }
}

// =============================================================================
// Failing Expiring Store
// =============================================================================

/// Expiring store whose every operation fails (outage tests)
pub struct FailingExpiringStore;

#[async_trait]
impl BaseExpiringStore for FailingExpiringStore {
    async fn set_if_absent(
        &self,
        _key: &str,
        _value: serde_json::Value,
        _ttl: Duration,
    ) -> Result<bool> {
        anyhow::bail!("expiring store offline")
    }

    async fn get(&self, _key: &str) -> Result<Option<serde_json::Value>> {
        anyhow::bail!("expiring store offline")
    }

    async fn take(&self, _key: &str) -> Result<Option<serde_json::Value>> {
        anyhow::bail!("expiring store offline")
    }

    async fn delete(&self, _key: &str) -> Result<()> {
        anyhow::bail!("expiring store offline")
    }
}

// =============================================================================
// TestDependencies - Builder for test dependencies
// =============================================================================

#[derive(Clone)]
pub struct TestDependencies {
    pub provider: Arc<MockIdentityProvider>,
    pub directory: Arc<MockUserDirectory>,
    pub messenger: Arc<MockMessenger>,
    pub store: Arc<MemoryExpiringStore>,
    link_ttl: Duration,
    broken_store: bool,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            provider: Arc::new(MockIdentityProvider::new()),
            directory: Arc::new(MockUserDirectory::new()),
            messenger: Arc::new(MockMessenger::new()),
            store: Arc::new(MemoryExpiringStore::new()),
            link_ttl: Duration::from_secs(600),
            broken_store: false,
        }
    }

    /// Set a mock identity provider
    pub fn mock_provider(mut self, provider: MockIdentityProvider) -> Self {
        self.provider = Arc::new(provider);
        self
    }

    /// Set a mock user directory
    pub fn mock_directory(mut self, directory: MockUserDirectory) -> Self {
        self.directory = Arc::new(directory);
        self
    }

    /// Set a mock messenger
    pub fn mock_messenger(mut self, messenger: MockMessenger) -> Self {
        self.messenger = Arc::new(messenger);
        self
    }

    /// Shorten (or zero) the linking session TTL
    pub fn with_link_ttl(mut self, ttl: Duration) -> Self {
        self.link_ttl = ttl;
        self
    }

    /// Swap the session store for one that always fails
    pub fn broken_store(mut self) -> Self {
        self.broken_store = true;
        self
    }

    /// Convert into ServerDeps for testing
    pub fn into_deps(self) -> Arc<ServerDeps> {
        let store: Arc<dyn BaseExpiringStore> = if self.broken_store {
            Arc::new(FailingExpiringStore)
        } else {
            self.store.clone()
        };

        Arc::new(ServerDeps::new(
            self.provider,
            self.directory,
            self.messenger,
            store,
            self.link_ttl,
            TokenCodec::new("test-secret"),
            3600,
            "verify-token-123".to_string(),
            "https://app.tempo.test/auth/callback".to_string(),
            "https://app.tempo.test/auth/error".to_string(),
        ))
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}

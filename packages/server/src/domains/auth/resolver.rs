//! Identity resolution: map a provider profile onto exactly one local user.
//!
//! Keyed by email. A known email is a login (with a token refresh); an
//! unknown one becomes a signup. Two concurrent signups for the same email
//! are collapsed by the directory's unique email constraint: the loser
//! re-fetches the winner's row and reports a login instead of failing.

use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

use crate::common::{AuthError, DirectoryError};
use crate::domains::auth::models::User;
use crate::kernel::traits::{BaseUserDirectory, OAuthProfile, OAuthTokens};

/// How a profile resolved against the directory.
#[derive(Debug, Clone)]
pub enum Resolution {
    Login(User),
    Signup(User),
}

impl Resolution {
    pub fn user(&self) -> &User {
        match self {
            Resolution::Login(user) | Resolution::Signup(user) => user,
        }
    }

    pub fn into_user(self) -> User {
        match self {
            Resolution::Login(user) | Resolution::Signup(user) => user,
        }
    }

    /// Wire status string for the callback redirect.
    pub fn status(&self) -> &'static str {
        match self {
            Resolution::Login(_) => "login",
            Resolution::Signup(_) => "signup",
        }
    }
}

/// Stateless resolver over an injected directory handle.
#[derive(Clone)]
pub struct IdentityResolver {
    directory: Arc<dyn BaseUserDirectory>,
}

impl IdentityResolver {
    pub fn new(directory: Arc<dyn BaseUserDirectory>) -> Self {
        Self { directory }
    }

    /// Resolve a freshly authenticated profile to a local identity.
    ///
    /// Never issues a result for an identity that failed to persist; any
    /// directory failure surfaces before a user is returned.
    pub async fn resolve(
        &self,
        profile: &OAuthProfile,
        tokens: &OAuthTokens,
    ) -> Result<Resolution, AuthError> {
        if let Some(user) = self.directory.find_by_email(&profile.email).await? {
            return Ok(Resolution::Login(self.refresh_tokens(&user, tokens).await?));
        }

        let candidate = User {
            id: Uuid::new_v4(),
            google_id: profile.subject.clone(),
            name: profile.name.clone(),
            email: profile.email.clone(),
            profile_url: profile.picture.clone(),
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            phone: generate_placeholder_phone(),
            is_phone_connected: false,
            created_at: Utc::now(),
        };

        match self.directory.create(&candidate).await {
            Ok(user) => Ok(Resolution::Signup(user)),
            // Concurrent signup won the unique email constraint; fall back to login
            Err(DirectoryError::Duplicate) => {
                match self.directory.find_by_email(&profile.email).await? {
                    Some(user) => Ok(Resolution::Login(self.refresh_tokens(&user, tokens).await?)),
                    None => Err(AuthError::DirectoryUnavailable(anyhow::anyhow!(
                        "duplicate email reported but no row found for {}",
                        profile.email
                    ))),
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn refresh_tokens(&self, user: &User, tokens: &OAuthTokens) -> Result<User, AuthError> {
        let updated = self
            .directory
            .update_oauth_tokens(user.id, &tokens.access_token, tokens.refresh_token.as_deref())
            .await?;
        Ok(updated)
    }
}

/// Ten random digits standing in for a phone until linking attaches one.
///
/// The linking flow overwrites this; it only has to be non-null and unlikely
/// to collide with a real number lookup.
fn generate_placeholder_phone() -> String {
    let n: u64 = rand::thread_rng().gen_range(0..10_000_000_000);
    format!("{n:010}")
}

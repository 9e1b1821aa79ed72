//! Linking sessions: short-lived codes that tie a dashboard login to a phone.
//!
//! A signed-in user asks for a code, then sends "Authorize: <code>" from
//! their phone. Sessions live in an expiring store under two keys so both
//! directions resolve in one read:
//!
//!   link:code:<code>    -> full session (consumed by the webhook)
//!   link:user:<userId>  -> code        (dedupes repeat requests)
//!
//! The store offers atomic single-key ops only, so a crash between the two
//! writes can orphan one key for at most one TTL. Consume is take-based,
//! which makes each code usable at most once even under concurrent webhooks.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::AuthError;
use crate::kernel::traits::BaseExpiringStore;

const MAX_CODE_ATTEMPTS: usize = 5;

/// One pending phone-linking attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkingSession {
    pub code: String,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Outcome of a code request.
#[derive(Debug, Clone, PartialEq)]
pub enum CodeIssue {
    /// A fresh session was written.
    Created { code: String },
    /// The user already had a live session; its code is returned unchanged.
    Existing { code: String },
}

impl CodeIssue {
    pub fn code(&self) -> &str {
        match self {
            CodeIssue::Created { code } | CodeIssue::Existing { code } => code,
        }
    }

    /// Wire status string for the dashboard response.
    pub fn status(&self) -> &'static str {
        match self {
            CodeIssue::Created { .. } => "created",
            CodeIssue::Existing { .. } => "exists",
        }
    }
}

/// Store facade for linking sessions.
///
/// Stateless apart from the injected store handle; cheap to clone.
#[derive(Clone)]
pub struct LinkingSessionStore {
    store: Arc<dyn BaseExpiringStore>,
    ttl: Duration,
}

impl LinkingSessionStore {
    pub fn new(store: Arc<dyn BaseExpiringStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Issue a linking code for `user_id`, reusing any live session.
    ///
    /// The user index is claimed with set-if-absent, so two concurrent
    /// requests for the same user converge on one code: the loser releases
    /// its freshly written code key and reports the winner's code.
    pub async fn create(&self, user_id: Uuid, name: &str) -> Result<CodeIssue, AuthError> {
        let user_key = user_key(user_id);

        if let Some(code) = self.registered_code(&user_key).await? {
            return Ok(CodeIssue::Existing { code });
        }

        let session = self.write_session(user_id, name).await?;

        let claimed = self
            .store
            .set_if_absent(&user_key, serde_json::Value::String(session.code.clone()), self.ttl)
            .await
            .map_err(AuthError::StoreUnavailable)?;
        if claimed {
            return Ok(CodeIssue::Created { code: session.code });
        }

        // Lost a concurrent claim for the same user
        self.store
            .delete(&code_key(&session.code))
            .await
            .map_err(AuthError::StoreUnavailable)?;
        match self.registered_code(&user_key).await? {
            Some(code) => Ok(CodeIssue::Existing { code }),
            None => Err(AuthError::StoreUnavailable(anyhow::anyhow!(
                "linking code contention did not settle"
            ))),
        }
    }

    /// Peek at a session without consuming it.
    pub async fn get(&self, code: &str) -> Result<Option<LinkingSession>, AuthError> {
        let value = self
            .store
            .get(&code_key(code))
            .await
            .map_err(AuthError::StoreUnavailable)?;
        Ok(value.and_then(|v| serde_json::from_value(v).ok()))
    }

    /// Atomically claim a session by code, burning both keys.
    ///
    /// Concurrent consumers of the same code see at most one `Some`.
    pub async fn consume(&self, code: &str) -> Result<Option<LinkingSession>, AuthError> {
        let value = self
            .store
            .take(&code_key(code))
            .await
            .map_err(AuthError::StoreUnavailable)?;
        let session: LinkingSession = match value.and_then(|v| serde_json::from_value(v).ok()) {
            Some(session) => session,
            None => return Ok(None),
        };
        self.store
            .delete(&user_key(session.user_id))
            .await
            .map_err(AuthError::StoreUnavailable)?;
        Ok(Some(session))
    }

    async fn registered_code(&self, user_key: &str) -> Result<Option<String>, AuthError> {
        let value = self
            .store
            .get(user_key)
            .await
            .map_err(AuthError::StoreUnavailable)?;
        Ok(value.and_then(|v| v.as_str().map(str::to_string)))
    }

    /// Write a fresh session under a collision-free code key.
    async fn write_session(&self, user_id: Uuid, name: &str) -> Result<LinkingSession, AuthError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let session = LinkingSession {
                code: generate_code(),
                user_id,
                name: name.to_string(),
                created_at: Utc::now(),
            };
            let value = serde_json::to_value(&session)
                .map_err(|e| AuthError::StoreUnavailable(e.into()))?;
            let wrote = self
                .store
                .set_if_absent(&code_key(&session.code), value, self.ttl)
                .await
                .map_err(AuthError::StoreUnavailable)?;
            if wrote {
                return Ok(session);
            }
        }
        Err(AuthError::StoreUnavailable(anyhow::anyhow!(
            "exhausted linking code attempts"
        )))
    }
}

fn code_key(code: &str) -> String {
    format!("link:code:{code}")
}

fn user_key(user_id: Uuid) -> String {
    format!("link:user:{user_id}")
}

/// Six digits from the thread-local CSPRNG, zero-padded.
fn generate_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{n:06}")
}

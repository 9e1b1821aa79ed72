use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// User model - SQL persistence layer
///
/// One row per linked Google identity. `email` carries a unique index; the
/// identity resolver depends on the insert failing for a duplicate email.
/// `phone` holds a random placeholder until the linking flow attaches a real
/// number and flips `is_phone_connected`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub google_id: String,
    pub name: String,
    pub email: String,
    pub profile_url: Option<String>,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub phone: String,
    pub is_phone_connected: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl User {
    /// Find user by ID
    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Find user by email
    pub async fn find_by_email(email: &str, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Find user by phone number
    pub async fn find_by_phone(phone: &str, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM users WHERE phone = $1")
            .bind(phone)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Insert a new user row
    ///
    /// Fails with a database unique violation if the email is already taken;
    /// callers classify that case rather than treating it as a hard error.
    pub async fn insert(&self, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO users
                (id, google_id, name, email, profile_url, access_token,
                 refresh_token, phone, is_phone_connected, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(&self.google_id)
        .bind(&self.name)
        .bind(&self.email)
        .bind(&self.profile_url)
        .bind(&self.access_token)
        .bind(&self.refresh_token)
        .bind(&self.phone)
        .bind(self.is_phone_connected)
        .bind(self.created_at)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Attach a verified phone number to a user
    pub async fn attach_phone(id: Uuid, phone: &str, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE users
            SET phone = $2, is_phone_connected = true
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(phone)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Refresh the stored OAuth tokens after a login
    ///
    /// Google only returns a refresh token on first consent, so a missing
    /// refresh token keeps the previously stored one.
    pub async fn update_oauth_tokens(
        id: Uuid,
        access_token: &str,
        refresh_token: Option<&str>,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE users
            SET access_token = $2, refresh_token = COALESCE($3, refresh_token)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(access_token)
        .bind(refresh_token)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }
}

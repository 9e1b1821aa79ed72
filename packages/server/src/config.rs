use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub google_redirect_uri: String,
    pub token_secret: String,
    pub token_ttl_seconds: i64,
    pub link_code_ttl_seconds: u64,
    pub whatsapp_access_token: String,
    pub whatsapp_phone_number_id: String,
    pub webhook_verify_token: String,
    pub frontend_callback_url: String,
    pub frontend_error_url: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let frontend_callback_url =
            env::var("FRONTEND_CALLBACK_URL").context("FRONTEND_CALLBACK_URL must be set")?;
        // Errors land on the callback page unless a dedicated page is configured
        let frontend_error_url =
            env::var("FRONTEND_ERROR_URL").unwrap_or_else(|_| frontend_callback_url.clone());

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            google_client_id: env::var("GOOGLE_CLIENT_ID")
                .context("GOOGLE_CLIENT_ID must be set")?,
            google_client_secret: env::var("GOOGLE_CLIENT_SECRET")
                .context("GOOGLE_CLIENT_SECRET must be set")?,
            google_redirect_uri: env::var("GOOGLE_REDIRECT_URI")
                .context("GOOGLE_REDIRECT_URI must be set")?,
            token_secret: env::var("TOKEN_SECRET").context("TOKEN_SECRET must be set")?,
            token_ttl_seconds: env::var("TOKEN_TTL_SECONDS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()
                .context("TOKEN_TTL_SECONDS must be a valid number")?,
            link_code_ttl_seconds: env::var("LINK_CODE_TTL_SECONDS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .context("LINK_CODE_TTL_SECONDS must be a valid number")?,
            whatsapp_access_token: env::var("WHATSAPP_ACCESS_TOKEN")
                .context("WHATSAPP_ACCESS_TOKEN must be set")?,
            whatsapp_phone_number_id: env::var("WHATSAPP_PHONE_NUMBER_ID")
                .context("WHATSAPP_PHONE_NUMBER_ID must be set")?,
            webhook_verify_token: env::var("WEBHOOK_VERIFY_TOKEN")
                .context("WEBHOOK_VERIFY_TOKEN must be set")?,
            frontend_callback_url,
            frontend_error_url,
        })
    }
}

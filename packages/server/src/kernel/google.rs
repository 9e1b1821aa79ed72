use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::common::ProviderError;
use crate::kernel::traits::{BaseIdentityProvider, OAuthProfile, OAuthTokens};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Profile, email, and calendar access in one consent
const SCOPES: &str = "https://www.googleapis.com/auth/userinfo.profile \
                      https://www.googleapis.com/auth/userinfo.email \
                      https://www.googleapis.com/auth/calendar";

/// Google OAuth client for the sign-in and calendar consent flow
pub struct GoogleOAuth {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    client: reqwest::Client,
}

/// Google token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Google token endpoint error body
#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Google userinfo response
#[derive(Debug, Deserialize)]
struct UserInfo {
    id: String,
    email: String,
    name: String,
    #[serde(default)]
    picture: Option<String>,
}

impl GoogleOAuth {
    /// Create a new Google OAuth client
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client_id,
            client_secret,
            redirect_uri,
            client,
        })
    }

    async fn fetch_tokens(&self, code: &str) -> Result<TokenResponse, ProviderError> {
        let response = self
            .client
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| {
                ProviderError::ExchangeFailed(
                    anyhow!(e).context("Failed to reach Google token endpoint"),
                )
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            // An expired or reused code comes back as invalid_grant
            if let Ok(err) = serde_json::from_str::<TokenErrorBody>(&body) {
                if err.error == "invalid_grant" {
                    return Err(ProviderError::InvalidCode);
                }
                return Err(ProviderError::ExchangeFailed(anyhow!(
                    "Google token endpoint error {}: {} {}",
                    status,
                    err.error,
                    err.error_description.unwrap_or_default()
                )));
            }
            return Err(ProviderError::ExchangeFailed(anyhow!(
                "Google token endpoint error {}: {}",
                status,
                body
            )));
        }

        response.json().await.map_err(|e| {
            ProviderError::ExchangeFailed(anyhow!(e).context("Failed to parse token response"))
        })
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<UserInfo, ProviderError> {
        let response = self
            .client
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                ProviderError::ExchangeFailed(
                    anyhow!(e).context("Failed to reach Google userinfo endpoint"),
                )
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ExchangeFailed(anyhow!(
                "Google userinfo error {}: {}",
                status,
                body
            )));
        }

        response.json().await.map_err(|e| {
            ProviderError::ExchangeFailed(anyhow!(e).context("Failed to parse userinfo response"))
        })
    }
}

#[async_trait]
impl BaseIdentityProvider for GoogleOAuth {
    /// Consent URL with offline access so a refresh token comes back
    fn authorize_url(&self) -> String {
        let params = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", SCOPES)
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent")
            .finish();
        format!("{GOOGLE_AUTH_URL}?{params}")
    }

    async fn exchange_code(&self, code: &str) -> Result<(OAuthProfile, OAuthTokens), ProviderError> {
        let tokens = self.fetch_tokens(code).await?;
        let info = self.fetch_profile(&tokens.access_token).await?;

        Ok((
            OAuthProfile {
                subject: info.id,
                email: info.email,
                name: info.name,
                picture: info.picture,
            },
            OAuthTokens {
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn client() -> GoogleOAuth {
        GoogleOAuth::new(
            "client-id-123".to_string(),
            "client-secret-456".to_string(),
            "https://api.example.com/auth/google/callback".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn authorize_url_carries_the_full_consent_request() {
        let url = url::Url::parse(&client().authorize_url()).unwrap();
        assert_eq!(url.origin().ascii_serialization(), "https://accounts.google.com");
        assert_eq!(url.path(), "/o/oauth2/v2/auth");

        let params: HashMap<String, String> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(params["client_id"], "client-id-123");
        assert_eq!(
            params["redirect_uri"],
            "https://api.example.com/auth/google/callback"
        );
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["access_type"], "offline");
        assert_eq!(params["prompt"], "consent");

        let scopes: Vec<&str> = params["scope"].split(' ').collect();
        assert!(scopes.contains(&"https://www.googleapis.com/auth/userinfo.profile"));
        assert!(scopes.contains(&"https://www.googleapis.com/auth/userinfo.email"));
        assert!(scopes.contains(&"https://www.googleapis.com/auth/calendar"));
    }

    #[test]
    fn secret_never_appears_in_the_authorize_url() {
        let url = client().authorize_url();
        assert!(!url.contains("client-secret-456"));
    }
}

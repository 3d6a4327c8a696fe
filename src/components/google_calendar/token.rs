use crate::config::Config;
use crate::error::{api_error, ReportResult};
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Google OAuth token endpoint
pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Seconds before expiry at which a token is already treated as expired
const EXPIRY_MARGIN_SECS: i64 = 60;

/// OAuth token as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Unix timestamp after which the access token is no longer valid
    pub expires_at: i64,
}

impl StoredToken {
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at - EXPIRY_MARGIN_SECS <= now
    }
}

/// Response body of the token endpoint
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
}

#[derive(Clone)]
pub struct TokenManager {
    client_id: String,
    client_secret: String,
    token_path: PathBuf,
    token_url: String,
    client: Client,
}

impl TokenManager {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            token_path: config.token_path.clone(),
            token_url: TOKEN_URL.to_string(),
            client,
        }
    }

    /// Use a different token endpoint
    pub fn with_token_url(mut self, token_url: &str) -> Self {
        self.token_url = token_url.to_string();
        self
    }

    pub fn token_path(&self) -> &Path {
        &self.token_path
    }

    /// Get a valid OAuth token, refreshing the stored one if it has expired
    pub async fn get_token(&self) -> ReportResult<StoredToken> {
        let token = self.load()?.ok_or_else(|| {
            api_error(&format!(
                "No token found at {}. Run get_calendar_token first.",
                self.token_path.display()
            ))
        })?;

        if !token.is_expired(Utc::now().timestamp()) {
            debug!("Using stored access token");
            return Ok(token);
        }

        info!("Access token expired, refreshing");
        let refreshed = self.refresh_token(&token).await?;
        self.save(&refreshed)?;
        Ok(refreshed)
    }

    /// Read the token file, `None` if it does not exist yet
    pub fn load(&self) -> ReportResult<Option<StoredToken>> {
        if !self.token_path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.token_path)?;
        let token = serde_json::from_str(&content)?;
        Ok(Some(token))
    }

    pub fn save(&self, token: &StoredToken) -> ReportResult<()> {
        if let Some(parent) = self.token_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.token_path, serde_json::to_string_pretty(token)?)?;
        Ok(())
    }

    /// Refresh an expired token
    async fn refresh_token(&self, token: &StoredToken) -> ReportResult<StoredToken> {
        let refresh_token = token
            .refresh_token
            .clone()
            .ok_or_else(|| api_error("No refresh token in token data. Run get_calendar_token again."))?;

        let params = [
            ("client_id", self.client_id.clone()),
            ("client_secret", self.client_secret.clone()),
            ("refresh_token", refresh_token.clone()),
            ("grant_type", "refresh_token".to_string()),
        ];

        let response = self.request_token(&params, "refresh token").await?;

        // Google does not always send the refresh token again
        Ok(StoredToken {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or(Some(refresh_token)),
            expires_at: Utc::now().timestamp() + response.expires_in.unwrap_or(3600),
        })
    }

    /// Exchange an authorization code for a token
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> ReportResult<StoredToken> {
        let params = [
            ("client_id", self.client_id.clone()),
            ("client_secret", self.client_secret.clone()),
            ("code", code.to_string()),
            ("redirect_uri", redirect_uri.to_string()),
            ("grant_type", "authorization_code".to_string()),
        ];

        let response = self.request_token(&params, "get token").await?;

        Ok(StoredToken {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at: Utc::now().timestamp() + response.expires_in.unwrap_or(3600),
        })
    }

    async fn request_token(&self, params: &[(&str, String)], action: &str) -> ReportResult<TokenResponse> {
        let response = self
            .client
            .post(&self.token_url)
            .form(params)
            .send()
            .await
            .map_err(|e| api_error(&format!("Failed to {}: {}", action, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(api_error(&format!(
                "Failed to {}: HTTP {} - {}",
                action, status, error_body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| api_error(&format!("Failed to parse token response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_expires_with_margin() {
        let token = StoredToken {
            access_token: "abc".to_string(),
            refresh_token: None,
            expires_at: 1_000,
        };
        assert!(!token.is_expired(900));
        assert!(token.is_expired(940));
        assert!(token.is_expired(2_000));
    }

    #[test]
    fn token_file_format() {
        let token: StoredToken = serde_json::from_str(
            r#"{"access_token":"ya29.x","refresh_token":"1//r","expires_at":1700000000}"#,
        )
        .unwrap();
        assert_eq!(token.access_token, "ya29.x");
        assert_eq!(token.refresh_token.as_deref(), Some("1//r"));
        assert_eq!(token.expires_at, 1_700_000_000);
    }
}

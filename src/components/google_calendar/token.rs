use crate::config::Config;
use crate::error::{google_calendar_error, DaemonResult};
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Token endpoint used for code exchange and refresh
pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Seconds before expiry at which a token is already considered stale
const EXPIRY_MARGIN_SECS: i64 = 60;

/// OAuth token as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp
    pub expires_at: i64,
}

impl StoredToken {
    /// Whether the access token can still be used at `now` (unix seconds)
    pub fn is_fresh(&self, now: i64) -> bool {
        self.expires_at - EXPIRY_MARGIN_SECS > now
    }
}

/// Token response of the Google OAuth endpoint
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

impl TokenResponse {
    /// Convert to a stored token, keeping the previous refresh token if none was issued
    pub fn into_stored(self, previous_refresh: Option<&str>) -> DaemonResult<StoredToken> {
        let refresh_token = self
            .refresh_token
            .or_else(|| previous_refresh.map(str::to_string))
            .ok_or_else(|| google_calendar_error("Token response has no refresh token"))?;
        Ok(StoredToken {
            access_token: self.access_token,
            refresh_token,
            expires_at: Utc::now().timestamp() + self.expires_in.unwrap_or(3600),
        })
    }
}

#[derive(Clone)]
pub struct TokenManager {
    client_id: String,
    client_secret: String,
    path: PathBuf,
    client: Client,
    cached: Arc<Mutex<Option<StoredToken>>>,
}

impl TokenManager {
    pub fn new(config: &Config) -> Self {
        Self {
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            path: config.token_path.clone(),
            client: Client::new(),
            cached: Arc::new(Mutex::new(None)),
        }
    }

    /// Get a usable access token, refreshing it when it is about to expire
    pub async fn get_access_token(&self) -> DaemonResult<String> {
        let mut cached = self.cached.lock().await;
        let token = match cached.take() {
            Some(token) => token,
            None => read_token(&self.path).await?,
        };

        let token = if token.is_fresh(Utc::now().timestamp()) {
            token
        } else {
            debug!("Access token expired, refreshing");
            let refreshed = self.refresh_token(&token).await?;
            write_token(&self.path, &refreshed).await?;
            refreshed
        };

        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    /// Refresh an expired token
    async fn refresh_token(&self, token: &StoredToken) -> DaemonResult<StoredToken> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", token.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to refresh token: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(google_calendar_error(&format!(
                "Failed to refresh token: HTTP {} - {}",
                status, error_body
            )));
        }

        let new_token: TokenResponse = response.json().await.map_err(|e| {
            google_calendar_error(&format!("Failed to parse token response: {}", e))
        })?;

        new_token.into_stored(Some(&token.refresh_token))
    }

    /// Store a freshly obtained token (used by the token bootstrap binary)
    pub async fn set_token(&self, token: StoredToken) -> DaemonResult<()> {
        write_token(&self.path, &token).await?;
        *self.cached.lock().await = Some(token);
        info!("Token saved to {}", self.path.display());
        Ok(())
    }
}

async fn read_token(path: &Path) -> DaemonResult<StoredToken> {
    let content = fs::read_to_string(path).await.map_err(|e| {
        google_calendar_error(&format!(
            "Failed to read token from {}: {}. Run get_calendar_token first",
            path.display(),
            e
        ))
    })?;
    serde_json::from_str(&content)
        .map_err(|e| google_calendar_error(&format!("Failed to parse token JSON: {}", e)))
}

async fn write_token(path: &Path, token: &StoredToken) -> DaemonResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    let content = serde_json::to_string_pretty(token)?;
    fs::write(path, content).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_freshness_margin() {
        let token = StoredToken {
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_at: 1_000,
        };
        assert!(token.is_fresh(900));
        assert!(!token.is_fresh(950));
        assert!(!token.is_fresh(2_000));
    }

    #[test]
    fn test_refresh_keeps_previous_refresh_token() {
        let response = TokenResponse {
            access_token: "new".into(),
            refresh_token: None,
            expires_in: Some(120),
        };
        let stored = response.into_stored(Some("old-refresh")).unwrap();
        assert_eq!(stored.access_token, "new");
        assert_eq!(stored.refresh_token, "old-refresh");

        let response = TokenResponse {
            access_token: "new".into(),
            refresh_token: None,
            expires_in: None,
        };
        assert!(response.into_stored(None).is_err());
    }
}

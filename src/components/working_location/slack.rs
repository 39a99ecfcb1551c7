use super::{StatusSink, WorkingLocation};
use crate::error::{slack_error, DaemonResult};
use crate::utils::time::next_midnight;
use async_trait::async_trait;
use chrono::Local;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

const PROFILE_SET_URL: &str = "https://slack.com/api/users.profile.set";

#[derive(Debug, Serialize)]
struct ProfileUpdate<'a> {
    profile: Profile<'a>,
}

#[derive(Debug, Serialize)]
struct Profile<'a> {
    status_text: &'a str,
    status_emoji: &'a str,
    /// Unix timestamp
    status_expiration: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SlackResponse {
    ok: bool,
    error: Option<String>,
    warning: Option<String>,
}

/// Status text and emoji shown for a working location
fn status_for(location: WorkingLocation) -> (&'static str, &'static str) {
    match location {
        WorkingLocation::Home => ("Working from home", ":house_with_garden:"),
        WorkingLocation::Office => ("Working from the office", ":office:"),
    }
}

/// Slack profile status client
#[derive(Clone)]
pub struct SlackClient {
    token: String,
    client: Client,
}

impl SlackClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl StatusSink for SlackClient {
    async fn set_status(&self, location: WorkingLocation) -> DaemonResult<()> {
        let (status_text, status_emoji) = status_for(location);
        // Expire at the end of the day
        let status_expiration = next_midnight(&Local::now())
            .map(|midnight| midnight.timestamp())
            .unwrap_or_default();
        let body = ProfileUpdate {
            profile: Profile {
                status_text,
                status_emoji,
                status_expiration,
            },
        };

        let response = self
            .client
            .post(PROFILE_SET_URL)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| slack_error(&format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(slack_error(&format!(
                "Request failed with status {}",
                response.status()
            )));
        }

        let result: SlackResponse = response
            .json()
            .await
            .map_err(|e| slack_error(&format!("Failed to decode response: {}", e)))?;

        if !result.ok {
            return Err(slack_error(&format!(
                "Request failed: {}",
                result.error.unwrap_or_default()
            )));
        }
        if let Some(warning) = result.warning.filter(|w| !w.is_empty()) {
            warn!("Slack warning: {}", warning);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_payload() {
        let (status_text, status_emoji) = status_for(WorkingLocation::Home);
        let body = ProfileUpdate {
            profile: Profile {
                status_text,
                status_emoji,
                status_expiration: 1_700_000_000,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["profile"]["status_text"], "Working from home");
        assert_eq!(json["profile"]["status_emoji"], ":house_with_garden:");
        assert_eq!(json["profile"]["status_expiration"], 1_700_000_000);
        assert_eq!(status_for(WorkingLocation::Office).1, ":office:");
    }

    #[test]
    fn test_response_decoding() {
        let failed: SlackResponse =
            serde_json::from_str(r#"{"ok": false, "error": "invalid_auth"}"#).unwrap();
        assert!(!failed.ok);
        assert_eq!(failed.error.as_deref(), Some("invalid_auth"));

        let ok: SlackResponse = serde_json::from_str(r#"{"ok": true}"#).unwrap();
        assert!(ok.ok);
        assert!(ok.warning.is_none());
    }
}

use crate::error::{config_error, env_error, DaemonResult, Error};
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default location of the OAuth token file
pub const DEFAULT_TOKEN_PATH: &str = "config/google_token.json";
/// Default location of the settings file
pub const DEFAULT_SETTINGS_PATH: &str = "config/settings.toml";

/// Longest accepted calendar lookahead
pub const MAX_LOOKAHEAD_HOURS: u64 = 24 * 366;
/// Longest accepted polling or notify interval
pub const MAX_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Component names as used in the `[components]` table
pub mod components {
    pub const EVENT_RECONCILER: &str = "event_reconciler";
    pub const REMINDER_NOTIFIER: &str = "reminder_notifier";
    pub const WORKING_LOCATION: &str = "working_location";
}

/// Main configuration structure for the daemon
#[derive(Debug, Clone)]
pub struct Config {
    /// Google Calendar API client ID
    pub google_client_id: String,
    /// Google Calendar API client secret
    pub google_client_secret: String,
    /// Google Calendar ID to watch
    pub google_calendar_id: String,
    /// Where the OAuth token is stored between runs
    pub token_path: PathBuf,
    /// Slack user token; the working location component needs it
    pub slack_token: Option<String>,
    /// Settings file that was looked up
    pub settings_path: PathBuf,
    /// Timing and component settings
    pub settings: Settings,
}

/// Settings read from the TOML settings file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub poll_interval_secs: u64,
    pub lookahead_hours: u64,
    pub notify_interval_secs: u64,
    pub location_poll_interval_secs: u64,
    /// IANA timezone for notification titles; unset shows the offset the
    /// calendar reports for the event
    pub timezone: Option<String>,
    pub debug: bool,
    pub components: HashMap<String, bool>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 180,
            lookahead_hours: 24,
            notify_interval_secs: 5,
            location_poll_interval_secs: 900,
            timezone: None,
            debug: false,
            components: HashMap::new(),
        }
    }
}

impl Settings {
    /// Parse settings from TOML text and validate them
    pub fn from_toml(content: &str) -> DaemonResult<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> DaemonResult<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn validate(&self) -> DaemonResult<()> {
        let intervals = [
            self.poll_interval_secs,
            self.notify_interval_secs,
            self.location_poll_interval_secs,
        ];
        if intervals.iter().any(|secs| *secs == 0 || *secs > MAX_INTERVAL_SECS) {
            return Err(config_error(&format!(
                "Intervals must be between 1 and {} seconds",
                MAX_INTERVAL_SECS
            )));
        }
        if self.lookahead_hours == 0 || self.lookahead_hours > MAX_LOOKAHEAD_HOURS {
            return Err(config_error(&format!(
                "lookahead_hours must be between 1 and {}",
                MAX_LOOKAHEAD_HOURS
            )));
        }
        self.tz()?;
        Ok(())
    }

    /// Parsed timezone, if one is configured
    pub fn tz(&self) -> DaemonResult<Option<Tz>> {
        self.timezone
            .as_deref()
            .map(|name| {
                name.parse::<Tz>()
                    .map_err(|e| config_error(&format!("Invalid timezone '{}': {}", name, e)))
            })
            .transpose()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn lookahead(&self) -> chrono::Duration {
        chrono::Duration::hours(self.lookahead_hours as i64)
    }

    pub fn notify_interval(&self) -> Duration {
        Duration::from_secs(self.notify_interval_secs)
    }

    pub fn location_poll_interval(&self) -> Duration {
        Duration::from_secs(self.location_poll_interval_secs)
    }

    /// Check if a component is enabled; components are on unless switched off
    pub fn is_component_enabled(&self, name: &str) -> bool {
        *self.components.get(name).unwrap_or(&true)
    }
}

impl Config {
    /// Load configuration from environment and settings file
    pub fn load() -> DaemonResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        // Required environment variables
        let google_client_id =
            env::var("GOOGLE_CLIENT_ID").map_err(|_| env_error("GOOGLE_CLIENT_ID"))?;
        let google_client_secret =
            env::var("GOOGLE_CLIENT_SECRET").map_err(|_| env_error("GOOGLE_CLIENT_SECRET"))?;
        let google_calendar_id =
            env::var("GOOGLE_CALENDAR_ID").map_err(|_| env_error("GOOGLE_CALENDAR_ID"))?;

        let token_path = env::var("GOOGLE_TOKEN_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_TOKEN_PATH));

        let slack_token = Self::load_slack_token()?;

        let settings_path = env::var("SETTINGS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SETTINGS_PATH));
        let settings = Settings::load(&settings_path)?;

        Ok(Config {
            google_client_id,
            google_client_secret,
            google_calendar_id,
            token_path,
            slack_token,
            settings_path,
            settings,
        })
    }

    /// Slack token from SLACK_TOKEN, or read from the file named by SLACK_TOKEN_FILE
    fn load_slack_token() -> DaemonResult<Option<String>> {
        if let Ok(token) = env::var("SLACK_TOKEN") {
            return Ok(Some(token.trim().to_string()));
        }
        match env::var("SLACK_TOKEN_FILE") {
            Ok(path) => {
                let token = fs::read_to_string(&path).map_err(|e| {
                    config_error(&format!("Failed to read slack token file {}: {}", path, e))
                })?;
                Ok(Some(token.trim().to_string()))
            }
            Err(_) => Ok(None),
        }
    }

    /// Check if a component is enabled
    pub fn is_component_enabled(&self, name: &str) -> bool {
        self.settings.is_component_enabled(name)
    }
}

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for the daemon
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Environment error: {0}")]
    #[diagnostic(code(muistuttaja::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(muistuttaja::config))]
    Config(String),

    /// Calendar query failed; the caller retries on its next tick.
    #[error("Google Calendar API error: {0}")]
    #[diagnostic(code(muistuttaja::google_calendar))]
    GoogleCalendar(String),

    /// Sending or closing a desktop notification failed.
    #[error("Notification error: {0}")]
    #[diagnostic(code(muistuttaja::notification))]
    Notification(String),

    /// The notification transport could not be reached at startup.
    #[error("Notification setup error: {0}")]
    #[diagnostic(
        code(muistuttaja::notification_setup),
        help("is a notification daemon running on the session bus?")
    )]
    NotificationSetup(String),

    #[error("Slack API error: {0}")]
    #[diagnostic(code(muistuttaja::slack))]
    Slack(String),

    /// A single record could not be interpreted and was skipped.
    #[error("Validation error: {0}")]
    #[diagnostic(code(muistuttaja::validation))]
    Validation(String),

    #[error(transparent)]
    #[diagnostic(code(muistuttaja::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(muistuttaja::serialization))]
    Serialization(String),

    #[error("Cancelled")]
    #[diagnostic(code(muistuttaja::cancelled))]
    Cancelled,

    #[error("Other error: {0}")]
    #[diagnostic(code(muistuttaja::other))]
    Other(String),
}

impl Error {
    /// Whether this error only signals a graceful shutdown
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

// Implement From for TOML deserialization errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Other(format!("HTTP error: {}", err))
    }
}

/// Type alias for Result with our Error type
pub type DaemonResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create Google Calendar errors
pub fn google_calendar_error(message: &str) -> Error {
    Error::GoogleCalendar(message.to_string())
}

/// Helper to create notification errors
pub fn notification_error(message: &str) -> Error {
    Error::Notification(message.to_string())
}

/// Helper to create Slack errors
pub fn slack_error(message: &str) -> Error {
    Error::Slack(message.to_string())
}

/// Helper to create validation errors
pub fn validation_error(message: &str) -> Error {
    Error::Validation(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}

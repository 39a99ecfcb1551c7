use crate::components::desktop_notify::{DesktopNotifier, NotificationSink};
use crate::components::google_calendar::{CalendarSource, GoogleCalendarHandle};
use crate::components::reminders::{EventReconciler, EventStore, ReminderNotifier};
use crate::components::working_location::{LocationMatcher, SlackClient};
use crate::components::ComponentManager;
use crate::config::{components, Config};
use crate::error::{DaemonResult, Error};
use crate::shutdown;
use crate::utils::browser::SystemBrowser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging(debug: bool) -> DaemonResult<()> {
    let default_filter = if debug {
        "info,muistuttaja=debug"
    } else {
        "info,muistuttaja=info"
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the daemon configuration
pub fn load_config() -> DaemonResult<Config> {
    Config::load()
}

/// Build the components described by the configuration
pub async fn build_components(
    config: &Config,
) -> DaemonResult<(ComponentManager, GoogleCalendarHandle)> {
    let settings = &config.settings;
    let calendar = GoogleCalendarHandle::new(config);
    let source: Arc<dyn CalendarSource> = Arc::new(calendar.clone());
    let mut manager = ComponentManager::new();

    let reminders_enabled = config.is_component_enabled(components::EVENT_RECONCILER)
        || config.is_component_enabled(components::REMINDER_NOTIFIER);
    if reminders_enabled {
        // Without a notification server there is nothing to remind with
        let (notifier, signals) = DesktopNotifier::connect().await?;
        let sink: Arc<dyn NotificationSink> = Arc::new(notifier);
        let store = Arc::new(EventStore::new());

        if config.is_component_enabled(components::EVENT_RECONCILER) {
            manager.register(EventReconciler::new(
                Arc::clone(&source),
                Arc::clone(&sink),
                Arc::clone(&store),
                settings.poll_interval(),
                settings.lookahead(),
            ));
        }
        if config.is_component_enabled(components::REMINDER_NOTIFIER) {
            manager.register(ReminderNotifier::new(
                store,
                sink,
                Arc::new(SystemBrowser),
                signals,
                settings.notify_interval(),
                settings.tz()?,
            ));
        }
    }

    if config.is_component_enabled(components::WORKING_LOCATION) {
        match &config.slack_token {
            Some(token) => manager.register(LocationMatcher::new(
                Arc::clone(&source),
                Arc::new(SlackClient::new(token.clone())),
                settings.location_poll_interval(),
            )),
            None => warn!("Working location component enabled but no Slack token configured"),
        }
    }

    Ok((manager, calendar))
}

/// Run the daemon until interrupted or a component fails
pub async fn start_daemon(config: Config) -> DaemonResult<()> {
    if config.settings_path.exists() {
        info!("Using settings from {}", config.settings_path.display());
    } else {
        info!(
            "No settings file at {}, using defaults",
            config.settings_path.display()
        );
    }

    let (manager, calendar) = build_components(&config).await?;
    info!("Running components: {:?}", manager.names());

    let shutdown_token = CancellationToken::new();
    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown::handle_signals(signal_token).await;
    });

    let result = manager.run_all(shutdown_token).await;

    if let Err(e) = calendar.shutdown().await {
        error!("Error shutting down Google Calendar actor: {:?}", e);
    }

    result
}

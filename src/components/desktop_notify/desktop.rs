use super::{
    CloseReason, NotificationAction, NotificationHandle, NotificationRequest, NotificationSignal,
    NotificationSink,
};
use crate::error::{notification_error, DaemonResult, Error};
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use zbus::zvariant::Value;
use zbus::{proxy, Connection};

/// Application name reported to the notification server
pub const APP_NAME: &str = "muistuttaja";

/// Let the server pick how long a notification stays up
const SERVER_DEFAULT_TIMEOUT: i32 = -1;

#[proxy(
    interface = "org.freedesktop.Notifications",
    default_service = "org.freedesktop.Notifications",
    default_path = "/org/freedesktop/Notifications"
)]
trait Notifications {
    #[allow(clippy::too_many_arguments)]
    fn notify(
        &self,
        app_name: &str,
        replaces_id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: &[&str],
        hints: HashMap<&str, &Value<'_>>,
        expire_timeout: i32,
    ) -> zbus::Result<u32>;

    fn close_notification(&self, id: u32) -> zbus::Result<()>;

    /// name, vendor, version, spec version
    fn get_server_information(&self) -> zbus::Result<(String, String, String, String)>;

    #[zbus(signal)]
    fn action_invoked(&self, id: u32, action_key: &str) -> zbus::Result<()>;

    #[zbus(signal)]
    fn notification_closed(&self, id: u32, reason: u32) -> zbus::Result<()>;
}

/// Flatten actions into the `[key, label, key, label, ...]` wire form
fn action_list(actions: &[NotificationAction]) -> Vec<&str> {
    actions
        .iter()
        .flat_map(|action| [action.key.as_str(), action.label.as_str()])
        .collect()
}

/// Notification sink talking to the freedesktop notification server over
/// the session bus
#[derive(Clone)]
pub struct DesktopNotifier {
    proxy: NotificationsProxy<'static>,
}

impl DesktopNotifier {
    /// Connect to the notification server.
    ///
    /// Returns the notifier and the stream of action/closed signals. Both use
    /// the same bus connection, so no signal for a sent notification is missed.
    pub async fn connect() -> DaemonResult<(Self, mpsc::UnboundedReceiver<NotificationSignal>)> {
        let setup_error =
            |e: zbus::Error| Error::NotificationSetup(format!("Session bus unavailable: {}", e));

        let connection = Connection::session().await.map_err(setup_error)?;
        let proxy = NotificationsProxy::new(&connection)
            .await
            .map_err(setup_error)?;

        let (name, vendor, version, _) = proxy.get_server_information().await.map_err(|e| {
            Error::NotificationSetup(format!("Failed to reach notification server: {}", e))
        })?;
        info!(
            "Connected to notification server {} {} ({})",
            name, version, vendor
        );

        let mut actions = proxy.receive_action_invoked().await.map_err(setup_error)?;
        let mut closed = proxy
            .receive_notification_closed()
            .await
            .map_err(setup_error)?;

        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            loop {
                let signal = tokio::select! {
                    Some(signal) = actions.next() => match signal.args() {
                        Ok(args) => NotificationSignal::ActionInvoked {
                            handle: *args.id(),
                            action_key: args.action_key().to_string(),
                        },
                        Err(e) => {
                            warn!("Malformed ActionInvoked signal: {}", e);
                            continue;
                        }
                    },
                    Some(signal) = closed.next() => match signal.args() {
                        Ok(args) => NotificationSignal::Closed {
                            handle: *args.id(),
                            reason: CloseReason::from_code(*args.reason()),
                        },
                        Err(e) => {
                            warn!("Malformed NotificationClosed signal: {}", e);
                            continue;
                        }
                    },
                    else => break,
                };
                if signal_tx.send(signal).is_err() {
                    break;
                }
            }
            debug!("Notification signal forwarding stopped");
        });

        Ok((Self { proxy }, signal_rx))
    }
}

#[async_trait]
impl NotificationSink for DesktopNotifier {
    async fn send(&self, request: NotificationRequest) -> DaemonResult<NotificationHandle> {
        let id = self
            .proxy
            .notify(
                APP_NAME,
                0,
                request.icon.icon_name(),
                &request.title,
                &request.body,
                &action_list(&request.actions),
                HashMap::new(),
                SERVER_DEFAULT_TIMEOUT,
            )
            .await
            .map_err(|e| notification_error(&format!("Failed to send notification: {}", e)))?;

        debug!("Sent notification id={}", id);
        Ok(id)
    }

    async fn close(&self, handle: NotificationHandle) -> DaemonResult<()> {
        self.proxy.close_notification(handle).await.map_err(|e| {
            notification_error(&format!("Failed to close notification {}: {}", handle, e))
        })?;

        debug!("Closed notification id={}", handle);
        Ok(())
    }
}

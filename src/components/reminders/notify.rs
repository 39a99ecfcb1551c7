use super::store::{EventStore, FireOutcome};
use crate::components::desktop_notify::{NotificationSignal, NotificationSink};
use crate::components::Component;
use crate::config::components::REMINDER_NOTIFIER;
use crate::error::{other_error, DaemonResult, Error};
use crate::utils::browser::LinkOpener;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Fires due reminders and reacts to notification clicks and dismissals
pub struct ReminderNotifier {
    store: Arc<EventStore>,
    sink: Arc<dyn NotificationSink>,
    opener: Arc<dyn LinkOpener>,
    signals: Mutex<Option<mpsc::UnboundedReceiver<NotificationSignal>>>,
    interval: Duration,
    tz: Option<Tz>,
}

impl ReminderNotifier {
    pub fn new(
        store: Arc<EventStore>,
        sink: Arc<dyn NotificationSink>,
        opener: Arc<dyn LinkOpener>,
        signals: mpsc::UnboundedReceiver<NotificationSignal>,
        interval: Duration,
        tz: Option<Tz>,
    ) -> Self {
        Self {
            store,
            sink,
            opener,
            signals: Mutex::new(Some(signals)),
            interval,
            tz,
        }
    }

    /// One notify cycle at `now`
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> FireOutcome {
        let outcome = self.store.fire_due(now, self.tz.as_ref(), self.sink.as_ref()).await;
        if outcome != FireOutcome::default() {
            debug!(
                "Notify cycle: {} fired, {} failed, {} expired",
                outcome.fired, outcome.failed, outcome.expired
            );
        }
        outcome
    }

    /// Apply one signal from the notification transport
    pub async fn handle_signal(&self, signal: NotificationSignal) {
        match signal {
            NotificationSignal::ActionInvoked { handle, action_key } => {
                debug!("Notification action: key={} id={}", action_key, handle);
                if let Some(url) = self.store.link_for(handle).await {
                    let opener = Arc::clone(&self.opener);
                    tokio::task::spawn_blocking(move || {
                        if let Err(e) = opener.open(&url) {
                            error!("{}", e);
                        }
                    });
                }
            }
            NotificationSignal::Closed { handle, reason } => {
                debug!("Notification closed: reason={:?} id={}", reason, handle);
                self.store.dismiss(handle).await;
            }
        }
    }
}

#[async_trait]
impl Component for ReminderNotifier {
    fn name(&self) -> &'static str {
        REMINDER_NOTIFIER
    }

    async fn run(&self, shutdown: CancellationToken) -> DaemonResult<()> {
        let mut signals = self
            .signals
            .lock()
            .await
            .take()
            .ok_or_else(|| other_error("Reminder notifier is already running"))?;

        info!("Checking reminders every {:?}", self.interval);
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return Err(Error::Cancelled),
                _ = ticker.tick() => {
                    self.run_cycle(Utc::now()).await;
                }
                _ = self.store.check_requested() => {
                    self.run_cycle(Utc::now()).await;
                }
                Some(signal) = signals.recv() => {
                    self.handle_signal(signal).await;
                }
            }
        }
    }
}

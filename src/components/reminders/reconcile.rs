use super::models::observe;
use super::store::{ApplyOutcome, EventStore};
use crate::components::desktop_notify::NotificationSink;
use crate::components::google_calendar::{CalendarSource, EventQuery};
use crate::components::Component;
use crate::config::components::EVENT_RECONCILER;
use crate::error::{DaemonResult, Error};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Periodically mirrors the calendar into the event store
pub struct EventReconciler {
    source: Arc<dyn CalendarSource>,
    sink: Arc<dyn NotificationSink>,
    store: Arc<EventStore>,
    poll_interval: Duration,
    lookahead: chrono::Duration,
}

impl EventReconciler {
    pub fn new(
        source: Arc<dyn CalendarSource>,
        sink: Arc<dyn NotificationSink>,
        store: Arc<EventStore>,
        poll_interval: Duration,
        lookahead: chrono::Duration,
    ) -> Self {
        Self {
            source,
            sink,
            store,
            poll_interval,
            lookahead,
        }
    }

    /// Fetch the window starting at `now` and apply it to the store.
    ///
    /// A failed fetch leaves the store untouched.
    pub async fn reconcile_once(&self, now: DateTime<Utc>) -> DaemonResult<ApplyOutcome> {
        let query = EventQuery::timed(now, now + self.lookahead);
        let list = self.source.list_events(query).await?;

        let observed = observe(&list);
        let outcome = self.store.apply(observed).await;
        debug!(
            "Reconciled {} events: {} new, {} changed, {} removed",
            list.items.len(),
            outcome.inserted,
            outcome.replaced,
            outcome.removed
        );

        if !outcome.to_close.is_empty() {
            for handle in &outcome.to_close {
                if let Err(e) = self.sink.close(*handle).await {
                    error!("Failed to close notification {}: {}", handle, e);
                }
            }
            self.store.request_check();
        }

        Ok(outcome)
    }
}

#[async_trait]
impl Component for EventReconciler {
    fn name(&self) -> &'static str {
        EVENT_RECONCILER
    }

    async fn run(&self, shutdown: CancellationToken) -> DaemonResult<()> {
        info!(
            "Polling calendar every {:?} with {}h lookahead",
            self.poll_interval,
            self.lookahead.num_hours()
        );
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return Err(Error::Cancelled),
                _ = ticker.tick() => {}
            }

            tokio::select! {
                _ = shutdown.cancelled() => return Err(Error::Cancelled),
                result = self.reconcile_once(Utc::now()) => {
                    if let Err(e) = result {
                        error!("Failed to query event list: {}", e);
                    }
                }
            }
        }
    }
}

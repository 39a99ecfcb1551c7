//! Reconciled in-memory event state.
//!
//! The store keeps two indices under a single lock: tracked events by id, and
//! the notifications currently on screen mapped back to the event that raised
//! them. Every public method is one transaction over both, so callers never
//! see a notification handle without its fired reminder.

use super::models::{DropReason, Event, Observed};
use crate::components::desktop_notify::{NotificationHandle, NotificationSink};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::collections::{HashMap, HashSet};
use tokio::sync::{Mutex, Notify};
use tracing::{debug, error};

#[derive(Debug, Default)]
struct StoreState {
    events: HashMap<String, Event>,
    /// Notification handle -> id of the event it belongs to
    active: HashMap<NotificationHandle, String>,
}

impl StoreState {
    /// Remove an event together with its active handles, returning the
    /// handles of every notification it raised
    fn remove(&mut self, id: &str) -> Vec<NotificationHandle> {
        match self.events.remove(id) {
            Some(event) => self.forget_handles(&event),
            None => Vec::new(),
        }
    }

    fn forget_handles(&mut self, event: &Event) -> Vec<NotificationHandle> {
        event
            .fired_handles()
            .inspect(|handle| {
                self.active.remove(handle);
            })
            .collect()
    }
}

/// Result of applying one fetch
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub inserted: usize,
    pub replaced: usize,
    pub removed: usize,
    /// Notifications belonging to replaced or removed events
    pub to_close: Vec<NotificationHandle>,
}

/// Result of one notify cycle
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FireOutcome {
    pub expired: usize,
    pub fired: usize,
    pub failed: usize,
}

#[derive(Debug, Default)]
pub struct EventStore {
    state: Mutex<StoreState>,
    check: Notify,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one fetch result atomically.
    ///
    /// Unknown ids are inserted, changed events replaced with fresh reminders,
    /// cancelled/declined events and ids missing from the fetch removed.
    /// Invalid records keep whatever is tracked for them.
    pub async fn apply(&self, observed: Vec<Observed>) -> ApplyOutcome {
        let mut state = self.state.lock().await;
        let mut outcome = ApplyOutcome::default();
        let seen: HashSet<String> = observed.iter().map(|o| o.id().to_string()).collect();

        for entry in observed {
            match entry {
                Observed::Active(event) => match state
                    .events
                    .get(&event.id)
                    .map(|existing| existing.same_content(&event))
                {
                    None => {
                        debug!(
                            "New event: summary={:?} start={} end={} reminders={:?}",
                            event.summary, event.start, event.end, event.reminders
                        );
                        state.events.insert(event.id.clone(), event);
                        outcome.inserted += 1;
                    }
                    Some(true) => {}
                    Some(false) => {
                        debug!("Changed event: summary={:?}", event.summary);
                        let handles = state.remove(&event.id);
                        outcome.to_close.extend(handles);
                        state.events.insert(event.id.clone(), event);
                        outcome.replaced += 1;
                    }
                },
                Observed::Dropped { id, reason } => {
                    if state.events.contains_key(&id) {
                        match reason {
                            DropReason::Cancelled => debug!("Event {} cancelled", id),
                            DropReason::Declined => debug!("Not attending event {}", id),
                        }
                        let handles = state.remove(&id);
                        outcome.to_close.extend(handles);
                        outcome.removed += 1;
                    }
                }
                Observed::Invalid { .. } => {}
            }
        }

        let deleted: Vec<String> = state
            .events
            .keys()
            .filter(|id| !seen.contains(*id))
            .cloned()
            .collect();
        for id in deleted {
            debug!("Event {} deleted", id);
            let handles = state.remove(&id);
            outcome.to_close.extend(handles);
            outcome.removed += 1;
        }

        outcome
    }

    /// Drop ended events and fire every reminder that is due at `now`.
    ///
    /// A failed send still marks the reminder fired so it is not retried.
    pub async fn fire_due(
        &self,
        now: DateTime<Utc>,
        tz: Option<&Tz>,
        sink: &dyn NotificationSink,
    ) -> FireOutcome {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let mut outcome = FireOutcome::default();

        let ended: Vec<String> = state
            .events
            .values()
            .filter(|e| e.has_ended(&now))
            .map(|e| e.id.clone())
            .collect();
        for id in ended {
            debug!("Event {} ended", id);
            state.remove(&id);
            outcome.expired += 1;
        }

        for event in state.events.values_mut() {
            let due: Vec<usize> = event
                .reminders
                .iter()
                .enumerate()
                .filter(|(_, r)| r.is_due(&event.start, &now))
                .map(|(i, _)| i)
                .collect();

            for index in due {
                let request = event.notification(tz);
                let title = request.title.clone();
                let handle = match sink.send(request).await {
                    Ok(handle) => {
                        debug!("Sent notification: summary={:?} id={}", title, handle);
                        state.active.insert(handle, event.id.clone());
                        outcome.fired += 1;
                        Some(handle)
                    }
                    Err(e) => {
                        error!("Failed to send notification for {:?}: {}", title, e);
                        outcome.failed += 1;
                        None
                    }
                };
                let reminder = &mut event.reminders[index];
                reminder.fired = true;
                reminder.handle = handle;
            }
        }

        outcome
    }

    /// Forget an on-screen notification; its reminder stays fired
    pub async fn dismiss(&self, handle: NotificationHandle) -> bool {
        self.state.lock().await.active.remove(&handle).is_some()
    }

    /// Link to open for an on-screen notification, if any
    pub async fn link_for(&self, handle: NotificationHandle) -> Option<String> {
        let state = self.state.lock().await;
        let id = state.active.get(&handle)?;
        state
            .events
            .get(id)
            .and_then(|event| event.preferred_link())
            .map(str::to_string)
    }

    /// Ask the notify loop for an extra cycle. Requests made while one is
    /// pending collapse into it.
    pub fn request_check(&self) {
        self.check.notify_one();
    }

    /// Wait until a check was requested
    pub async fn check_requested(&self) {
        self.check.notified().await
    }

    /// Copy of a tracked event
    pub async fn get(&self, id: &str) -> Option<Event> {
        self.state.lock().await.events.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.events.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn is_active(&self, handle: NotificationHandle) -> bool {
        self.state.lock().await.active.contains_key(&handle)
    }

    pub async fn active_count(&self) -> usize {
        self.state.lock().await.active.len()
    }
}

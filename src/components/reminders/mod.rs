//! Calendar reminders delivered as desktop notifications.
//!
//! [`EventReconciler`] keeps the [`EventStore`] in line with the calendar,
//! [`ReminderNotifier`] turns due reminders into notifications. Both share
//! the store; the reconciler asks for an early notify cycle whenever it
//! retracts notifications.

pub mod models;
mod notify;
mod reconcile;
pub mod store;

pub use models::{Event, Reminder};
pub use notify::ReminderNotifier;
pub use reconcile::EventReconciler;
pub use store::{ApplyOutcome, EventStore, FireOutcome};

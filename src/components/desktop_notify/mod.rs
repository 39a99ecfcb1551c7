mod desktop;

pub use desktop::DesktopNotifier;

use crate::error::DaemonResult;
use async_trait::async_trait;

/// Opaque id assigned to a notification by the transport
pub type NotificationHandle = u32;

/// Key of the action triggered by clicking the notification body
pub const DEFAULT_ACTION: &str = "default";

/// Icon shown with a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconHint {
    Calendar,
    /// The event has a conferencing link
    VideoCall,
}

impl IconHint {
    /// Freedesktop icon name
    pub fn icon_name(&self) -> &'static str {
        match self {
            IconHint::Calendar => "x-office-calendar",
            IconHint::VideoCall => "camera-web",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationAction {
    pub key: String,
    pub label: String,
}

/// A notification to display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    pub icon: IconHint,
    pub actions: Vec<NotificationAction>,
}

/// Why a notification disappeared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Expired,
    Dismissed,
    /// Closed through `NotificationSink::close`
    CloseAction,
    Undefined,
}

impl CloseReason {
    /// Map the reason code of a `NotificationClosed` signal
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => CloseReason::Expired,
            2 => CloseReason::Dismissed,
            3 => CloseReason::CloseAction,
            _ => CloseReason::Undefined,
        }
    }
}

/// Signals delivered asynchronously by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationSignal {
    ActionInvoked {
        handle: NotificationHandle,
        action_key: String,
    },
    Closed {
        handle: NotificationHandle,
        reason: CloseReason,
    },
}

/// Desktop notification transport
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Display a notification and return its handle
    async fn send(&self, request: NotificationRequest) -> DaemonResult<NotificationHandle>;

    /// Retract a previously sent notification
    async fn close(&self, handle: NotificationHandle) -> DaemonResult<()>;
}

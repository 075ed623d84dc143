//! Transient user notifications.
//!
//! A notification appears immediately, starts fading after
//! [`NOTIFICATION_DISPLAY`] and is removed [`NOTIFICATION_FADE`] later.

use std::time::Duration;

/// How long a notification stays fully visible.
pub const NOTIFICATION_DISPLAY: Duration = Duration::from_millis(3000);
/// Length of the fade-out before removal.
pub const NOTIFICATION_FADE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

impl NotificationLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Error => "error",
        }
    }
}

/// A message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Unique per controller; used to fade and remove it later.
    pub id: u64,
    pub level: NotificationLevel,
    pub message: String,
}

/// Visibility stage of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationStage {
    Shown,
    Fading,
    Removed,
}

//! Auto-dismissing notifications.
//!
//! Every user-facing message goes through [`Notifier::notify`]: it is
//! shown at once, marked fading after the display period and removed
//! once the fade has run.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use acctbatch_core::notification::{Notification, NotificationLevel, NotificationStage};

use crate::view::View;

pub struct Notifier {
    view: Arc<dyn View>,
    next_id: AtomicU64,
    display: Duration,
    fade: Duration,
}

impl Notifier {
    pub fn new(view: Arc<dyn View>, display: Duration, fade: Duration) -> Self {
        Self {
            view,
            next_id: AtomicU64::new(1),
            display,
            fade,
        }
    }

    /// Show a notification and schedule its dismissal. Returns its id.
    ///
    /// Outside a tokio runtime the notification is shown but stays until
    /// the front end clears it.
    pub fn notify(&self, level: NotificationLevel, message: impl Into<String>) -> u64 {
        let notification = Notification {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            level,
            message: message.into(),
        };
        let id = notification.id;

        tracing::debug!(id, level = level.as_str(), message = %notification.message, "Notification shown");
        self.view.notify(&notification);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let view = Arc::clone(&self.view);
                let (display, fade) = (self.display, self.fade);
                handle.spawn(async move {
                    tokio::time::sleep(display).await;
                    view.set_notification_stage(id, NotificationStage::Fading);
                    tokio::time::sleep(fade).await;
                    view.set_notification_stage(id, NotificationStage::Removed);
                });
            }
            Err(_) => {
                tracing::warn!(id, "No runtime available, notification will not auto-dismiss");
            }
        }

        id
    }

    pub fn info(&self, message: impl Into<String>) -> u64 {
        self.notify(NotificationLevel::Info, message)
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.notify(NotificationLevel::Error, message)
    }
}

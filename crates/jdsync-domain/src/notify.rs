//! User-facing notifications.
//!
//! The host decides how a notification is shown. The engine only calls
//! [`Notifier::notify`] and never waits on delivery.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

/// Title used for every notification the engine sends.
pub const NOTIFICATION_TITLE: &str = "JD Cookie Sync";

/// A notification as sent by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub subtitle: String,
    pub body: String,
}

/// Delivers notifications to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, subtitle: &str, body: &str);
}

/// Shared notifier handle.
pub type SharedNotifier = Arc<dyn Notifier>;

/// Notifier that only writes to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, subtitle: &str, body: &str) {
        tracing::info!(title, subtitle, body, "Notification");
    }
}

/// Notifier that keeps every notification in memory.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notification sent so far.
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }

    /// Remove and return every notification sent so far.
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.sent.lock())
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, title: &str, subtitle: &str, body: &str) {
        self.sent.lock().push(Notification {
            title: title.to_string(),
            subtitle: subtitle.to_string(),
            body: body.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_notifier_records() {
        let notifier = MemoryNotifier::new();
        notifier.notify(NOTIFICATION_TITLE, "Sync succeeded", "Account: user1");

        let sent = notifier.take();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subtitle, "Sync succeeded");
        assert!(notifier.sent().is_empty());
    }
}

//! Driven port for user-facing notifications (toasts in a view layer).

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    /// An action completed.
    Success,
    /// An action failed.
    Error,
}

/// A transient message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Severity.
    pub level: NotificationLevel,
    /// Text shown to the user.
    pub message: String,
}

impl Notification {
    /// Success notification.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    /// Error notification.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// Sink for notifications raised by the services.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    /// Deliver one notification.
    fn notify(&self, notification: Notification);
}

/// Notifier that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpNotifier;

impl Notifier for NoOpNotifier {
    fn notify(&self, _notification: Notification) {}
}

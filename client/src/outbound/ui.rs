//! Tracing-backed view sinks used by the command-line front end.
//!
//! A graphical shell would render toasts and perform redirects; the CLI
//! records them as structured log events instead.

use tracing::{info, warn};

use crate::domain::ports::{Navigator, Notification, NotificationLevel, Notifier, Route};

/// Notifier that emits each notification as a log event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => info!(text = %notification.message, "notification"),
            NotificationLevel::Error => warn!(text = %notification.message, "notification"),
        }
    }
}

/// Navigator that logs requested redirects.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, route: Route) {
        info!(path = route.path(), "navigation requested");
    }
}

//! Test utilities for the client crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Only compiled for tests or with the `test-support` feature.

mod scripted_source;

pub use scripted_source::ScriptedTodoSource;

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;

use crate::domain::Todo;
use crate::domain::ports::{Navigator, Notification, NotificationLevel, Notifier, Route, Sleeper};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("test support mutex poisoned"),
    }
}

/// Build a todo with no description or owner.
#[must_use]
pub fn todo(id: u64, title: &str, completed: bool) -> Todo {
    Todo::new(id, title, completed)
}

/// Notifier that records everything it is asked to show.
#[derive(Debug, Default)]
pub struct RecordingNotifier(Mutex<Vec<Notification>>);

impl RecordingNotifier {
    /// All notifications, oldest first.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        lock(&self.0).clone()
    }

    /// Number of notifications at `level`.
    #[must_use]
    pub fn count(&self, level: NotificationLevel) -> usize {
        lock(&self.0)
            .iter()
            .filter(|notification| notification.level == level)
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        lock(&self.0).push(notification);
    }
}

/// Navigator that records requested routes.
#[derive(Debug, Default)]
pub struct RecordingNavigator(Mutex<Vec<Route>>);

impl RecordingNavigator {
    /// Routes requested so far, oldest first.
    #[must_use]
    pub fn routes(&self) -> Vec<Route> {
        lock(&self.0).clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        lock(&self.0).push(route);
    }
}

/// Sleeper that returns immediately but records requested delays.
#[derive(Debug, Default)]
pub struct ImmediateSleeper(Mutex<Vec<Duration>>);

impl ImmediateSleeper {
    /// Delays requested so far.
    #[must_use]
    pub fn delays(&self) -> Vec<Duration> {
        lock(&self.0).clone()
    }
}

#[async_trait]
impl Sleeper for ImmediateSleeper {
    async fn sleep(&self, duration: Duration) {
        lock(&self.0).push(duration);
    }
}

/// Clock whose time only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    /// Clock frozen at `now`.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Move the clock forward.
    pub fn advance(&self, delta: Duration) {
        let step = match TimeDelta::from_std(delta) {
            Ok(step) => step,
            Err(error) => panic!("failed to convert Duration to TimeDelta: {error}"),
        };
        *lock(&self.0) += step;
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *lock(&self.0)
    }
}

/// Temporary storage directory removed on drop.
#[must_use]
pub fn temp_storage_dir() -> tempfile::TempDir {
    match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(error) => panic!("failed to create temporary storage dir: {error}"),
    }
}

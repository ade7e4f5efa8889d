//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod auth_gate;
mod cache_key;
mod navigator;
mod notifier;
mod sleeper;
mod storage;
mod todo_source;

#[cfg(test)]
pub use auth_gate::MockAuthGate;
pub use auth_gate::{AnonymousGate, AuthGate};
pub use cache_key::{QueryKey, QueryKeyValidationError};
#[cfg(test)]
pub use navigator::MockNavigator;
pub use navigator::{Navigator, NoOpNavigator, Route};
#[cfg(test)]
pub use notifier::MockNotifier;
pub use notifier::{NoOpNotifier, Notification, NotificationLevel, Notifier};
pub use sleeper::{Sleeper, TokioSleeper};
#[cfg(test)]
pub use storage::MockKeyValueStorage;
pub use storage::{InMemoryStorage, KeyValueStorage, StorageError};
#[cfg(test)]
pub use todo_source::MockTodoSource;
pub use todo_source::{FIXTURE_CREATED_ID, FixtureTodoSource, TodoSource, TodoSourceError};

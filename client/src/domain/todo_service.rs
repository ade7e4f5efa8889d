//! Cache-driven todo list service.
//!
//! The list lives in a [`QueryCache`] entry under [`QueryKey::todo_list`].
//! Toggle and remove write the derived list into the cache before the remote
//! call and restore the snapshot if the remote rejects the change; add waits
//! for the remote and then invalidates the list. Every mutation ends by
//! invalidating the list so the next read reflects the server.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::ports::{Notification, Notifier, QueryKey, TodoSource, TodoSourceError};
use crate::domain::{
    DomainError, MutationOutcome, MutationPhaseError, NewTodo, OptimisticMutation, QueryCache,
    Todo, TodoFilter, TodoId, TodoStats, TodoTitle,
};

const TOGGLE_FAILED: &str = "Failed to update todo";
const REMOVE_FAILED: &str = "Failed to delete todo";
const ADD_SUCCEEDED: &str = "Todo added";

/// Map remote failures onto domain errors.
pub(crate) fn map_todo_source_error(error: TodoSourceError) -> DomainError {
    match error {
        TodoSourceError::Transport { message } => {
            DomainError::service_unavailable(format!("todo service unavailable: {message}"))
        }
        TodoSourceError::Timeout { message } => {
            DomainError::service_unavailable(format!("todo service timed out: {message}"))
        }
        TodoSourceError::Unauthorized { message } => {
            DomainError::unauthorized(format!("session rejected: {message}"))
        }
        TodoSourceError::NotFound { message } => DomainError::not_found(message),
        TodoSourceError::Decode { message } => {
            DomainError::internal(format!("unexpected todo payload: {message}"))
        }
        TodoSourceError::InvalidRequest { message } => {
            DomainError::invalid_request(format!("todo request rejected: {message}"))
        }
    }
}

fn map_phase_error(error: MutationPhaseError) -> DomainError {
    DomainError::internal(error.to_string())
}

/// Coordinates the todo list cache with the remote source.
///
/// # Examples
/// ```rust,ignore
/// use std::sync::Arc;
///
/// use todo_client::domain::TodoListService;
/// use todo_client::domain::ports::{FixtureTodoSource, NoOpNotifier};
///
/// let service = TodoListService::new(Arc::new(FixtureTodoSource), Arc::new(NoOpNotifier));
/// let todos = service.fetch_todos().await?;
/// assert!(todos.is_empty());
/// # Ok::<(), todo_client::domain::DomainError>(())
/// ```
pub struct TodoListService {
    source: Arc<dyn TodoSource>,
    notifier: Arc<dyn Notifier>,
    lists: QueryCache<Vec<Todo>>,
    details: QueryCache<Todo>,
}

impl TodoListService {
    /// Create a service with empty caches.
    #[must_use]
    pub fn new(source: Arc<dyn TodoSource>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            source,
            notifier,
            lists: QueryCache::new(),
            details: QueryCache::new(),
        }
    }

    /// Cached list, if it has been fetched.
    #[must_use]
    pub fn todos(&self) -> Option<Vec<Todo>> {
        self.lists.get(&QueryKey::todo_list())
    }

    /// Cached single todo, if it has been fetched.
    #[must_use]
    pub fn todo(&self, id: TodoId) -> Option<Todo> {
        self.details.get(&QueryKey::todo_detail(id))
    }

    /// Observe the cached list.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Vec<Todo>>> {
        self.lists.subscribe(&QueryKey::todo_list())
    }

    /// Whether the cached list needs a refetch.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.lists.is_stale(&QueryKey::todo_list())
    }

    /// Cached list narrowed by `filter`, in cache order.
    #[must_use]
    pub fn filtered(&self, filter: &TodoFilter) -> Vec<Todo> {
        self.todos()
            .map(|todos| filter.apply(&todos))
            .unwrap_or_default()
    }

    /// Counts over the cached list.
    #[must_use]
    pub fn stats(&self) -> TodoStats {
        self.todos()
            .map(|todos| TodoStats::from_todos(&todos))
            .unwrap_or_default()
    }

    /// Fetch the list and store it unless an optimistic write superseded
    /// the read, returning whatever the cache holds afterwards.
    pub async fn fetch_todos(&self) -> Result<Vec<Todo>, DomainError> {
        let key = QueryKey::todo_list();
        let ticket = self.lists.begin_read(&key);
        let fetched = self.source.list().await.map_err(map_todo_source_error)?;
        if self.lists.complete_read(&ticket, fetched.clone()) {
            return Ok(fetched);
        }
        debug!(key = %key, "list read superseded by a local write");
        Ok(self.lists.get(&key).unwrap_or(fetched))
    }

    /// Return the cached list, fetching it first when stale.
    pub async fn ensure_todos(&self) -> Result<Vec<Todo>, DomainError> {
        if !self.is_stale() {
            if let Some(todos) = self.todos() {
                return Ok(todos);
            }
        }
        self.fetch_todos().await
    }

    /// Fetch one todo into its detail entry.
    pub async fn fetch_todo(&self, id: TodoId) -> Result<Todo, DomainError> {
        let key = QueryKey::todo_detail(id);
        let ticket = self.details.begin_read(&key);
        let todo = self.source.get(id).await.map_err(map_todo_source_error)?;
        self.details.complete_read(&ticket, todo.clone());
        Ok(todo)
    }

    /// Create a todo, then invalidate the list.
    ///
    /// Titles are validated locally; a rejected title never reaches the
    /// remote and raises no notification.
    pub async fn add_todo(&self, title: &str) -> Result<Todo, DomainError> {
        let validated = TodoTitle::new(title).map_err(|err| {
            DomainError::invalid_request(err.to_string())
                .with_details(serde_json::json!({ "field": "title" }))
        })?;
        match self.source.create(&NewTodo::new(validated)).await {
            Ok(created) => {
                info!(id = %created.id, "todo created");
                self.invalidate_todos().await;
                self.notifier.notify(Notification::success(ADD_SUCCEEDED));
                Ok(created)
            }
            Err(err) => {
                warn!(error = %err, "todo creation failed");
                let error = map_todo_source_error(err);
                self.notifier
                    .notify(Notification::error(format!("Failed to add todo: {error}")));
                Err(error)
            }
        }
    }

    /// Optimistically set the completion flag of `id`.
    ///
    /// Returns [`MutationOutcome::Skipped`] without calling the remote when
    /// `id` is not in the cached list.
    pub async fn toggle_completed(
        &self,
        id: TodoId,
        completed: bool,
    ) -> Result<MutationOutcome, DomainError> {
        let key = QueryKey::todo_list();
        let Some(previous) = self.lists.patch(&key, |todos| {
            todos.iter().any(|todo| todo.id == id).then(|| {
                todos
                    .iter()
                    .map(|todo| {
                        if todo.id == id {
                            todo.with_completed(completed)
                        } else {
                            todo.clone()
                        }
                    })
                    .collect()
            })
        }) else {
            debug!(id = %id, "toggle skipped: todo not cached");
            return Ok(MutationOutcome::Skipped);
        };

        let mutation = OptimisticMutation::begin(key, previous);
        let result = self.source.set_completed(id, completed).await.map(drop);
        self.settle(mutation, result, TOGGLE_FAILED).await
    }

    /// Optimistically remove `id` from the list.
    ///
    /// Returns [`MutationOutcome::Skipped`] without calling the remote when
    /// `id` is not in the cached list.
    pub async fn remove_todo(&self, id: TodoId) -> Result<MutationOutcome, DomainError> {
        let key = QueryKey::todo_list();
        let Some(previous) = self.lists.patch(&key, |todos| {
            todos.iter().any(|todo| todo.id == id).then(|| {
                todos
                    .iter()
                    .filter(|todo| todo.id != id)
                    .cloned()
                    .collect()
            })
        }) else {
            debug!(id = %id, "remove skipped: todo not cached");
            return Ok(MutationOutcome::Skipped);
        };

        let mutation = OptimisticMutation::begin(key, previous);
        let result = self.source.delete(id).await;
        self.settle(mutation, result, REMOVE_FAILED).await
    }

    /// Mark the list and every cached todo stale, then refetch the list.
    ///
    /// A failed refetch leaves the entry stale and is only logged.
    pub async fn invalidate_todos(&self) {
        let prefix = QueryKey::todo_list();
        self.lists.invalidate_prefix(&prefix);
        self.details.invalidate_prefix(&prefix);
        if let Err(err) = self.fetch_todos().await {
            warn!(error = %err, "refetch after invalidation failed");
        }
    }

    async fn settle(
        &self,
        mut mutation: OptimisticMutation<Vec<Todo>>,
        result: Result<(), TodoSourceError>,
        failure_message: &str,
    ) -> Result<MutationOutcome, DomainError> {
        let outcome = self.reconcile(&mut mutation, result, failure_message);
        self.invalidate_todos().await;
        outcome
    }

    fn reconcile(
        &self,
        mutation: &mut OptimisticMutation<Vec<Todo>>,
        result: Result<(), TodoSourceError>,
        failure_message: &str,
    ) -> Result<MutationOutcome, DomainError> {
        mutation.start_reconciling().map_err(map_phase_error)?;
        match result {
            Ok(()) => {
                mutation.commit().map_err(map_phase_error)?;
                info!(key = %mutation.key(), "optimistic mutation committed");
                Ok(MutationOutcome::Committed)
            }
            Err(err) => {
                let snapshot = mutation.roll_back().map_err(map_phase_error)?;
                self.lists.set(mutation.key(), snapshot);
                warn!(key = %mutation.key(), error = %err, "optimistic mutation rolled back");
                self.notifier.notify(Notification::error(failure_message));
                Err(map_todo_source_error(err))
            }
        }
    }
}

#[cfg(test)]
#[path = "todo_service_tests.rs"]
mod tests;

//! Store-driven todo state container.
//!
//! Unlike [`crate::domain::TodoListService`], the store performs no
//! optimistic writes: each action awaits the remote call and only then
//! updates the state. The store is an ordinary value owned by the
//! application root and handed to whatever needs it.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use super::todo_service::map_todo_source_error;
use crate::domain::ports::TodoSource;
use crate::domain::{DomainError, MutationOutcome, NewTodo, Todo, TodoId, TodoTitle};

/// Number of todos the store keeps from a fetch.
pub const STORE_PAGE_SIZE: usize = 10;

const FETCH_FAILED: &str = "Failed to load todos";
const ADD_FAILED: &str = "Failed to add todo";
const TOGGLE_FAILED: &str = "Failed to update todo";
const REMOVE_FAILED: &str = "Failed to delete todo";

/// Observable state held by a [`TodoStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoStoreState {
    /// Todos in display order; newly added todos come first.
    pub todos: Vec<Todo>,
    /// Whether a fetch or add is in flight.
    pub loading: bool,
    /// Message of the last failed action, until cleared.
    pub error: Option<String>,
}

/// Explicit todo state container with remote-backed actions.
///
/// # Examples
/// ```rust,ignore
/// use std::sync::Arc;
///
/// use todo_client::domain::TodoStore;
/// use todo_client::domain::ports::FixtureTodoSource;
///
/// let store = TodoStore::new(Arc::new(FixtureTodoSource));
/// store.add_todo("Buy milk").await?;
/// assert_eq!(store.state().todos.len(), 1);
/// # Ok::<(), todo_client::domain::DomainError>(())
/// ```
pub struct TodoStore {
    source: Arc<dyn TodoSource>,
    state: watch::Sender<TodoStoreState>,
}

impl TodoStore {
    /// Empty store backed by `source`.
    #[must_use]
    pub fn new(source: Arc<dyn TodoSource>) -> Self {
        let (state, _) = watch::channel(TodoStoreState::default());
        Self { source, state }
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> TodoStoreState {
        self.state.borrow().clone()
    }

    /// Observe state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TodoStoreState> {
        self.state.subscribe()
    }

    /// Replace or clear the error message.
    pub fn set_error(&self, error: Option<String>) {
        self.state.send_modify(|state| state.error = error);
    }

    fn fail(&self, message: &str, error: DomainError) -> DomainError {
        warn!(error = %error, action = message, "todo store action failed");
        self.state.send_modify(|state| {
            state.loading = false;
            state.error = Some(message.to_owned());
        });
        error
    }

    /// Load the first page of todos.
    pub async fn fetch_todos(&self) -> Result<(), DomainError> {
        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });
        let todos = self
            .source
            .list()
            .await
            .map_err(|err| self.fail(FETCH_FAILED, map_todo_source_error(err)))?;
        self.state.send_modify(|state| {
            state.todos = todos.into_iter().take(STORE_PAGE_SIZE).collect();
            state.loading = false;
        });
        Ok(())
    }

    /// Create a todo and put it first.
    ///
    /// The server-assigned id is kept; an existing entry with the same id
    /// is replaced so ids stay unique.
    pub async fn add_todo(&self, title: &str) -> Result<Todo, DomainError> {
        let validated =
            TodoTitle::new(title).map_err(|err| DomainError::invalid_request(err.to_string()))?;
        self.state.send_modify(|state| state.loading = true);
        let created = self
            .source
            .create(&NewTodo::new(validated))
            .await
            .map_err(|err| self.fail(ADD_FAILED, map_todo_source_error(err)))?;
        self.state.send_modify(|state| {
            state.todos.retain(|todo| todo.id != created.id);
            state.todos.insert(0, created.clone());
            state.loading = false;
        });
        debug!(id = %created.id, "todo added to store");
        Ok(created)
    }

    /// Flip the completion flag of `id` once the remote confirms.
    pub async fn toggle_todo(&self, id: TodoId) -> Result<MutationOutcome, DomainError> {
        let Some(completed) = self
            .state
            .borrow()
            .todos
            .iter()
            .find(|todo| todo.id == id)
            .map(|todo| !todo.completed)
        else {
            return Ok(MutationOutcome::Skipped);
        };
        self.source
            .set_completed(id, completed)
            .await
            .map_err(|err| self.fail(TOGGLE_FAILED, map_todo_source_error(err)))?;
        self.state.send_modify(|state| {
            if let Some(todo) = state.todos.iter_mut().find(|todo| todo.id == id) {
                todo.completed = completed;
            }
        });
        Ok(MutationOutcome::Committed)
    }

    /// Delete `id` once the remote confirms.
    pub async fn remove_todo(&self, id: TodoId) -> Result<(), DomainError> {
        self.source
            .delete(id)
            .await
            .map_err(|err| self.fail(REMOVE_FAILED, map_todo_source_error(err)))?;
        self.state
            .send_modify(|state| state.todos.retain(|todo| todo.id != id));
        Ok(())
    }
}

//! In-memory remote that applies writes and can fail or hold them.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::domain::ports::{TodoSource, TodoSourceError};
use crate::domain::{NewTodo, Todo, TodoId};

#[derive(Default)]
struct Script {
    todos: Vec<Todo>,
    next_id: u64,
    list_failures: VecDeque<TodoSourceError>,
    mutation_failures: VecDeque<TodoSourceError>,
    list_calls: usize,
    get_calls: usize,
    create_calls: usize,
    mutation_calls: usize,
}

struct Hold {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

/// Scripted [`TodoSource`] backed by a server-side list.
///
/// Successful toggles, deletes, and creates change the server list, so a
/// refetch after a mutation observes them. Failures are queued per call
/// kind. [`Self::hold_mutations`] parks every toggle or delete until
/// released so tests can inspect the cache mid-flight.
pub struct ScriptedTodoSource {
    script: Mutex<Script>,
    hold: Mutex<Option<Hold>>,
}

impl ScriptedTodoSource {
    /// Remote serving `todos`; created todos get ids after the largest one.
    #[must_use]
    pub fn new(todos: Vec<Todo>) -> Self {
        let next_id = todos.iter().map(|todo| todo.id.get()).max().unwrap_or(0) + 1;
        Self {
            script: Mutex::new(Script {
                todos,
                next_id,
                ..Script::default()
            }),
            hold: Mutex::new(None),
        }
    }

    /// Use `id` for the next created todo.
    #[must_use]
    pub fn with_next_id(self, id: u64) -> Self {
        self.script().next_id = id;
        self
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        match self.script.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("scripted source mutex poisoned"),
        }
    }

    fn hold_slot(&self) -> MutexGuard<'_, Option<Hold>> {
        match self.hold.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("scripted source hold mutex poisoned"),
        }
    }

    /// Fail the next toggle, delete, or create with `error`.
    pub fn fail_next_mutation(&self, error: TodoSourceError) {
        self.script().mutation_failures.push_back(error);
    }

    /// Fail the next list read with `error`.
    pub fn fail_next_list(&self, error: TodoSourceError) {
        self.script().list_failures.push_back(error);
    }

    /// Park toggles and deletes until the returned handle is notified.
    ///
    /// Returns `(entered, release)`: `entered` fires once a held call has
    /// started, `release` lets it continue.
    pub fn hold_mutations(&self) -> (Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        *self.hold_slot() = Some(Hold {
            entered: Arc::clone(&entered),
            release: Arc::clone(&release),
        });
        (entered, release)
    }

    /// Current server-side list.
    #[must_use]
    pub fn server_todos(&self) -> Vec<Todo> {
        self.script().todos.clone()
    }

    /// Number of list reads.
    #[must_use]
    pub fn list_calls(&self) -> usize {
        self.script().list_calls
    }

    /// Number of single-todo reads.
    #[must_use]
    pub fn get_calls(&self) -> usize {
        self.script().get_calls
    }

    /// Number of create calls.
    #[must_use]
    pub fn create_calls(&self) -> usize {
        self.script().create_calls
    }

    /// Number of toggle and delete calls.
    #[must_use]
    pub fn mutation_calls(&self) -> usize {
        self.script().mutation_calls
    }

    async fn wait_if_held(&self) {
        let handles = self
            .hold_slot()
            .as_ref()
            .map(|hold| (Arc::clone(&hold.entered), Arc::clone(&hold.release)));
        if let Some((entered, release)) = handles {
            entered.notify_one();
            release.notified().await;
        }
    }
}

#[async_trait]
impl TodoSource for ScriptedTodoSource {
    async fn list(&self) -> Result<Vec<Todo>, TodoSourceError> {
        let mut script = self.script();
        script.list_calls += 1;
        match script.list_failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(script.todos.clone()),
        }
    }

    async fn get(&self, id: TodoId) -> Result<Todo, TodoSourceError> {
        let mut script = self.script();
        script.get_calls += 1;
        script
            .todos
            .iter()
            .find(|todo| todo.id == id)
            .cloned()
            .ok_or_else(|| TodoSourceError::not_found(format!("todo {id}")))
    }

    async fn create(&self, todo: &NewTodo) -> Result<Todo, TodoSourceError> {
        let mut script = self.script();
        script.create_calls += 1;
        if let Some(error) = script.mutation_failures.pop_front() {
            return Err(error);
        }
        let created = Todo {
            id: TodoId::new(script.next_id),
            title: todo.title.as_str().to_owned(),
            completed: todo.completed,
            description: None,
            user_id: Some(todo.user_id),
        };
        script.next_id += 1;
        script.todos.push(created.clone());
        Ok(created)
    }

    async fn set_completed(&self, id: TodoId, completed: bool) -> Result<Todo, TodoSourceError> {
        self.script().mutation_calls += 1;
        self.wait_if_held().await;
        let mut script = self.script();
        if let Some(error) = script.mutation_failures.pop_front() {
            return Err(error);
        }
        let target = script
            .todos
            .iter_mut()
            .find(|todo| todo.id == id)
            .ok_or_else(|| TodoSourceError::not_found(format!("todo {id}")))?;
        target.completed = completed;
        Ok(target.clone())
    }

    async fn delete(&self, id: TodoId) -> Result<(), TodoSourceError> {
        self.script().mutation_calls += 1;
        self.wait_if_held().await;
        let mut script = self.script();
        if let Some(error) = script.mutation_failures.pop_front() {
            return Err(error);
        }
        script.todos.retain(|todo| todo.id != id);
        Ok(())
    }
}

//! Driven port for reading and writing todos on the remote API.
//!
//! The domain owns the contract so the mutation coordinator can stay
//! transport agnostic; the HTTP adapter lives in `outbound::http`.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{NewTodo, Todo, TodoId};

define_port_error! {
    /// Errors surfaced while calling the remote todo API.
    pub enum TodoSourceError {
        /// Network transport failed or the server answered with a 5xx.
        Transport { message: String } =>
            "todo source transport failed: {message}",
        /// The request exceeded its deadline.
        Timeout { message: String } =>
            "todo source timeout: {message}",
        /// The remote rejected the bearer token.
        Unauthorized { message: String } =>
            "todo source rejected credentials: {message}",
        /// The addressed todo does not exist remotely.
        NotFound { message: String } =>
            "todo not found: {message}",
        /// The response body could not be decoded.
        Decode { message: String } =>
            "todo source response decode failed: {message}",
        /// The remote or the adapter rejected the request.
        InvalidRequest { message: String } =>
            "todo source request invalid: {message}",
    }
}

/// Port for the remote todo collection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TodoSource: Send + Sync {
    /// Fetch the first page of todos in server order.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use todo_client::domain::ports::{FixtureTodoSource, TodoSource};
    ///
    /// let todos = FixtureTodoSource.list().await?;
    /// assert!(todos.is_empty());
    /// # Ok::<(), todo_client::domain::ports::TodoSourceError>(())
    /// ```
    async fn list(&self) -> Result<Vec<Todo>, TodoSourceError>;

    /// Fetch one todo.
    async fn get(&self, id: TodoId) -> Result<Todo, TodoSourceError>;

    /// Create a todo and return the stored representation.
    async fn create(&self, todo: &NewTodo) -> Result<Todo, TodoSourceError>;

    /// Set the completion flag of one todo.
    async fn set_completed(&self, id: TodoId, completed: bool) -> Result<Todo, TodoSourceError>;

    /// Delete one todo.
    async fn delete(&self, id: TodoId) -> Result<(), TodoSourceError>;
}

/// Fixture source with an empty collection that echoes writes.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureTodoSource;

/// Identifier handed out by [`FixtureTodoSource::create`].
pub const FIXTURE_CREATED_ID: u64 = 201;

#[async_trait]
impl TodoSource for FixtureTodoSource {
    async fn list(&self) -> Result<Vec<Todo>, TodoSourceError> {
        Ok(Vec::new())
    }

    async fn get(&self, id: TodoId) -> Result<Todo, TodoSourceError> {
        Err(TodoSourceError::not_found(format!("todo {id}")))
    }

    async fn create(&self, todo: &NewTodo) -> Result<Todo, TodoSourceError> {
        Ok(Todo {
            id: TodoId::new(FIXTURE_CREATED_ID),
            title: todo.title.as_str().to_owned(),
            completed: todo.completed,
            description: None,
            user_id: Some(todo.user_id),
        })
    }

    async fn set_completed(&self, id: TodoId, completed: bool) -> Result<Todo, TodoSourceError> {
        Ok(Todo {
            id,
            title: String::new(),
            completed,
            description: None,
            user_id: None,
        })
    }

    async fn delete(&self, _id: TodoId) -> Result<(), TodoSourceError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Fixture behaviour and error rendering.
    use super::*;
    use crate::domain::TodoTitle;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn fixture_lists_nothing_and_misses_lookups() {
        let source = FixtureTodoSource;
        assert!(source.list().await.expect("list").is_empty());
        let err = source.get(TodoId::new(3)).await.expect_err("missing todo");
        assert!(matches!(err, TodoSourceError::NotFound { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_echoes_created_todos() {
        let payload = NewTodo::new(TodoTitle::new("Buy milk").expect("valid title"));
        let created = FixtureTodoSource.create(&payload).await.expect("create");
        assert_eq!(created.id, TodoId::new(FIXTURE_CREATED_ID));
        assert_eq!(created.title, "Buy milk");
        assert_eq!(created.user_id, Some(1));
    }

    #[rstest]
    #[case(TodoSourceError::timeout("after 10s"), "todo source timeout: after 10s")]
    #[case(TodoSourceError::not_found("todo 9"), "todo not found: todo 9")]
    fn errors_render_messages(#[case] error: TodoSourceError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }
}

//! Keys addressing entries of the query cache.
use thiserror::Error;

use crate::domain::TodoId;

const TODO_LIST_KEY: &str = "todos";

/// Key identifying one cached query result.
///
/// Keys are hierarchical: `todos` addresses the list and `todos:{id}` a
/// single todo, so invalidating the `todos` prefix reaches both.
///
/// # Examples
/// ```
/// use todo_client::domain::TodoId;
/// use todo_client::domain::ports::QueryKey;
///
/// let list = QueryKey::todo_list();
/// let detail = QueryKey::todo_detail(TodoId::new(4));
/// assert_eq!(detail.as_str(), "todos:4");
/// assert!(detail.is_within(&list));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(String);

impl QueryKey {
    /// Construct a key after validating that it is non-empty and trimmed.
    pub fn new(value: impl Into<String>) -> Result<Self, QueryKeyValidationError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(QueryKeyValidationError::Empty);
        }
        if raw.trim() != raw {
            return Err(QueryKeyValidationError::ContainsWhitespace);
        }
        Ok(Self(raw))
    }

    /// Key of the todo list query.
    #[must_use]
    pub fn todo_list() -> Self {
        Self(TODO_LIST_KEY.to_owned())
    }

    /// Key of the single-todo query for `id`.
    #[must_use]
    pub fn todo_detail(id: TodoId) -> Self {
        Self(format!("{TODO_LIST_KEY}:{id}"))
    }

    /// Whether this key equals `prefix` or is nested beneath it.
    #[must_use]
    pub fn is_within(&self, prefix: &QueryKey) -> bool {
        self.0
            .strip_prefix(prefix.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(':'))
    }

    /// Borrow the underlying key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for QueryKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Validation errors returned when constructing [`QueryKey`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryKeyValidationError {
    /// Key is empty after trimming whitespace.
    #[error("query key must not be empty")]
    Empty,
    /// Key contains leading or trailing whitespace.
    #[error("query key must not contain surrounding whitespace")]
    ContainsWhitespace,
}

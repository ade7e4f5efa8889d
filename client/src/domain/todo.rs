//! Todo data model.
//!
//! `Todo` mirrors the remote representation; the validated input types
//! (`TodoTitle`, `TodoDescription`, `TodoDraft`, `TodoEdit`) carry the form
//! rules so invalid input is rejected before any network call.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Minimum title length, in characters, once trimmed.
pub const TITLE_MIN: usize = 3;
/// Maximum title length, in characters, once trimmed.
pub const TITLE_MAX: usize = 100;
/// Maximum description length, in characters.
pub const DESCRIPTION_MAX: usize = 500;
/// Owner assigned to todos created by this client.
pub const DEFAULT_OWNER_ID: u64 = 1;

/// Validation errors returned by the todo input constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoValidationError {
    /// Title was missing or blank once trimmed.
    EmptyTitle,
    /// Title is shorter than [`TITLE_MIN`].
    TitleTooShort {
        /// Minimum accepted length.
        min: usize,
    },
    /// Title is longer than [`TITLE_MAX`].
    TitleTooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// Description is longer than [`DESCRIPTION_MAX`].
    DescriptionTooLong {
        /// Maximum accepted length.
        max: usize,
    },
}

impl fmt::Display for TodoValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be empty"),
            Self::TitleTooShort { min } => write!(f, "title must be at least {min} characters"),
            Self::TitleTooLong { max } => write!(f, "title must be at most {max} characters"),
            Self::DescriptionTooLong { max } => {
                write!(f, "description must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for TodoValidationError {}

/// Identifier assigned by the remote source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(u64);

impl TodoId {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Access the raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for TodoId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TodoId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// One task as known to the client.
///
/// Serialised with camelCase keys (`userId`) to match the remote API.
///
/// # Examples
/// ```
/// use todo_client::domain::{Todo, TodoId};
///
/// let todo: Todo = serde_json::from_str(r#"{"id":1,"title":"A","completed":false,"userId":1}"#)
///     .expect("valid todo");
/// assert_eq!(todo.id, TodoId::new(1));
/// assert_eq!(todo.user_id, Some(1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Remote identifier, unique within one cached list.
    pub id: TodoId,
    /// Task title.
    pub title: String,
    /// Whether the task is done.
    #[serde(default)]
    pub completed: bool,
    /// Optional free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Owning user, when the remote reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
}

impl Todo {
    /// Build a todo with no description or owner.
    #[must_use]
    pub fn new(id: impl Into<TodoId>, title: impl Into<String>, completed: bool) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            completed,
            description: None,
            user_id: None,
        }
    }

    /// Copy of this todo with `completed` replaced.
    #[must_use]
    pub fn with_completed(&self, completed: bool) -> Self {
        Self {
            completed,
            ..self.clone()
        }
    }
}

/// Title accepted by the create and edit forms.
///
/// ## Invariants
/// - Trimmed, between [`TITLE_MIN`] and [`TITLE_MAX`] characters.
///
/// # Examples
/// ```
/// use todo_client::domain::{TodoTitle, TodoValidationError};
///
/// assert_eq!(TodoTitle::new("  Buy milk ").expect("valid").as_str(), "Buy milk");
/// assert_eq!(
///     TodoTitle::new("ab"),
///     Err(TodoValidationError::TitleTooShort { min: 3 })
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TodoTitle(String);

impl TodoTitle {
    /// Validate and construct a title.
    pub fn new(title: impl AsRef<str>) -> Result<Self, TodoValidationError> {
        let trimmed = title.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TodoValidationError::EmptyTitle);
        }
        let length = trimmed.chars().count();
        if length < TITLE_MIN {
            return Err(TodoValidationError::TitleTooShort { min: TITLE_MIN });
        }
        if length > TITLE_MAX {
            return Err(TodoValidationError::TitleTooLong { max: TITLE_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the title text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for TodoTitle {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<TodoTitle> for String {
    fn from(value: TodoTitle) -> Self {
        value.0
    }
}

/// Optional description accepted by the create and edit forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TodoDescription(String);

impl TodoDescription {
    /// Validate a description; blank input yields `Ok(None)`.
    pub fn parse(description: &str) -> Result<Option<Self>, TodoValidationError> {
        if description.trim().is_empty() {
            return Ok(None);
        }
        if description.chars().count() > DESCRIPTION_MAX {
            return Err(TodoValidationError::DescriptionTooLong {
                max: DESCRIPTION_MAX,
            });
        }
        Ok(Some(Self(description.to_owned())))
    }

    /// Borrow the description text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Creation payload sent to the remote source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTodo {
    /// Validated title.
    pub title: TodoTitle,
    /// Always `false` for new todos.
    pub completed: bool,
    /// Owner recorded by the remote.
    pub user_id: u64,
}

impl NewTodo {
    /// Creation payload for the default owner.
    #[must_use]
    pub fn new(title: TodoTitle) -> Self {
        Self {
            title,
            completed: false,
            user_id: DEFAULT_OWNER_ID,
        }
    }
}

/// Validated input of the create form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoDraft {
    /// Validated title.
    pub title: TodoTitle,
    /// Validated description, if one was entered.
    pub description: Option<TodoDescription>,
}

impl TodoDraft {
    /// Validate raw form fields.
    pub fn try_from_parts(
        title: &str,
        description: Option<&str>,
    ) -> Result<Self, TodoValidationError> {
        let title = TodoTitle::new(title)?;
        let description = description
            .map(TodoDescription::parse)
            .transpose()?
            .flatten();
        Ok(Self { title, description })
    }
}

/// Validated input of the edit form.
///
/// Edits are validated but not persisted; the remote contract has no edit
/// operation beyond toggling completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoEdit {
    /// Title and description fields.
    pub draft: TodoDraft,
    /// Desired completion state.
    pub completed: bool,
}

impl TodoEdit {
    /// Validate raw form fields.
    pub fn try_from_parts(
        title: &str,
        description: Option<&str>,
        completed: bool,
    ) -> Result<Self, TodoValidationError> {
        Ok(Self {
            draft: TodoDraft::try_from_parts(title, description)?,
            completed,
        })
    }
}

/// Completion filter used by list views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoStatusFilter {
    /// Every todo.
    #[default]
    All,
    /// Completed todos only.
    Completed,
    /// Todos that are not completed.
    Pending,
}

impl TodoStatusFilter {
    fn matches(self, todo: &Todo) -> bool {
        match self {
            Self::All => true,
            Self::Completed => todo.completed,
            Self::Pending => !todo.completed,
        }
    }
}

impl FromStr for TodoStatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "completed" => Ok(Self::Completed),
            "pending" => Ok(Self::Pending),
            other => Err(format!("unknown status filter: {other}")),
        }
    }
}

/// Status plus free-text title search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoFilter {
    /// Completion filter.
    pub status: TodoStatusFilter,
    /// Case-insensitive title search; blank matches everything.
    pub search: String,
}

impl TodoFilter {
    /// Whether `todo` passes both the status and search criteria.
    #[must_use]
    pub fn matches(&self, todo: &Todo) -> bool {
        let needle = self.search.trim().to_lowercase();
        let matches_query = needle.is_empty() || todo.title.to_lowercase().contains(&needle);
        matches_query && self.status.matches(todo)
    }

    /// Filter a list, preserving its order.
    #[must_use]
    pub fn apply(&self, todos: &[Todo]) -> Vec<Todo> {
        todos
            .iter()
            .filter(|todo| self.matches(todo))
            .cloned()
            .collect()
    }
}

/// Summary counts shown above a list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TodoStats {
    /// Number of todos.
    pub total: usize,
    /// Number of completed todos.
    pub completed: usize,
    /// Number of todos still open.
    pub pending: usize,
}

impl TodoStats {
    /// Count a list.
    #[must_use]
    pub fn from_todos(todos: &[Todo]) -> Self {
        let completed = todos.iter().filter(|todo| todo.completed).count();
        Self {
            total: todos.len(),
            completed,
            pending: todos.len() - completed,
        }
    }
}

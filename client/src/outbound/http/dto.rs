//! Wire DTOs for the todo REST API.
//!
//! Responses decode into these DTOs first and then map into domain `Todo`
//! values; request bodies are built from domain payloads.

use serde::{Deserialize, Serialize};

use crate::domain::{NewTodo, Todo, TodoId};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct TodoDto {
    pub(super) id: u64,
    #[serde(default)]
    pub(super) title: String,
    #[serde(default)]
    pub(super) completed: bool,
    #[serde(default)]
    pub(super) description: Option<String>,
    #[serde(default)]
    pub(super) user_id: Option<u64>,
}

impl From<TodoDto> for Todo {
    fn from(dto: TodoDto) -> Self {
        Self {
            id: TodoId::new(dto.id),
            title: dto.title,
            completed: dto.completed,
            description: dto.description.filter(|text| !text.trim().is_empty()),
            user_id: dto.user_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateTodoDto<'a> {
    pub(super) title: &'a str,
    pub(super) completed: bool,
    pub(super) user_id: u64,
}

impl<'a> From<&'a NewTodo> for CreateTodoDto<'a> {
    fn from(todo: &'a NewTodo) -> Self {
        Self {
            title: todo.title.as_str(),
            completed: todo.completed,
            user_id: todo.user_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct SetCompletedDto {
    pub(super) completed: bool,
}

//! Domain primitives, ports, and services.
//!
//! Purpose: keep the todo model, session model, and the optimistic cache
//! coordination free of transport and storage details. Adapters live in
//! `crate::outbound` and reach the domain only through the traits in
//! [`ports`].
//!
//! Public surface:
//! - DomainError: transport agnostic failure payload.
//! - Todo, TodoId, TodoTitle: the todo entity and its validated inputs.
//! - QueryCache, QueryKey: keyed, invalidatable cache entries.
//! - TodoListService: cache-driven optimistic mutation coordinator.
//! - TodoStore: store-driven state container.
//! - SessionService, ThemeService: simulated auth and theme preference.

pub mod auth;
pub mod auth_service;
pub mod error;
pub mod mutation;
pub mod ports;
pub mod query_cache;
pub mod theme;
pub mod todo;
pub mod todo_service;
pub mod todo_store;

pub use self::auth::{
    AuthSession, AuthUser, CredentialsValidationError, Email, PersistedSession, SessionStatus,
    SessionToken, SignInCredentials, SignUpCredentials,
};
pub use self::auth_service::{SESSION_STORAGE_KEY, SIMULATED_AUTH_LATENCY, SessionService};
pub use self::error::{DomainError, DomainErrorValidationError, ErrorCode};
pub use self::mutation::{MutationOutcome, MutationPhase, MutationPhaseError, OptimisticMutation};
pub use self::query_cache::{QueryCache, ReadTicket};
pub use self::theme::{THEME_STORAGE_KEY, Theme, ThemeService};
pub use self::todo::{
    DEFAULT_OWNER_ID, NewTodo, Todo, TodoDescription, TodoDraft, TodoEdit, TodoFilter, TodoId,
    TodoStats, TodoStatusFilter, TodoTitle, TodoValidationError,
};
pub use self::todo_service::TodoListService;
pub use self::todo_store::{TodoStore, TodoStoreState};

/// Convenient domain result alias.
///
/// # Examples
/// ```
/// use todo_client::domain::{DomainResult, DomainError};
///
/// fn guarded() -> DomainResult<()> {
///     Err(DomainError::unauthorized("sign in first"))
/// }
/// assert!(guarded().is_err());
/// ```
pub type DomainResult<T> = Result<T, DomainError>;

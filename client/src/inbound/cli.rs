//! Command-line driving adapter.
//!
//! Each invocation is one short session: it restores the persisted auth
//! session and theme, fetches the list when a command needs it, runs one
//! command, and renders the outcome as output lines.

use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use thiserror::Error;

use crate::config::ClientSettings;
use crate::domain::ports::{AuthGate, KeyValueStorage, StorageError};
use crate::domain::{
    AuthUser, CredentialsValidationError, DomainError, MutationOutcome, SessionService,
    SignInCredentials, SignUpCredentials, Theme, ThemeService, Todo, TodoFilter, TodoId,
    TodoListService, TodoStatusFilter,
};
use crate::outbound::http::HttpTodoSource;
use crate::outbound::storage::JsonFileStorage;
use crate::outbound::ui::{TracingNavigator, TracingNotifier};

/// `todo-client` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "todo-client",
    about = "Manage a remote todo list with optimistic updates",
    version
)]
pub struct CliArgs {
    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Commands understood by the client.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Show the todo list.
    List {
        /// Completion filter: `all`, `completed`, or `pending`.
        #[arg(long, default_value = "all")]
        status: TodoStatusFilter,
        /// Case-insensitive title search.
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Show one todo.
    Show {
        /// Todo identifier.
        id: u64,
    },
    /// Create a todo.
    Add {
        /// Title, 3 to 100 characters.
        title: String,
    },
    /// Flip the completion flag of a todo.
    Toggle {
        /// Todo identifier.
        id: u64,
    },
    /// Delete a todo.
    Remove {
        /// Todo identifier.
        id: u64,
    },
    /// Start a session.
    SignIn {
        /// Account email.
        #[arg(long)]
        email: String,
        /// Account password.
        #[arg(long)]
        password: String,
    },
    /// Register and start a session.
    SignUp {
        /// Display name.
        #[arg(long)]
        name: String,
        /// Account email.
        #[arg(long)]
        email: String,
        /// Account password.
        #[arg(long)]
        password: String,
    },
    /// End the session.
    SignOut,
    /// Show the signed-in user.
    Whoami,
    /// Show or change the theme.
    Theme {
        /// New theme, or `toggle`; omit to show the current one.
        #[arg(value_enum)]
        mode: Option<ThemeMode>,
    },
}

/// Theme argument of [`Command::Theme`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeMode {
    /// Switch to the light theme.
    Light,
    /// Switch to the dark theme.
    Dark,
    /// Switch to the other theme.
    Toggle,
}

/// Failures surfaced by the command-line adapter.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be turned into adapters.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Local storage failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Form input was rejected.
    #[error(transparent)]
    Credentials(#[from] CredentialsValidationError),
    /// A domain operation failed.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Wired services behind the command-line adapter.
pub struct ClientApp {
    app_name: String,
    session: Arc<SessionService>,
    todos: TodoListService,
    theme: ThemeService,
}

impl ClientApp {
    /// Wire the HTTP source, file storage, and services from settings.
    ///
    /// # Errors
    ///
    /// Returns [`CliError`] when the API URL is invalid, the storage
    /// directory cannot be opened, or the HTTP client cannot be built.
    pub fn build(settings: &ClientSettings) -> Result<Self, CliError> {
        let api_url = settings
            .api_url()
            .map_err(|err| CliError::Config(format!("api url: {err}")))?;
        let storage: Arc<dyn KeyValueStorage> =
            Arc::new(JsonFileStorage::open(&settings.storage_dir())?);
        let session = Arc::new(SessionService::new(
            Arc::clone(&storage),
            Arc::new(TracingNavigator),
        ));
        let gate: Arc<dyn AuthGate> = session.clone();
        let source = HttpTodoSource::new(api_url, settings.request_timeout(), gate)
            .map_err(|err| CliError::Config(format!("http client: {err}")))?
            .with_list_limit(settings.list_limit());
        let todos = TodoListService::new(Arc::new(source), Arc::new(TracingNotifier));
        let theme = ThemeService::load(storage, settings.preferred_theme());
        Ok(Self::from_parts(settings.app_name(), session, todos, theme))
    }

    /// Assemble an app from already built services and restore the session.
    #[must_use]
    pub fn from_parts(
        app_name: &str,
        session: Arc<SessionService>,
        todos: TodoListService,
        theme: ThemeService,
    ) -> Self {
        session.restore();
        Self {
            app_name: app_name.to_owned(),
            session,
            todos,
            theme,
        }
    }

    /// Run one command and return the lines to print.
    ///
    /// # Errors
    ///
    /// Returns [`CliError`] when input validation or the remote call fails.
    pub async fn run(&self, command: Command) -> Result<Vec<String>, CliError> {
        match command {
            Command::List { status, search } => self.list(TodoFilter { status, search }).await,
            Command::Show { id } => {
                let todo = self.todos.fetch_todo(TodoId::new(id)).await?;
                let mut lines = vec![render_todo(&todo)];
                if let Some(description) = todo.description {
                    lines.push(description);
                }
                Ok(lines)
            }
            Command::Add { title } => {
                let created = self.todos.add_todo(&title).await?;
                Ok(vec![format!("added {}", render_todo(&created))])
            }
            Command::Toggle { id } => self.toggle(TodoId::new(id)).await,
            Command::Remove { id } => self.remove(TodoId::new(id)).await,
            Command::SignIn { email, password } => {
                let credentials = SignInCredentials::try_from_parts(&email, &password)?;
                let session = self.session.sign_in(&credentials).await;
                Ok(vec![render_user(session.user.as_ref())])
            }
            Command::SignUp {
                name,
                email,
                password,
            } => {
                let credentials = SignUpCredentials::try_from_parts(&name, &email, &password)?;
                let session = self.session.sign_up(&credentials).await;
                Ok(vec![render_user(session.user.as_ref())])
            }
            Command::SignOut => {
                self.session.sign_out();
                Ok(vec!["signed out".to_owned()])
            }
            Command::Whoami => Ok(vec![render_user(self.session.session().user.as_ref())]),
            Command::Theme { mode } => {
                let theme = match mode {
                    None => self.theme.current(),
                    Some(ThemeMode::Toggle) => self.theme.toggle(),
                    Some(ThemeMode::Light) => self.apply_theme(Theme::Light),
                    Some(ThemeMode::Dark) => self.apply_theme(Theme::Dark),
                };
                Ok(vec![format!("theme: {theme}")])
            }
        }
    }

    fn apply_theme(&self, theme: Theme) -> Theme {
        self.theme.set(theme);
        theme
    }

    async fn list(&self, filter: TodoFilter) -> Result<Vec<String>, CliError> {
        self.todos.ensure_todos().await?;
        let stats = self.todos.stats();
        let mut lines = vec![format!(
            "{}: {} total, {} completed, {} pending",
            self.app_name, stats.total, stats.completed, stats.pending
        )];
        lines.extend(self.todos.filtered(&filter).iter().map(render_todo));
        Ok(lines)
    }

    async fn toggle(&self, id: TodoId) -> Result<Vec<String>, CliError> {
        let todos = self.todos.ensure_todos().await?;
        let current = todos
            .iter()
            .find(|todo| todo.id == id)
            .ok_or_else(|| DomainError::not_found(format!("todo {id} is not in the list")))?;
        let completed = !current.completed;
        self.todos.toggle_completed(id, completed).await?;
        let state = if completed { "completed" } else { "pending" };
        Ok(vec![format!("todo {id} marked {state}")])
    }

    async fn remove(&self, id: TodoId) -> Result<Vec<String>, CliError> {
        self.todos.ensure_todos().await?;
        match self.todos.remove_todo(id).await? {
            MutationOutcome::Committed => Ok(vec![format!("removed todo {id}")]),
            MutationOutcome::Skipped => {
                Err(DomainError::not_found(format!("todo {id} is not in the list")).into())
            }
        }
    }
}

fn render_todo(todo: &Todo) -> String {
    let mark = if todo.completed { "x" } else { " " };
    format!("[{mark}] #{} {}", todo.id, todo.title)
}

fn render_user(user: Option<&AuthUser>) -> String {
    user.map_or_else(
        || "anonymous".to_owned(),
        |signed_in| format!("{} <{}>", signed_in.name, signed_in.email),
    )
}

#[cfg(test)]
mod tests {
    //! Argument parsing and command rendering against scripted services.
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{InMemoryStorage, NoOpNavigator, NoOpNotifier};
    use crate::test_support::{ImmediateSleeper, ScriptedTodoSource, todo};
    use mockable::DefaultClock;
    use rstest::rstest;

    struct Harness {
        app: ClientApp,
        source: Arc<ScriptedTodoSource>,
        storage: Arc<InMemoryStorage>,
    }

    fn harness_with(storage: Arc<InMemoryStorage>) -> Harness {
        let source = Arc::new(ScriptedTodoSource::new(vec![
            todo(1, "Buy milk", false),
            todo(2, "Walk dog", true),
        ]));
        let session = Arc::new(SessionService::with_runtime(
            storage.clone(),
            Arc::new(NoOpNavigator),
            Arc::new(DefaultClock),
            Arc::new(ImmediateSleeper::default()),
        ));
        let todos = TodoListService::new(source.clone(), Arc::new(NoOpNotifier));
        let theme = ThemeService::load(storage.clone(), None);
        Harness {
            app: ClientApp::from_parts("Second Brain Todo", session, todos, theme),
            source,
            storage,
        }
    }

    fn harness() -> Harness {
        harness_with(Arc::new(InMemoryStorage::default()))
    }

    fn parse(args: &[&str]) -> Command {
        let mut argv = vec!["todo-client"];
        argv.extend_from_slice(args);
        CliArgs::try_parse_from(argv).expect("arguments parse").command
    }

    #[rstest]
    #[case(&["list"], Command::List { status: TodoStatusFilter::All, search: String::new() })]
    #[case(
        &["list", "--status", "pending", "--search", "milk"],
        Command::List { status: TodoStatusFilter::Pending, search: "milk".to_owned() }
    )]
    #[case(&["toggle", "3"], Command::Toggle { id: 3 })]
    #[case(&["theme", "toggle"], Command::Theme { mode: Some(ThemeMode::Toggle) })]
    #[case(&["theme"], Command::Theme { mode: None })]
    fn parses_commands(#[case] args: &[&str], #[case] expected: Command) {
        assert_eq!(parse(args), expected);
    }

    #[rstest]
    fn rejects_unknown_status_filters() {
        let result = CliArgs::try_parse_from(["todo-client", "list", "--status", "done"]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn list_renders_stats_and_filtered_todos() {
        let harness = harness();

        let lines = harness
            .app
            .run(parse(&["list", "--status", "completed"]))
            .await
            .expect("list runs");

        assert_eq!(
            lines,
            vec![
                "Second Brain Todo: 2 total, 1 completed, 1 pending".to_owned(),
                "[x] #2 Walk dog".to_owned(),
            ]
        );
    }

    #[tokio::test]
    async fn toggle_flips_the_current_state() {
        let harness = harness();

        let lines = harness
            .app
            .run(Command::Toggle { id: 2 })
            .await
            .expect("toggle runs");

        assert_eq!(lines, vec!["todo 2 marked pending".to_owned()]);
        assert_eq!(
            harness.source.server_todos(),
            vec![todo(1, "Buy milk", false), todo(2, "Walk dog", false)]
        );
    }

    #[tokio::test]
    async fn removing_an_unknown_todo_is_not_found() {
        let harness = harness();

        let err = harness
            .app
            .run(Command::Remove { id: 99 })
            .await
            .expect_err("unknown id");

        match err {
            CliError::Domain(error) => assert_eq!(error.code(), ErrorCode::NotFound),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(harness.source.mutation_calls(), 0);
    }

    #[tokio::test]
    async fn add_reports_the_created_todo() {
        let harness = harness();

        let lines = harness
            .app
            .run(Command::Add {
                title: "Read a book".to_owned(),
            })
            .await
            .expect("add runs");

        assert_eq!(lines, vec!["added [ ] #3 Read a book".to_owned()]);
    }

    #[tokio::test]
    async fn sign_in_persists_across_invocations() {
        let harness = harness();
        harness
            .app
            .run(Command::SignIn {
                email: "ada@example.com".to_owned(),
                password: "secret1".to_owned(),
            })
            .await
            .expect("sign in runs");

        let next = harness_with(harness.storage.clone());
        let lines = next.app.run(Command::Whoami).await.expect("whoami runs");

        assert_eq!(lines, vec!["ada <ada@example.com>".to_owned()]);
    }

    #[tokio::test]
    async fn invalid_credentials_are_rejected() {
        let harness = harness();

        let err = harness
            .app
            .run(Command::SignIn {
                email: "ada".to_owned(),
                password: "secret1".to_owned(),
            })
            .await
            .expect_err("invalid email");

        assert!(matches!(
            err,
            CliError::Credentials(CredentialsValidationError::InvalidEmail)
        ));
    }

    #[tokio::test]
    async fn theme_changes_are_persisted() {
        let harness = harness();

        let lines = harness
            .app
            .run(Command::Theme {
                mode: Some(ThemeMode::Light),
            })
            .await
            .expect("theme runs");
        assert_eq!(lines, vec!["theme: light".to_owned()]);

        let next = harness_with(harness.storage.clone());
        let restored = next
            .app
            .run(Command::Theme { mode: None })
            .await
            .expect("theme runs");
        assert_eq!(restored, vec!["theme: light".to_owned()]);
    }
}

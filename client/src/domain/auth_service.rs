//! Simulated authentication session service.
//!
//! Sign-in and sign-up never contact the remote: after a short simulated
//! delay the service fabricates a user and token, persists them, and asks
//! the view layer to show the todo list. The service is also the
//! [`AuthGate`] consulted by the HTTP adapter, so a 401 from the remote
//! tears the session down and redirects to the sign-in route.

use std::sync::Arc;
use std::time::Duration;

use mockable::{Clock, DefaultClock};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::domain::ports::{
    AuthGate, KeyValueStorage, Navigator, Route, Sleeper, StorageError, TokioSleeper,
};
use crate::domain::{
    AuthSession, AuthUser, PersistedSession, SessionStatus, SessionToken, SignInCredentials,
    SignUpCredentials,
};

/// Storage key of the persisted session.
pub const SESSION_STORAGE_KEY: &str = "todo-client-auth";
/// Delay simulating the round trip of a real authentication call.
pub const SIMULATED_AUTH_LATENCY: Duration = Duration::from_millis(600);

/// Owns the current [`AuthSession`] and its persistence.
///
/// # Examples
/// ```rust,ignore
/// use std::sync::Arc;
///
/// use todo_client::domain::{SessionService, SignInCredentials};
/// use todo_client::domain::ports::{InMemoryStorage, NoOpNavigator};
///
/// let service = SessionService::new(Arc::new(InMemoryStorage::default()), Arc::new(NoOpNavigator));
/// let creds = SignInCredentials::try_from_parts("ada@example.com", "secret1")?;
/// let session = service.sign_in(&creds).await;
/// assert!(session.is_authenticated());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct SessionService {
    storage: Arc<dyn KeyValueStorage>,
    navigator: Arc<dyn Navigator>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    state: watch::Sender<AuthSession>,
}

impl SessionService {
    /// Anonymous session using the system clock and tokio timers.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>, navigator: Arc<dyn Navigator>) -> Self {
        Self::with_runtime(
            storage,
            navigator,
            Arc::new(DefaultClock),
            Arc::new(TokioSleeper),
        )
    }

    /// Anonymous session with explicit time sources.
    #[must_use]
    pub fn with_runtime(
        storage: Arc<dyn KeyValueStorage>,
        navigator: Arc<dyn Navigator>,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        let (state, _) = watch::channel(AuthSession::anonymous());
        Self {
            storage,
            navigator,
            clock,
            sleeper,
            state,
        }
    }

    /// Rehydrate the session from storage.
    ///
    /// Unreadable or malformed blobs leave the session anonymous.
    pub fn restore(&self) -> AuthSession {
        let persisted = match self.load() {
            Ok(stored) => stored.unwrap_or_default(),
            Err(err) => {
                warn!(error = %err, "ignoring unreadable session");
                PersistedSession::default()
            }
        };
        let session = AuthSession::restore(persisted);
        self.state.send_replace(session.clone());
        session
    }

    fn load(&self) -> Result<Option<PersistedSession>, StorageError> {
        let Some(raw) = self.storage.read(SESSION_STORAGE_KEY)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| StorageError::serialization(err.to_string()))
    }

    fn persist(&self, session: &AuthSession) {
        let result = serde_json::to_string(&session.to_persisted())
            .map_err(|err| StorageError::serialization(err.to_string()))
            .and_then(|raw| self.storage.write(SESSION_STORAGE_KEY, &raw));
        if let Err(err) = result {
            warn!(error = %err, "failed to persist session");
        }
    }

    /// Current session.
    #[must_use]
    pub fn session(&self) -> AuthSession {
        self.state.borrow().clone()
    }

    /// Observe session changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthSession> {
        self.state.subscribe()
    }

    async fn establish(&self, user: AuthUser) -> AuthSession {
        self.state
            .send_modify(|session| session.status = SessionStatus::Loading);
        self.sleeper.sleep(SIMULATED_AUTH_LATENCY).await;

        let token = SessionToken::issued_at(self.clock.utc());
        let session = AuthSession::authenticated(user, token);
        self.state.send_replace(session.clone());
        self.persist(&session);
        info!(
            user_id = session.user.as_ref().map(|signed_in| signed_in.id.as_str()),
            "session started"
        );
        self.navigator.navigate(Route::Home);
        session
    }

    /// Start a session named after the email local part.
    pub async fn sign_in(&self, credentials: &SignInCredentials) -> AuthSession {
        let name = AuthUser::name_from_email(credentials.email());
        self.establish(AuthUser::fabricate(credentials.email(), name))
            .await
    }

    /// Start a session for a newly registered user.
    pub async fn sign_up(&self, credentials: &SignUpCredentials) -> AuthSession {
        self.establish(AuthUser::fabricate(credentials.email(), credentials.name()))
            .await
    }

    /// End the session and persist the cleared state.
    pub fn sign_out(&self) {
        self.clear();
        info!("session ended");
    }

    /// Clear the session after the remote rejected it.
    pub fn reset(&self) {
        self.clear();
    }

    fn clear(&self) {
        let session = AuthSession::anonymous();
        self.state.send_replace(session.clone());
        self.persist(&session);
    }
}

impl AuthGate for SessionService {
    fn bearer_token(&self) -> Option<String> {
        self.state
            .borrow()
            .token
            .as_ref()
            .map(|token| token.as_str().to_owned())
    }

    fn on_unauthorized(&self) {
        warn!("remote rejected the session; signing out");
        self.reset();
        self.navigator.navigate(Route::SignIn);
    }
}

//! Driven port the HTTP adapter consults around every request.
//!
//! Before sending, the adapter asks for a bearer token; when the remote
//! answers 401 it reports the rejection so the session can be torn down.

/// Session hooks used by outbound adapters.
#[cfg_attr(test, mockall::automock)]
pub trait AuthGate: Send + Sync {
    /// Bearer token to attach, if a session is active.
    fn bearer_token(&self) -> Option<String>;

    /// Called once per 401 response.
    fn on_unauthorized(&self);
}

/// Gate for unauthenticated use: no token, 401s are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousGate;

impl AuthGate for AnonymousGate {
    fn bearer_token(&self) -> Option<String> {
        None
    }

    fn on_unauthorized(&self) {}
}

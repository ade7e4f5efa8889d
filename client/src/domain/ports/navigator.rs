//! Driven port for navigation requests raised by the auth flow.

use std::fmt;

/// Destinations the core can ask the view layer to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The todo list.
    Home,
    /// The sign-in form.
    SignIn,
}

impl Route {
    /// Path of the route.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::SignIn => "/auth/sign-in",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Sink for navigation requests.
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    /// Request a redirect to `route`.
    fn navigate(&self, route: Route);
}

/// Navigator that ignores redirects.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpNavigator;

impl Navigator for NoOpNavigator {
    fn navigate(&self, _route: Route) {}
}

//! Session primitives for the simulated authentication flow.
//!
//! Credentials are validated here so forms can reject bad input before the
//! session service is involved. Sessions are fabricated locally; the token
//! is opaque and only ever echoed back to the remote as a bearer token.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::Zeroizing;

/// Minimum accepted password length.
pub const PASSWORD_MIN: usize = 6;
/// Minimum accepted sign-up name length, once trimmed.
pub const NAME_MIN: usize = 2;
/// Display name used when an email has no usable local part.
pub const FALLBACK_NAME: &str = "Guest";

/// Validation errors returned by the credential constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsValidationError {
    /// Email does not look like `local@domain.tld`.
    InvalidEmail,
    /// Password is shorter than [`PASSWORD_MIN`].
    PasswordTooShort {
        /// Minimum accepted length.
        min: usize,
    },
    /// Name is shorter than [`NAME_MIN`].
    NameTooShort {
        /// Minimum accepted length.
        min: usize,
    },
}

impl fmt::Display for CredentialsValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEmail => write!(f, "enter a valid email address"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
            Self::NameTooShort { min } => write!(f, "name must be at least {min} characters"),
        }
    }
}

impl std::error::Error for CredentialsValidationError {}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Syntactically valid email address.
///
/// # Examples
/// ```
/// use todo_client::domain::Email;
///
/// let email = Email::new(" ada@example.com ").expect("valid email");
/// assert_eq!(email.as_str(), "ada@example.com");
/// assert_eq!(email.local_part(), "ada");
/// assert!(Email::new("ada@example").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Validate and construct an email, trimming surrounding whitespace.
    pub fn new(raw: &str) -> Result<Self, CredentialsValidationError> {
        let trimmed = raw.trim();
        if !email_regex().is_match(trimmed) {
            return Err(CredentialsValidationError::InvalidEmail);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Part before the `@`.
    #[must_use]
    pub fn local_part(&self) -> &str {
        self.0.split('@').next().unwrap_or_default()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn checked_password(password: &str) -> Result<Zeroizing<String>, CredentialsValidationError> {
    if password.chars().count() < PASSWORD_MIN {
        return Err(CredentialsValidationError::PasswordTooShort { min: PASSWORD_MIN });
    }
    Ok(Zeroizing::new(password.to_owned()))
}

/// Validated sign-in form input.
///
/// ## Invariants
/// - `email` matches `local@domain.tld`.
/// - `password` has at least [`PASSWORD_MIN`] characters and is wiped on drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInCredentials {
    email: Email,
    password: Zeroizing<String>,
}

impl SignInCredentials {
    /// Construct credentials from raw form fields.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        Ok(Self {
            email: Email::new(email)?,
            password: checked_password(password)?,
        })
    }

    /// Validated email.
    #[must_use]
    pub const fn email(&self) -> &Email {
        &self.email
    }

    /// Password provided by the caller.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validated sign-up form input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpCredentials {
    name: String,
    email: Email,
    password: Zeroizing<String>,
}

impl SignUpCredentials {
    /// Construct credentials from raw form fields.
    pub fn try_from_parts(
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Self, CredentialsValidationError> {
        let name = name.trim();
        if name.chars().count() < NAME_MIN {
            return Err(CredentialsValidationError::NameTooShort { min: NAME_MIN });
        }
        Ok(Self {
            name: name.to_owned(),
            email: Email::new(email)?,
            password: checked_password(password)?,
        })
    }

    /// Trimmed display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Validated email.
    #[must_use]
    pub const fn email(&self) -> &Email {
        &self.email
    }

    /// Password provided by the caller.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Signed-in user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Random UUID assigned at sign-in.
    pub id: String,
    /// Email used to sign in.
    pub email: String,
    /// Display name.
    pub name: String,
}

impl AuthUser {
    /// Fabricate a user for `email` with a fresh random id.
    #[must_use]
    pub fn fabricate(email: &Email, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.as_str().to_owned(),
            name: name.into(),
        }
    }

    /// Display name derived from the email local part.
    #[must_use]
    pub fn name_from_email(email: &Email) -> String {
        let local = email.local_part();
        if local.is_empty() {
            FALLBACK_NAME.to_owned()
        } else {
            local.to_owned()
        }
    }
}

/// Opaque bearer token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap an existing token.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Fabricate the token for a session started at `now`.
    ///
    /// # Examples
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use todo_client::domain::SessionToken;
    ///
    /// let now = Utc.timestamp_millis_opt(1_700_000_000_123).single().expect("valid time");
    /// assert_eq!(SessionToken::issued_at(now).as_str(), "dummy-token-1700000000123");
    /// ```
    #[must_use]
    pub fn issued_at(now: DateTime<Utc>) -> Self {
        Self(format!("dummy-token-{}", now.timestamp_millis()))
    }

    /// Borrow the token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

/// Lifecycle state of the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Nobody is signed in.
    #[default]
    Anonymous,
    /// A user and token are present.
    Authenticated,
    /// A sign-in or sign-up is in progress.
    Loading,
}

/// Durable part of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    /// Signed-in user.
    #[serde(default)]
    pub user: Option<AuthUser>,
    /// Bearer token.
    #[serde(default)]
    pub token: Option<SessionToken>,
}

/// Current session as seen by the rest of the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSession {
    /// Signed-in user.
    pub user: Option<AuthUser>,
    /// Bearer token.
    pub token: Option<SessionToken>,
    /// Lifecycle state.
    pub status: SessionStatus,
}

impl AuthSession {
    /// Session with nobody signed in.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Authenticated session for `user`.
    #[must_use]
    pub fn authenticated(user: AuthUser, token: SessionToken) -> Self {
        Self {
            user: Some(user),
            token: Some(token),
            status: SessionStatus::Authenticated,
        }
    }

    /// Rehydrate a stored session; it is authenticated only when both the
    /// user and the token survived.
    #[must_use]
    pub fn restore(persisted: PersistedSession) -> Self {
        let status = if persisted.user.is_some() && persisted.token.is_some() {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Anonymous
        };
        Self {
            user: persisted.user,
            token: persisted.token,
            status,
        }
    }

    /// Whether the session is authenticated.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }

    /// Durable part of the session.
    #[must_use]
    pub fn to_persisted(&self) -> PersistedSession {
        PersistedSession {
            user: self.user.clone(),
            token: self.token.clone(),
        }
    }
}

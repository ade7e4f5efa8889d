//! Client configuration loaded via OrthoConfig.
//!
//! Numeric limits carry OrthoConfig defaults; the remaining fields are
//! optional and their accessors apply the defaults, so an empty environment
//! yields a working client against the public demo API.

use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::domain::Theme;

const DEFAULT_API_URL: &str = "https://jsonplaceholder.typicode.com";
const DEFAULT_APP_NAME: &str = "Second Brain Todo";
const DEFAULT_STORAGE_DIR: &str = ".todo-client";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_LIST_LIMIT: usize = 20;

/// Configuration values for the todo client.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "TODO")]
pub struct ClientSettings {
    /// Base URL of the todo REST API.
    pub api_url: Option<String>,
    /// Name shown in headers and logs.
    pub app_name: Option<String>,
    /// Directory holding the persisted session and theme.
    pub storage_dir: Option<PathBuf>,
    /// Per-request timeout in seconds; zero selects the default.
    #[ortho_config(default = 10)]
    pub request_timeout_secs: u64,
    /// Number of todos fetched for the list; zero selects the default.
    #[ortho_config(default = 20)]
    pub list_limit: usize,
    /// Theme used when none has been stored (`light` or `dark`).
    pub preferred_theme: Option<String>,
}

impl ClientSettings {
    /// Parsed API base URL, falling back to the public demo API.
    ///
    /// # Errors
    ///
    /// Returns an error when the configured value is not an absolute URL.
    pub fn api_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(self.api_url.as_deref().unwrap_or(DEFAULT_API_URL))
    }

    /// Application name, falling back to the default.
    #[must_use]
    pub fn app_name(&self) -> &str {
        self.app_name.as_deref().unwrap_or(DEFAULT_APP_NAME)
    }

    /// Storage directory, falling back to `.todo-client`.
    #[must_use]
    pub fn storage_dir(&self) -> PathBuf {
        self.storage_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR))
    }

    /// Request timeout, falling back to ten seconds.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        let secs = match self.request_timeout_secs {
            0 => DEFAULT_REQUEST_TIMEOUT_SECS,
            secs => secs,
        };
        Duration::from_secs(secs)
    }

    /// List size, falling back to twenty.
    #[must_use]
    pub fn list_limit(&self) -> usize {
        match self.list_limit {
            0 => DEFAULT_LIST_LIMIT,
            limit => limit,
        }
    }

    /// Platform theme preference; unrecognised values are ignored.
    #[must_use]
    pub fn preferred_theme(&self) -> Option<Theme> {
        let raw = self.preferred_theme.as_deref()?;
        raw.parse::<Theme>()
            .inspect_err(|err| warn!(error = %err, "ignoring preferred theme"))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for client configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 6] = [
        "TODO_API_URL",
        "TODO_APP_NAME",
        "TODO_STORAGE_DIR",
        "TODO_REQUEST_TIMEOUT_SECS",
        "TODO_LIST_LIMIT",
        "TODO_PREFERRED_THEME",
    ];

    fn load_from_empty_args() -> ClientSettings {
        ClientSettings::load_from_iter([OsString::from("todo-client")])
            .expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(
            settings.api_url().expect("default url").as_str(),
            "https://jsonplaceholder.typicode.com/"
        );
        assert_eq!(settings.app_name(), DEFAULT_APP_NAME);
        assert_eq!(settings.storage_dir(), PathBuf::from(DEFAULT_STORAGE_DIR));
        assert_eq!(settings.request_timeout(), Duration::from_secs(10));
        assert_eq!(settings.list_limit(), 20);
        assert_eq!(settings.preferred_theme(), None);
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("TODO_API_URL", Some("http://localhost:3000/api".to_owned())),
            ("TODO_APP_NAME", Some("Inbox".to_owned())),
            ("TODO_STORAGE_DIR", Some("/tmp/todo-state".to_owned())),
            ("TODO_REQUEST_TIMEOUT_SECS", Some("3".to_owned())),
            ("TODO_LIST_LIMIT", Some("5".to_owned())),
            ("TODO_PREFERRED_THEME", Some("light".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(
            settings.api_url().expect("configured url").as_str(),
            "http://localhost:3000/api"
        );
        assert_eq!(settings.app_name(), "Inbox");
        assert_eq!(settings.storage_dir(), PathBuf::from("/tmp/todo-state"));
        assert_eq!(settings.request_timeout(), Duration::from_secs(3));
        assert_eq!(settings.list_limit(), 5);
        assert_eq!(settings.preferred_theme(), Some(Theme::Light));
    }

    #[rstest]
    fn invalid_urls_are_rejected() {
        let _guard = lock_env([("TODO_API_URL", Some("not a url".to_owned()))]);

        let settings = load_from_empty_args();
        assert!(settings.api_url().is_err());
    }

    #[rstest]
    fn empty_environment_loads_the_numeric_defaults() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(settings.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert_eq!(settings.list_limit, DEFAULT_LIST_LIMIT);
        assert_eq!(settings.api_url, None);
    }

    #[rstest]
    fn zero_limits_fall_back_to_defaults() {
        let _guard = lock_env([
            ("TODO_REQUEST_TIMEOUT_SECS", Some("0".to_owned())),
            ("TODO_LIST_LIMIT", Some("0".to_owned())),
            ("TODO_PREFERRED_THEME", Some("sepia".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(settings.request_timeout(), Duration::from_secs(10));
        assert_eq!(settings.list_limit(), 20);
        assert_eq!(settings.preferred_theme(), None);
    }
}

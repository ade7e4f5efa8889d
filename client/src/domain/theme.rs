//! Persisted light/dark theme preference.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::ports::{KeyValueStorage, StorageError};

/// Storage key of the persisted theme.
pub const THEME_STORAGE_KEY: &str = "todo-client-theme";

/// Colour theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light theme.
    Light,
    /// Dark theme, used when nothing else is known.
    #[default]
    Dark,
}

impl Theme {
    /// The other theme.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(format!("unknown theme: {other}")),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct StoredTheme {
    theme: Theme,
}

/// Current theme plus its persistence.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use todo_client::domain::{Theme, ThemeService};
/// use todo_client::domain::ports::InMemoryStorage;
///
/// let service = ThemeService::load(Arc::new(InMemoryStorage::default()), Some(Theme::Light));
/// assert_eq!(service.current(), Theme::Light);
/// assert_eq!(service.toggle(), Theme::Dark);
/// ```
pub struct ThemeService {
    storage: Arc<dyn KeyValueStorage>,
    current: Mutex<Theme>,
}

impl ThemeService {
    /// Resolve the theme: stored value, then `platform_preference`, then
    /// [`Theme::Dark`].
    #[must_use]
    pub fn load(storage: Arc<dyn KeyValueStorage>, platform_preference: Option<Theme>) -> Self {
        let stored = match Self::read(storage.as_ref()) {
            Ok(stored) => stored,
            Err(err) => {
                warn!(error = %err, "ignoring unreadable theme");
                None
            }
        };
        let current = stored.or(platform_preference).unwrap_or_default();
        Self {
            storage,
            current: Mutex::new(current),
        }
    }

    fn read(storage: &dyn KeyValueStorage) -> Result<Option<Theme>, StorageError> {
        let Some(raw) = storage.read(THEME_STORAGE_KEY)? else {
            return Ok(None);
        };
        serde_json::from_str::<StoredTheme>(&raw)
            .map(|stored| Some(stored.theme))
            .map_err(|err| StorageError::serialization(err.to_string()))
    }

    /// Active theme.
    #[must_use]
    pub fn current(&self) -> Theme {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Switch to `theme` and persist it.
    pub fn set(&self, theme: Theme) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = theme;
        self.persist(theme);
    }

    /// Switch to the other theme, returning it.
    pub fn toggle(&self) -> Theme {
        let next = {
            let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
            *current = current.toggled();
            *current
        };
        self.persist(next);
        next
    }

    fn persist(&self, theme: Theme) {
        let result = serde_json::to_string(&StoredTheme { theme })
            .map_err(|err| StorageError::serialization(err.to_string()))
            .and_then(|raw| self.storage.write(THEME_STORAGE_KEY, &raw));
        if let Err(err) = result {
            warn!(error = %err, "failed to persist theme");
        }
    }
}

#[cfg(test)]
mod tests {
    //! Theme resolution order and persistence.
    use super::*;
    use crate::domain::ports::InMemoryStorage;
    use rstest::rstest;

    #[rstest]
    #[case(Some("{\"theme\":\"light\"}"), Some(Theme::Dark), Theme::Light)]
    #[case(None, Some(Theme::Light), Theme::Light)]
    #[case(None, None, Theme::Dark)]
    #[case(Some("{\"theme\":\"sepia\"}"), Some(Theme::Light), Theme::Light)]
    fn resolution_prefers_storage_then_platform(
        #[case] stored: Option<&str>,
        #[case] platform: Option<Theme>,
        #[case] expected: Theme,
    ) {
        let storage = match stored {
            Some(raw) => InMemoryStorage::with_entry(THEME_STORAGE_KEY, raw),
            None => InMemoryStorage::default(),
        };
        let service = ThemeService::load(Arc::new(storage), platform);
        assert_eq!(service.current(), expected);
    }

    #[rstest]
    fn toggling_persists_the_new_theme() {
        let storage = Arc::new(InMemoryStorage::default());
        let service = ThemeService::load(storage.clone(), None);

        assert_eq!(service.toggle(), Theme::Light);

        let reloaded = ThemeService::load(storage, Some(Theme::Dark));
        assert_eq!(reloaded.current(), Theme::Light);
    }

    #[rstest]
    fn set_overrides_and_persists() {
        let storage = Arc::new(InMemoryStorage::default());
        let service = ThemeService::load(storage.clone(), Some(Theme::Light));

        service.set(Theme::Dark);

        assert_eq!(
            storage.read(THEME_STORAGE_KEY).expect("read").as_deref(),
            Some("{\"theme\":\"dark\"}")
        );
    }

    #[rstest]
    #[case("LIGHT", Ok(Theme::Light))]
    #[case(" dark ", Ok(Theme::Dark))]
    #[case("blue", Err("unknown theme: blue".to_owned()))]
    fn themes_parse_from_text(#[case] raw: &str, #[case] expected: Result<Theme, String>) {
        assert_eq!(raw.parse::<Theme>(), expected);
    }
}

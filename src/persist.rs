//! Durable locale persistence
//!
//! A single string value stored under a well-known location, read on
//! session initialization and written on every successful locale
//! switch. A malformed stored value is recovered locally (warn and
//! treat as absent); it never surfaces to the caller.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::warn;

use crate::error::{PersistError, PersistResult};
use crate::locale::Locale;

/// Stores the chosen locale between sessions
pub trait LocaleStore: Send + Sync {
    /// Reads the persisted locale, if any.
    ///
    /// A missing or malformed value yields `None`; recovery from bad
    /// data happens here, not in the caller.
    fn load(&self) -> Option<Locale>;

    /// Persists the locale
    fn save(&self, locale: &Locale) -> PersistResult<()>;
}

/// File-backed store holding the locale code as the file's contents
#[derive(Debug, Clone)]
pub struct FileLocaleStore {
    path: PathBuf,
}

impl FileLocaleStore {
    /// Creates a store over an explicit file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The conventional per-app location under the user config dir
    /// (e.g. `~/.config/<app>/locale`)
    pub fn default_path(app: &str) -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(app)
            .join("locale")
    }
}

impl LocaleStore for FileLocaleStore {
    fn load(&self) -> Option<Locale> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to read persisted locale");
                return None;
            }
        };

        let value = raw.trim();
        match value.parse() {
            Ok(locale) => Some(locale),
            Err(_) => {
                let err = PersistError::Malformed {
                    value: value.to_string(),
                };
                warn!(path = %self.path.display(), %err, "ignoring persisted locale");
                None
            }
        }
    }

    fn save(&self, locale: &Locale) -> PersistResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PersistError::WriteFailed {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        }
        std::fs::write(&self.path, locale.to_string()).map_err(|e| PersistError::WriteFailed {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }
}

/// In-memory store for tests and hosts without durable storage
#[derive(Debug, Clone, Default)]
pub struct MemoryLocaleStore {
    value: Arc<Mutex<Option<Locale>>>,
}

impl MemoryLocaleStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with a value
    pub fn with_value(locale: Locale) -> Self {
        Self {
            value: Arc::new(Mutex::new(Some(locale))),
        }
    }
}

impl LocaleStore for MemoryLocaleStore {
    fn load(&self) -> Option<Locale> {
        self.value.lock().expect("locale store lock poisoned").clone()
    }

    fn save(&self, locale: &Locale) -> PersistResult<()> {
        *self.value.lock().expect("locale store lock poisoned") = Some(locale.clone());
        Ok(())
    }
}

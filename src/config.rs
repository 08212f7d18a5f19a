//! Runtime configuration
//!
//! TOML-backed settings shared by the apps embedding the runtime:
//! fallback locale, per-fetch timeout, persistence location, and the
//! per-app category tables that decide which translation sections each
//! app ships.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigResult;
use crate::filter::CategoryFilter;

/// i18n runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct I18nConfig {
    #[serde(default = "default_fallback_locale")]
    pub fallback_locale: String,
    #[serde(default)]
    pub default_locale: Option<String>,
    #[serde(default = "default_load_timeout_ms")]
    pub load_timeout_ms: u64,
    #[serde(default)]
    pub persistence_path: Option<PathBuf>,
    #[serde(default)]
    pub apps: HashMap<String, AppCategories>,
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            fallback_locale: default_fallback_locale(),
            default_locale: None,
            load_timeout_ms: default_load_timeout_ms(),
            persistence_path: None,
            apps: HashMap::new(),
        }
    }
}

/// Category selection for one app: an allow-list or a deny-list of
/// top-level key prefixes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppCategories {
    #[serde(default)]
    pub included: Vec<String>,
    #[serde(default)]
    pub excluded: Vec<String>,
}

impl AppCategories {
    /// The effective filter for this app
    pub fn to_filter(&self) -> CategoryFilter {
        CategoryFilter::from_lists(&self.included, &self.excluded)
    }
}

impl I18nConfig {
    /// Parses configuration from a TOML string
    pub fn from_toml(input: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(input)?)
    }

    /// The category filter for `app`; unknown apps ship everything
    pub fn category_filter(&self, app: &str) -> CategoryFilter {
        self.apps
            .get(app)
            .map(AppCategories::to_filter)
            .unwrap_or_default()
    }

    /// The per-fetch timeout as a [`Duration`]
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }
}

fn default_fallback_locale() -> String {
    "en".to_string()
}

fn default_load_timeout_ms() -> u64 {
    10_000
}

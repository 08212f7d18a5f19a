//! Phrasebook Library
//!
//! A multi-app translation (i18n) runtime:
//! - Locale resolution with regional-variant discovery
//! - Base/regional catalog merge with graceful fallback lookup
//! - `{name}`-style parameter interpolation
//! - Category filtering so each app ships only the sections it needs
//! - A key-path index for typed, inspectable key references
//! - A session controller with persistence and observable state

pub mod catalog;
pub mod config;
pub mod error;
pub mod filter;
pub mod keypath;
pub mod loader;
pub mod locale;
pub mod persist;
pub mod retry;
pub mod session;
pub mod source;

pub use catalog::{interpolate, Catalog, CatalogStore};
pub use config::{AppCategories, I18nConfig};
pub use error::{CatalogError, ConfigError, I18nError, LocaleError, PersistError, Result};
pub use filter::{filter_categories, CategoryFilter};
pub use keypath::{KeyPathIndex, KeyPathNode};
pub use loader::CatalogLoader;
pub use locale::{resolve_regional_variant, Locale};
pub use persist::{FileLocaleStore, LocaleStore, MemoryLocaleStore};
pub use retry::RetryPolicy;
pub use session::{LocaleSession, SessionSnapshot, SessionState};
pub use source::{CatalogSource, DirCatalogSource, StaticCatalogSource};

//! `Phrasebook` Error Types
//!
//! Centralized error handling using thiserror for type-safe errors.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for `Phrasebook`
#[derive(Error, Debug)]
pub enum I18nError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Locale error: {0}")]
    Locale(#[from] LocaleError),

    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Catalog loading errors
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog fetch failed for locale '{locale}': {reason}")]
    FetchFailed { locale: String, reason: String },

    #[error("Backing source rejected the request: {message}")]
    SourceRejected { message: String },

    #[error("Catalog fetch for locale '{locale}' timed out after {timeout_ms}ms")]
    Timeout { locale: String, timeout_ms: u64 },

    #[error("Malformed catalog data ({context}): {reason}")]
    Malformed { context: String, reason: String },

    #[error("Catalog directory '{path}' unavailable: {reason}")]
    Directory { path: PathBuf, reason: String },
}

/// Locale parsing and resolution errors
#[derive(Error, Debug)]
pub enum LocaleError {
    #[error("Invalid locale code: '{0}'")]
    Invalid(String),

    #[error("Locale '{0}' is not in the available set")]
    Unavailable(String),
}

/// Locale persistence errors
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Failed to write persisted locale to '{path}': {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("Persisted locale value '{value}' is malformed")]
    Malformed { value: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type alias for `Phrasebook` operations
pub type Result<T> = std::result::Result<T, I18nError>;

/// Result type alias for catalog operations
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Result type alias for locale operations
pub type LocaleResult<T> = std::result::Result<T, LocaleError>;

/// Result type alias for persistence operations
pub type PersistResult<T> = std::result::Result<T, PersistError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

//! Locale codes and regional-variant resolution
//!
//! A locale code is either a bare language (`"en"`) or a
//! language-region pair with exactly one hyphen (`"en-GB"`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{LocaleError, LocaleResult};

/// A parsed locale code: language plus optional region
///
/// # Examples
///
/// ```
/// use phrasebook::locale::Locale;
///
/// let locale: Locale = "de-AT".parse().unwrap();
/// assert_eq!(locale.language(), "de");
/// assert_eq!(locale.region(), Some("AT"));
/// assert_eq!(locale.base().to_string(), "de");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locale {
    language: String,
    region: Option<String>,
}

impl Locale {
    /// Creates a bare-language locale
    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_lowercase(),
            region: None,
        }
    }

    /// Creates a locale with language and region
    pub fn with_region(language: &str, region: &str) -> Self {
        Self {
            language: language.to_lowercase(),
            region: Some(region.to_uppercase()),
        }
    }

    /// ISO 639-1 language code (always lowercase)
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Region tag, if present (always uppercase)
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Whether this locale carries a region tag
    pub fn has_region(&self) -> bool {
        self.region.is_some()
    }

    /// The bare base language of this locale (`"de-AT"` -> `"de"`)
    pub fn base(&self) -> Locale {
        Locale {
            language: self.language.clone(),
            region: None,
        }
    }

    /// Reads the locale from the environment (LANG, LC_ALL, LC_MESSAGES)
    ///
    /// Handles the POSIX `en_US.UTF-8` form by stripping the encoding
    /// suffix and normalizing `_` to `-`. Returns `None` when nothing
    /// parsable is set (e.g. `LANG=C`).
    pub fn system_default() -> Option<Self> {
        std::env::var("LANG")
            .or_else(|_| std::env::var("LC_ALL"))
            .or_else(|_| std::env::var("LC_MESSAGES"))
            .ok()
            .and_then(|lang| {
                let locale_part = lang.split('.').next()?;
                let normalized = locale_part.replace('_', "-");
                normalized.parse().ok()
            })
    }
}

impl FromStr for Locale {
    type Err = LocaleError;

    fn from_str(s: &str) -> LocaleResult<Self> {
        let parts: Vec<&str> = s.split('-').collect();

        if parts.len() > 2 {
            return Err(LocaleError::Invalid(s.to_string()));
        }

        let language = parts[0];
        if !(2..=3).contains(&language.len()) || !language.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(LocaleError::Invalid(s.to_string()));
        }

        let region = match parts.get(1) {
            Some(region) => {
                if !(2..=3).contains(&region.len())
                    || !region.chars().all(|c| c.is_ascii_alphanumeric())
                {
                    return Err(LocaleError::Invalid(s.to_string()));
                }
                Some(region.to_uppercase())
            }
            None => None,
        };

        Ok(Self {
            language: language.to_lowercase(),
            region,
        })
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.region {
            Some(region) => write!(f, "{}-{}", self.language, region),
            None => write!(f, "{}", self.language),
        }
    }
}

impl TryFrom<String> for Locale {
    type Error = LocaleError;

    fn try_from(value: String) -> LocaleResult<Self> {
        value.parse()
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.to_string()
    }
}

/// Finds the best concrete regional catalog for a bare language code.
///
/// Tries the doubled form first (`nl` -> `nl-NL`), then the first code
/// in `available` with a `{base_lang}-` prefix, in the order the caller
/// supplied. Returns `None` when no regional variant exists.
///
/// Pure function, no side effects.
pub fn resolve_regional_variant(base_lang: &str, available: &[String]) -> Option<String> {
    let doubled = format!("{}-{}", base_lang, base_lang.to_uppercase());
    if available.iter().any(|code| *code == doubled) {
        return Some(doubled);
    }

    let prefix = format!("{base_lang}-");
    available.iter().find(|code| code.starts_with(&prefix)).cloned()
}

//! Translation catalogs and the in-memory catalog store
//!
//! A catalog is a flat map from a dot-delimited key (`"common.save"`)
//! to a translation value that may contain `{name}` placeholders.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Flat key -> string translation table for one locale
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: HashMap<String, String>,
}

impl Catalog {
    /// Creates an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a value by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|s| s.as_str())
    }

    /// Inserts a key/value pair
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Whether the catalog contains `key`
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over all keys
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterates over all entries
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Overlays `regional` onto this catalog
    ///
    /// Catalogs are flat string maps, so the merge is per-key: a key
    /// present in `regional` always wins.
    pub fn merge_from(&mut self, regional: &Catalog) {
        for (key, value) in &regional.entries {
            self.entries.insert(key.clone(), value.clone());
        }
    }

    /// Parses a catalog from a flat JSON object
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl FromIterator<(String, String)> for Catalog {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Catalog {
    type Item = (String, String);
    type IntoIter = std::collections::hash_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(\w+)\}").expect("placeholder pattern is valid"));

/// Replaces `{identifier}` tokens (word characters only) with values
/// from `args`. Tokens whose identifier is absent are left verbatim.
///
/// # Examples
///
/// ```
/// use phrasebook::catalog::interpolate;
///
/// assert_eq!(
///     interpolate("Welcome {name}!", &[("name", "Ana")]),
///     "Welcome Ana!"
/// );
/// assert_eq!(interpolate("Welcome {name}!", &[]), "Welcome {name}!");
/// ```
pub fn interpolate(template: &str, args: &[(&str, &str)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            let name = &caps[1];
            match args.iter().find(|(key, _)| *key == name) {
                Some((_, value)) => (*value).to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// In-memory mapping from locale code to its loaded catalog
///
/// Owned exclusively by one session controller: a locale is either
/// present with a complete, ready-to-query catalog or absent. Merging
/// happens before insertion, never in place.
#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    catalogs: HashMap<String, Catalog>,
}

impl CatalogStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a complete catalog for a locale, replacing any previous one
    pub fn put(&mut self, locale: impl Into<String>, catalog: Catalog) {
        self.catalogs.insert(locale.into(), catalog);
    }

    /// Gets the catalog for a locale
    pub fn get(&self, locale: &str) -> Option<&Catalog> {
        self.catalogs.get(locale)
    }

    /// Evicts the catalog for a locale
    pub fn remove(&mut self, locale: &str) -> Option<Catalog> {
        self.catalogs.remove(locale)
    }

    /// Whether a locale is loaded
    pub fn contains(&self, locale: &str) -> bool {
        self.catalogs.contains_key(locale)
    }

    /// Loaded locale codes, sorted for deterministic output
    pub fn locales(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.catalogs.keys().cloned().collect();
        codes.sort_unstable();
        codes
    }

    /// Keys present in `reference` but missing from `locale`, sorted
    ///
    /// Useful for translation QA: run against the fallback locale to
    /// list untranslated keys.
    pub fn missing_keys(&self, locale: &str, reference: &str) -> Vec<String> {
        let target = self.catalogs.get(locale);
        let mut missing: Vec<String> = match self.catalogs.get(reference) {
            Some(reference) => reference
                .keys()
                .filter(|key| target.map_or(true, |c| !c.contains_key(key)))
                .map(String::from)
                .collect(),
            None => Vec::new(),
        };
        missing.sort_unstable();
        missing
    }
}

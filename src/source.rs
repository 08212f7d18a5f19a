//! Backing catalog sources
//!
//! A [`CatalogSource`] hands out one locale's flat catalog at a time.
//! Bindings provided here:
//! - [`StaticCatalogSource`]: pre-generated per-locale maps held in memory
//! - [`DirCatalogSource`]: one flat JSON file per locale in a directory
//! - the remote export envelope, decoded into a `StaticCatalogSource`
//!   (transport stays with the host application)

use futures::future::BoxFuture;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::catalog::Catalog;
use crate::error::{CatalogError, CatalogResult};

/// Pluggable backing source for per-locale catalogs
///
/// Callers confirm a locale is available before fetching; sources do
/// not re-validate beyond failing the fetch.
pub trait CatalogSource: Send + Sync {
    /// Fetches the flat catalog for one locale
    fn fetch_catalog<'a>(&'a self, locale: &'a str) -> BoxFuture<'a, CatalogResult<Catalog>>;

    /// Locale codes this source can serve, in a stable order
    fn available_locales(&self) -> Vec<String>;
}

/// In-memory source over pre-generated per-locale catalogs
///
/// The consumption side of the generated-catalog build step: one flat
/// map per locale plus the available-locale list.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalogSource {
    catalogs: HashMap<String, Catalog>,
    available: Vec<String>,
}

impl StaticCatalogSource {
    /// Creates an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a locale's catalog, appending it to the available list
    pub fn with_locale(mut self, code: impl Into<String>, catalog: Catalog) -> Self {
        let code = code.into();
        if !self.available.contains(&code) {
            self.available.push(code.clone());
        }
        self.catalogs.insert(code, catalog);
        self
    }

    /// Decodes a remote export envelope into a source.
    ///
    /// The envelope shape is
    /// `{ success, data: { keys, languages, translations }, metadata, error? }`
    /// with `translations` keyed by locale code. A non-success envelope
    /// becomes [`CatalogError::SourceRejected`].
    pub fn from_export_json(json: &str) -> CatalogResult<Self> {
        let response: ExportResponse =
            serde_json::from_str(json).map_err(|e| CatalogError::Malformed {
                context: "export envelope".to_string(),
                reason: e.to_string(),
            })?;

        if !response.success {
            return Err(CatalogError::SourceRejected {
                message: response
                    .error
                    .unwrap_or_else(|| "no error message supplied".to_string()),
            });
        }

        let data = response.data.ok_or_else(|| CatalogError::Malformed {
            context: "export envelope".to_string(),
            reason: "success response without data".to_string(),
        })?;

        let mut source = Self::new();
        // The languages list fixes the available order; translations
        // without a language entry are still reachable.
        for language in &data.languages {
            if !source.available.contains(&language.code) {
                source.available.push(language.code.clone());
            }
        }
        for (code, entries) in data.translations {
            if !source.available.contains(&code) {
                source.available.push(code.clone());
            }
            source
                .catalogs
                .insert(code, entries.into_iter().collect());
        }
        Ok(source)
    }
}

impl CatalogSource for StaticCatalogSource {
    fn fetch_catalog<'a>(&'a self, locale: &'a str) -> BoxFuture<'a, CatalogResult<Catalog>> {
        Box::pin(async move {
            self.catalogs
                .get(locale)
                .cloned()
                .ok_or_else(|| CatalogError::FetchFailed {
                    locale: locale.to_string(),
                    reason: "locale not present in static source".to_string(),
                })
        })
    }

    fn available_locales(&self) -> Vec<String> {
        self.available.clone()
    }
}

/// Source reading one `<locale>.json` file per locale from a directory
///
/// Available locales are discovered from file names at open time and
/// sorted for determinism; file contents are read on each fetch.
#[derive(Debug, Clone)]
pub struct DirCatalogSource {
    dir: PathBuf,
    available: Vec<String>,
}

impl DirCatalogSource {
    /// Scans `dir` for `*.json` catalog files
    pub fn open(dir: impl Into<PathBuf>) -> CatalogResult<Self> {
        let dir = dir.into();
        let entries = std::fs::read_dir(&dir).map_err(|e| CatalogError::Directory {
            path: dir.clone(),
            reason: e.to_string(),
        })?;

        let mut available = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CatalogError::Directory {
                path: dir.clone(),
                reason: e.to_string(),
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    available.push(stem.to_string());
                }
            }
        }
        available.sort_unstable();

        Ok(Self { dir, available })
    }
}

impl CatalogSource for DirCatalogSource {
    fn fetch_catalog<'a>(&'a self, locale: &'a str) -> BoxFuture<'a, CatalogResult<Catalog>> {
        Box::pin(async move {
            let path = self.dir.join(format!("{locale}.json"));
            let json =
                tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|e| CatalogError::FetchFailed {
                        locale: locale.to_string(),
                        reason: e.to_string(),
                    })?;
            Catalog::from_json(&json).map_err(|e| CatalogError::Malformed {
                context: path.display().to_string(),
                reason: e.to_string(),
            })
        })
    }

    fn available_locales(&self) -> Vec<String> {
        self.available.clone()
    }
}

/// Remote export envelope, as served by the translation endpoint
#[derive(Debug, Deserialize)]
pub struct ExportResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<ExportData>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Payload of a successful export response
#[derive(Debug, Deserialize)]
pub struct ExportData {
    #[serde(default)]
    pub keys: Vec<ExportKey>,
    #[serde(default)]
    pub languages: Vec<ExportLanguage>,
    pub translations: HashMap<String, HashMap<String, String>>,
}

/// A translation key descriptor in the export payload
#[derive(Debug, Deserialize)]
pub struct ExportKey {
    pub key: String,
}

/// A language descriptor in the export payload
#[derive(Debug, Deserialize)]
pub struct ExportLanguage {
    pub code: String,
}

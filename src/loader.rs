//! Catalog loading and base/regional merge
//!
//! Loads one locale's catalog from the backing source. Regional
//! locales fetch both the bare-language catalog and the regional one,
//! then overlay the regional keys on a copy of the base. Every fetch is
//! bounded by a timeout so a hung source cannot pin the session in its
//! loading state.

use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::catalog::Catalog;
use crate::error::{CatalogError, CatalogResult};
use crate::locale::Locale;
use crate::source::CatalogSource;

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Loads and merges per-locale catalogs from a [`CatalogSource`]
///
/// Callers confirm the locale is in the available set before calling
/// [`CatalogLoader::load`]; the loader does not re-validate. The loader
/// never touches the catalog store, that is the session's job.
pub struct CatalogLoader {
    source: Arc<dyn CatalogSource>,
    timeout: Duration,
    base_required: bool,
}

impl CatalogLoader {
    /// Creates a loader with the default fetch timeout; base-language
    /// fetch failures are fatal for regional locales.
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self {
            source,
            timeout: DEFAULT_FETCH_TIMEOUT,
            base_required: true,
        }
    }

    /// Overrides the per-fetch timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Controls whether a regional load fails when the bare-language
    /// catalog cannot be fetched.
    ///
    /// With `false`, a regional-only deployment proceeds with just the
    /// regional catalog (and a warning).
    pub fn base_required(mut self, required: bool) -> Self {
        self.base_required = required;
        self
    }

    /// The backing source
    pub fn source(&self) -> &Arc<dyn CatalogSource> {
        &self.source
    }

    /// Loads the catalog for `locale`.
    ///
    /// Bare locales are fetched directly and returned unmodified.
    /// Regional locales are merged: a copy of the base catalog with
    /// every regional key overwriting it.
    pub async fn load(&self, locale: &Locale) -> CatalogResult<Catalog> {
        let code = locale.to_string();
        if !locale.has_region() {
            return self.fetch(&code).await;
        }

        let regional = self.fetch(&code).await?;
        match self.fetch(locale.language()).await {
            Ok(mut merged) => {
                merged.merge_from(&regional);
                Ok(merged)
            }
            Err(err) if !self.base_required => {
                warn!(
                    locale = %code,
                    error = %err,
                    "base catalog unavailable, proceeding regional-only"
                );
                Ok(regional)
            }
            Err(err) => Err(err),
        }
    }

    async fn fetch(&self, code: &str) -> CatalogResult<Catalog> {
        match tokio::time::timeout(self.timeout, self.source.fetch_catalog(code)).await {
            Ok(result) => result,
            Err(_) => Err(CatalogError::Timeout {
                locale: code.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}

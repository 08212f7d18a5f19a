//! Locale session controller and lookup engine
//!
//! Owns the catalog store and all session state. A locale switch runs
//! resolve -> load -> filter -> index -> store -> persist; lookups walk
//! the fallback chain (current locale, its base language, the
//! configured fallback) and degrade to the raw key so the UI never
//! crashes on a missing translation.
//!
//! Observers subscribe to a watch channel carrying state snapshots; no
//! framework-specific reactive primitive is required.
//!
//! Concurrency: each switch takes a monotonically increasing epoch.
//! When its load resolves, the result is committed only if the epoch is
//! still current; a switch that was started and then superseded is
//! dropped, so the last caller's intent always wins. In-flight loads
//! are never aborted, only their results discarded.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::catalog::{interpolate, CatalogStore};
use crate::config::I18nConfig;
use crate::error::{I18nError, LocaleError, Result};
use crate::filter::CategoryFilter;
use crate::keypath::KeyPathIndex;
use crate::loader::CatalogLoader;
use crate::locale::{resolve_regional_variant, Locale};
use crate::persist::{FileLocaleStore, LocaleStore};
use crate::source::CatalogSource;

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Loading,
    Ready,
    /// The last switch failed; the previous locale stays active and a
    /// new switch may be attempted at any time.
    Error,
}

/// Immutable view of the session state, published to observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub current_locale: Locale,
    pub fallback_locale: Locale,
    pub is_loading: bool,
    pub last_error: Option<String>,
}

struct SessionInner {
    catalogs: CatalogStore,
    indexes: HashMap<String, KeyPathIndex>,
    current: Locale,
    state: SessionState,
    is_loading: bool,
    last_error: Option<String>,
    epoch: u64,
    initialized: bool,
}

/// Session controller: one instance per application
///
/// The store and session state are owned exclusively by this
/// controller; all mutation goes through its methods. Hosting
/// applications must not instantiate it twice.
pub struct LocaleSession {
    loader: CatalogLoader,
    persistence: Box<dyn LocaleStore>,
    fallback: Locale,
    default_locale: Option<Locale>,
    categories: CategoryFilter,
    inner: Mutex<SessionInner>,
    watch_tx: watch::Sender<SessionSnapshot>,
}

impl LocaleSession {
    /// Creates a session; the current locale starts at `fallback` until
    /// [`initialize`](Self::initialize) picks the real one.
    pub fn new(loader: CatalogLoader, persistence: Box<dyn LocaleStore>, fallback: Locale) -> Self {
        let inner = SessionInner {
            catalogs: CatalogStore::new(),
            indexes: HashMap::new(),
            current: fallback.clone(),
            state: SessionState::Uninitialized,
            is_loading: false,
            last_error: None,
            epoch: 0,
            initialized: false,
        };
        let (watch_tx, _) = watch::channel(SessionSnapshot {
            state: inner.state,
            current_locale: inner.current.clone(),
            fallback_locale: fallback.clone(),
            is_loading: false,
            last_error: None,
        });
        Self {
            loader,
            persistence,
            fallback,
            default_locale: None,
            categories: CategoryFilter::All,
            inner: Mutex::new(inner),
            watch_tx,
        }
    }

    /// Restricts loaded catalogs to the given category selection
    pub fn with_categories(mut self, categories: CategoryFilter) -> Self {
        self.categories = categories;
        self
    }

    /// Configures the locale tried when neither persistence nor the
    /// environment yields a usable one
    pub fn with_default_locale(mut self, locale: Locale) -> Self {
        self.default_locale = Some(locale);
        self
    }

    /// Wires a session from an [`I18nConfig`] for one app: loader
    /// timeout, category selection, and persistence location.
    pub fn from_config(
        config: &I18nConfig,
        app: &str,
        source: Arc<dyn CatalogSource>,
    ) -> Result<Self> {
        let fallback: Locale = config.fallback_locale.parse().map_err(I18nError::from)?;
        let loader = CatalogLoader::new(source).with_timeout(config.load_timeout());
        let persistence: Box<dyn LocaleStore> = match &config.persistence_path {
            Some(path) => Box::new(FileLocaleStore::new(path)),
            None => Box::new(FileLocaleStore::new(FileLocaleStore::default_path(app))),
        };

        let mut session =
            Self::new(loader, persistence, fallback).with_categories(config.category_filter(app));
        if let Some(code) = &config.default_locale {
            session = session.with_default_locale(code.parse().map_err(I18nError::from)?);
        }
        Ok(session)
    }

    /// Determines and loads the initial locale.
    ///
    /// Priority: persisted value, then the environment-reported locale,
    /// then the configured default, then the fallback — each matched
    /// against the available set (exact, bare language, best regional
    /// variant). If the chosen locale differs from the fallback, the
    /// fallback catalog is preloaded so the lookup chain always has
    /// data once `Ready`.
    ///
    /// Runs once per instance; later calls are no-ops.
    pub async fn initialize(&self) -> Result<()> {
        {
            let mut inner = self.lock();
            if inner.initialized {
                warn!("session already initialized, ignoring");
                return Ok(());
            }
            inner.initialized = true;
        }

        let available = self.loader.source().available_locales();
        let initial = self
            .persistence
            .load()
            .and_then(|persisted| self.match_available(&persisted, &available))
            .or_else(|| {
                Locale::system_default().and_then(|sys| self.match_available(&sys, &available))
            })
            .or_else(|| {
                self.default_locale
                    .as_ref()
                    .and_then(|default| self.match_available(default, &available))
            })
            .unwrap_or_else(|| self.fallback.clone());

        if initial != self.fallback {
            self.preload_fallback(&available).await;
        }
        self.switch_to(initial).await
    }

    /// Switches the session to `code`.
    ///
    /// A bare language is resolved to its best regional variant first.
    /// An unavailable code logs a warning and returns an error without
    /// touching the current locale or any loaded catalog. A successful
    /// switch always re-fetches from the backing source, then filters,
    /// indexes, stores, and persists.
    pub async fn set_locale(&self, code: &str) -> Result<()> {
        let requested: Locale = match code.parse() {
            Ok(locale) => locale,
            Err(err) => {
                warn!(code, %err, "rejecting locale switch");
                return Err(LocaleError::from(err).into());
            }
        };

        let available = self.loader.source().available_locales();
        let resolved = if requested.has_region() {
            requested
        } else {
            match resolve_regional_variant(requested.language(), &available) {
                Some(variant) => match variant.parse::<Locale>() {
                    Ok(locale) => locale,
                    Err(err) => {
                        warn!(code = %variant, %err, "ignoring unparsable regional variant");
                        requested
                    }
                },
                None => requested,
            }
        };

        let resolved_code = resolved.to_string();
        if !available.iter().any(|c| *c == resolved_code) {
            warn!(
                locale = %resolved_code,
                "locale not available, keeping current locale"
            );
            return Err(LocaleError::Unavailable(resolved_code).into());
        }

        self.switch_to(resolved).await
    }

    async fn switch_to(&self, locale: Locale) -> Result<()> {
        let code = locale.to_string();
        let epoch = {
            let mut inner = self.lock();
            inner.epoch += 1;
            inner.is_loading = true;
            inner.last_error = None;
            inner.state = SessionState::Loading;
            self.publish(&inner);
            inner.epoch
        };

        // Always goes to the backing source, never the store, so an
        // explicit switch revalidates even a previously cached locale.
        let result = self.loader.load(&locale).await;

        let mut inner = self.lock();
        if inner.epoch != epoch {
            debug!(locale = %code, "discarding stale locale load");
            return Ok(());
        }

        match result {
            Ok(catalog) => {
                let filtered = self.categories.apply(catalog);
                let index = KeyPathIndex::build(&filtered);
                inner.catalogs.put(code.clone(), filtered);
                inner.indexes.insert(code.clone(), index);
                inner.current = locale.clone();
                inner.is_loading = false;
                inner.state = SessionState::Ready;
                self.publish(&inner);
                drop(inner);

                if let Err(err) = self.persistence.save(&locale) {
                    warn!(locale = %code, %err, "failed to persist locale");
                }
                Ok(())
            }
            Err(err) => {
                inner.is_loading = false;
                inner.state = SessionState::Error;
                inner.last_error = Some(err.to_string());
                self.publish(&inner);
                warn!(locale = %code, %err, "locale switch failed, keeping previous locale");
                Err(err.into())
            }
        }
    }

    async fn preload_fallback(&self, available: &[String]) {
        let code = self.fallback.to_string();
        if !available.iter().any(|c| *c == code) {
            warn!(
                locale = %code,
                "fallback locale not available, missing keys will show as raw keys"
            );
            return;
        }
        match self.loader.load(&self.fallback).await {
            Ok(catalog) => {
                let filtered = self.categories.apply(catalog);
                let index = KeyPathIndex::build(&filtered);
                let mut inner = self.lock();
                inner.catalogs.put(code.clone(), filtered);
                inner.indexes.insert(code, index);
            }
            Err(err) => {
                warn!(locale = %code, %err, "failed to preload fallback catalog");
            }
        }
    }

    /// Looks up `key` for the current locale through the fallback chain
    ///
    /// Never panics and always returns a display-safe string; a key
    /// missing everywhere comes back verbatim as a developer-visible
    /// marker.
    pub fn t(&self, key: &str) -> String {
        self.translate(key, &[], None)
    }

    /// Like [`t`](Self::t), with `{name}` placeholder interpolation.
    /// Placeholders without a matching argument are left untouched.
    pub fn t_with_args(&self, key: &str, args: &[(&str, &str)]) -> String {
        self.translate(key, args, None)
    }

    /// Like [`t`](Self::t), but a key missing everywhere returns the
    /// supplied explicit fallback value instead of the key itself.
    pub fn t_or(&self, key: &str, fallback_value: &str) -> String {
        self.translate(key, &[], Some(fallback_value))
    }

    fn translate(&self, key: &str, args: &[(&str, &str)], fallback_value: Option<&str>) -> String {
        let inner = self.lock();
        match self.lookup(&inner, key) {
            Some(template) => interpolate(template, args),
            None => fallback_value.unwrap_or(key).to_string(),
        }
    }

    /// Fallback chain, in order, stopping at the first hit:
    /// exact current locale, bare base language of a regional current
    /// locale (if loaded), then the configured fallback locale.
    fn lookup<'a>(&self, inner: &'a SessionInner, key: &str) -> Option<&'a str> {
        let current_code = inner.current.to_string();
        if let Some(value) = inner.catalogs.get(&current_code).and_then(|c| c.get(key)) {
            return Some(value);
        }

        if inner.current.has_region() {
            let base_code = inner.current.language();
            if let Some(value) = inner.catalogs.get(base_code).and_then(|c| c.get(key)) {
                return Some(value);
            }
        }

        if self.fallback != inner.current {
            let fallback_code = self.fallback.to_string();
            if let Some(value) = inner.catalogs.get(&fallback_code).and_then(|c| c.get(key)) {
                return Some(value);
            }
        }

        None
    }

    fn match_available(&self, wanted: &Locale, available: &[String]) -> Option<Locale> {
        let code = wanted.to_string();
        if available.iter().any(|c| *c == code) {
            return Some(wanted.clone());
        }
        let base = wanted.language();
        if available.iter().any(|c| c == base) {
            return Some(wanted.base());
        }
        resolve_regional_variant(base, available).and_then(|variant| variant.parse().ok())
    }

    /// Subscribes to state snapshots; the receiver immediately sees the
    /// latest state.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.watch_tx.subscribe()
    }

    /// The active locale
    pub fn current_locale(&self) -> Locale {
        self.lock().current.clone()
    }

    /// The configured fallback locale
    pub fn fallback_locale(&self) -> &Locale {
        &self.fallback
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    /// Whether a load for the current transition is outstanding
    pub fn is_loading(&self) -> bool {
        self.lock().is_loading
    }

    /// Message of the last failed switch, cleared on the next attempt
    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    /// Locale codes the backing source can serve
    pub fn available_locales(&self) -> Vec<String> {
        self.loader.source().available_locales()
    }

    /// The key-path index built for a loaded locale
    pub fn key_index(&self, locale: &str) -> Option<KeyPathIndex> {
        self.lock().indexes.get(locale).cloned()
    }

    /// Keys present for `reference` but missing for `locale`
    pub fn missing_keys(&self, locale: &str, reference: &str) -> Vec<String> {
        self.lock().catalogs.missing_keys(locale, reference)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionInner> {
        self.inner.lock().expect("session state lock poisoned")
    }

    fn publish(&self, inner: &SessionInner) {
        self.watch_tx.send_replace(SessionSnapshot {
            state: inner.state,
            current_locale: inner.current.clone(),
            fallback_locale: self.fallback.clone(),
            is_loading: inner.is_loading,
            last_error: inner.last_error.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::persist::MemoryLocaleStore;
    use crate::source::StaticCatalogSource;

    fn catalog(entries: &[(&str, &str)]) -> Catalog {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn source() -> Arc<dyn CatalogSource> {
        Arc::new(
            StaticCatalogSource::new()
                .with_locale(
                    "en",
                    catalog(&[
                        ("common.save", "Save"),
                        ("common.welcome", "Welcome {name}!"),
                        ("admin.users", "Users"),
                    ]),
                )
                .with_locale("de", catalog(&[("common.save", "Speichern")]))
                .with_locale("de-AT", catalog(&[("common.servus", "Servus")])),
        )
    }

    fn session() -> LocaleSession {
        LocaleSession::new(
            CatalogLoader::new(source()),
            Box::new(MemoryLocaleStore::new()),
            Locale::new("en"),
        )
    }

    #[tokio::test]
    async fn test_starts_uninitialized_at_fallback() {
        let session = session();
        assert_eq!(session.state(), SessionState::Uninitialized);
        assert_eq!(session.current_locale(), Locale::new("en"));
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_set_locale_reaches_ready() {
        let session = session();
        session.set_locale("en").await.unwrap();
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.t("common.save"), "Save");
    }

    #[tokio::test]
    async fn test_bare_code_resolves_to_regional_variant() {
        // No doubled form "de-DE" in the source, so the scan rule picks
        // the first "de-" entry.
        let session = session();
        session.set_locale("de").await.unwrap();
        assert_eq!(session.current_locale(), Locale::with_region("de", "AT"));
    }

    #[tokio::test]
    async fn test_unavailable_locale_keeps_state() {
        let session = session();
        session.set_locale("en").await.unwrap();

        let result = session.set_locale("xx").await;
        assert!(result.is_err());
        assert_eq!(session.current_locale(), Locale::new("en"));
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.t("common.save"), "Save");
    }

    #[tokio::test]
    async fn test_invalid_code_rejected() {
        let session = session();
        assert!(session.set_locale("not a locale").await.is_err());
        assert_eq!(session.state(), SessionState::Uninitialized);
    }

    #[tokio::test]
    async fn test_missing_key_returns_key() {
        let session = session();
        session.set_locale("en").await.unwrap();
        assert_eq!(session.t("missing.key"), "missing.key");
    }

    #[tokio::test]
    async fn test_explicit_fallback_value() {
        let session = session();
        session.set_locale("en").await.unwrap();
        assert_eq!(session.t_or("missing.key", "(none)"), "(none)");
        assert_eq!(session.t_or("common.save", "(none)"), "Save");
    }

    #[tokio::test]
    async fn test_interpolation_through_lookup() {
        let session = session();
        session.set_locale("en").await.unwrap();
        assert_eq!(
            session.t_with_args("common.welcome", &[("name", "Ana")]),
            "Welcome Ana!"
        );
        assert_eq!(session.t("common.welcome"), "Welcome {name}!");
    }

    #[tokio::test]
    async fn test_category_filter_applied_on_switch() {
        let session = LocaleSession::new(
            CatalogLoader::new(source()),
            Box::new(MemoryLocaleStore::new()),
            Locale::new("en"),
        )
        .with_categories(CategoryFilter::Include(vec!["common".to_string()]));

        session.set_locale("en").await.unwrap();
        assert_eq!(session.t("common.save"), "Save");
        // Filtered out, so the raw key comes back
        assert_eq!(session.t("admin.users"), "admin.users");
    }

    #[tokio::test]
    async fn test_key_index_available_after_switch() {
        let session = session();
        session.set_locale("en").await.unwrap();
        let index = session.key_index("en").unwrap();
        assert_eq!(index.get(&["common", "save"]), Some("common.save"));
    }

    #[tokio::test]
    async fn test_observer_sees_transitions() {
        let session = session();
        let rx = session.subscribe();
        assert_eq!(rx.borrow().state, SessionState::Uninitialized);

        session.set_locale("en").await.unwrap();
        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.state, SessionState::Ready);
        assert_eq!(snapshot.current_locale, Locale::new("en"));
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.last_error, None);
    }

    #[tokio::test]
    async fn test_initialize_runs_once() {
        let session = session();
        session.initialize().await.unwrap();
        let first = session.current_locale();
        session.initialize().await.unwrap();
        assert_eq!(session.current_locale(), first);
    }
}

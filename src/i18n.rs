//! The translation engine and its public entry points.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::config::{
    ConfigError,
    I18nSettings,
};
use crate::events::{
    self,
    EventSink,
    I18nEvent,
};
use crate::resolve::{
    interpolate,
    resolve,
};
use crate::session::{
    GlobalContextFn,
    LocaleNegotiator,
    LocaleStorage,
    RequestScope,
    UpdateContext,
};
use crate::store::loader::{
    self,
    LoadError,
};
use crate::store::DictionaryStore;

/// Error raised while constructing the engine. Startup-fatal.
#[derive(Error, Debug)]
pub enum I18nError {
    /// Settings are invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Translation sources could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Construction-time configuration: plain settings plus the pluggable
/// collaborators.
///
/// All fields are public so hosts can use struct-update syntax over
/// [`Default`].
pub struct I18nConfig<C> {
    /// Plain-data settings (default locale, source directory, …).
    pub settings: I18nSettings,
    /// Optional async locale negotiator, consulted first per request.
    pub negotiator: Option<LocaleNegotiator<C>>,
    /// Optional persistence backend for locale selection across requests.
    pub storage: Option<Arc<dyn LocaleStorage>>,
    /// Optional supplier of global translation variables per request.
    pub global_context: Option<GlobalContextFn<C>>,
    /// Optional diagnostic sink; defaults to `tracing` logging.
    pub event_sink: Option<EventSink>,
}

impl<C> Default for I18nConfig<C> {
    fn default() -> Self {
        Self {
            settings: I18nSettings::default(),
            negotiator: None,
            storage: None,
            global_context: None,
            event_sink: None,
        }
    }
}

impl<C> fmt::Debug for I18nConfig<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("I18nConfig")
            .field("settings", &self.settings)
            .field("negotiator", &self.negotiator.as_ref().map(|_| "…"))
            .field("storage", &self.storage.as_ref().map(|_| "…"))
            .finish_non_exhaustive()
    }
}

/// The translation engine.
///
/// Holds the immutable [`DictionaryStore`] plus the configuration, and is
/// shared across request tasks through `Arc`. All request-scoped state
/// lives in [`RequestScope`], never here.
pub struct I18n<C> {
    /// Validated settings.
    settings: I18nSettings,
    /// Merged, flattened locale dictionaries.
    store: DictionaryStore,
    /// Optional external negotiator.
    negotiator: Option<LocaleNegotiator<C>>,
    /// Optional persistence backend.
    storage: Option<Arc<dyn LocaleStorage>>,
    /// Optional global-variable supplier.
    global_context: Option<GlobalContextFn<C>>,
    /// Diagnostic sink.
    event_sink: EventSink,
}

impl<C> fmt::Debug for I18n<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("I18n")
            .field("settings", &self.settings)
            .field("locales", &self.store.locales())
            .finish_non_exhaustive()
    }
}

impl<C> I18n<C> {
    /// Build the engine, loading translation sources when a directory is
    /// configured.
    ///
    /// # Errors
    /// - Invalid settings
    /// - Unreadable directory or file, malformed file content
    pub async fn new(config: I18nConfig<C>) -> Result<Self, I18nError> {
        config.settings.validate().map_err(ConfigError::ValidationErrors)?;

        let store = match &config.settings.directory {
            Some(directory) => {
                let contributions =
                    loader::load_locales_dir(directory, &config.settings.file_pattern).await?;
                DictionaryStore::from_contributions(
                    contributions,
                    &config.settings.key_separator,
                )
            }
            None => DictionaryStore::default(),
        };

        Ok(Self::assemble(config, store))
    }

    /// Build the engine over an already-built store.
    ///
    /// For hosts that assemble contributions themselves (embedded
    /// translations, tests).
    ///
    /// # Errors
    /// - Invalid settings
    pub fn with_store(config: I18nConfig<C>, store: DictionaryStore) -> Result<Self, I18nError> {
        config.settings.validate().map_err(ConfigError::ValidationErrors)?;
        Ok(Self::assemble(config, store))
    }

    /// Wire the configured collaborators around the store.
    fn assemble(config: I18nConfig<C>, store: DictionaryStore) -> Self {
        tracing::debug!(locales = ?store.locales(), "Translation engine ready");
        Self {
            settings: config.settings,
            store,
            negotiator: config.negotiator,
            storage: config.storage,
            global_context: config.global_context,
            event_sink: config.event_sink.unwrap_or_else(|| Box::new(events::log_event)),
        }
    }

    /// Translate `key` for an explicitly chosen `locale`.
    ///
    /// The two-stage fallback applies: the requested locale's dictionary,
    /// then the default locale's, then the literal key.
    #[must_use]
    pub fn translate(
        &self,
        locale: &str,
        key: &str,
        variables: &HashMap<String, String>,
    ) -> String {
        if self.store.is_empty() {
            self.emit(&I18nEvent::EmptyStore { key: key.to_string() });
            return key.to_string();
        }

        match resolve(&self.store, locale, key, &self.settings.default_locale) {
            Some(template) => interpolate(template, variables),
            None => {
                self.emit(&I18nEvent::MissingKey {
                    locale: locale.to_string(),
                    key: key.to_string(),
                });
                key.to_string()
            }
        }
    }

    /// Known locale IDs in discovery order.
    #[must_use]
    pub fn locales(&self) -> &[String] {
        self.store.locales()
    }

    /// The underlying dictionary store.
    #[must_use]
    pub const fn store(&self) -> &DictionaryStore {
        &self.store
    }

    /// The validated settings.
    #[must_use]
    pub const fn settings(&self) -> &I18nSettings {
        &self.settings
    }

    /// The configured negotiator, if any.
    pub(crate) fn negotiator(&self) -> Option<&LocaleNegotiator<C>> {
        self.negotiator.as_ref()
    }

    /// The configured storage backend, if any.
    pub(crate) fn storage(&self) -> Option<&Arc<dyn LocaleStorage>> {
        self.storage.as_ref()
    }

    /// Deliver a diagnostic event to the sink.
    pub(crate) fn emit(&self, event: &I18nEvent) {
        (self.event_sink)(event);
    }

    /// Evaluate the global-context supplier for one request.
    pub(crate) fn global_vars(&self, ctx: &C) -> HashMap<String, String> {
        self.global_context.as_ref().map_or_else(HashMap::new, |supplier| supplier(ctx))
    }
}

impl<C: UpdateContext> I18n<C> {
    /// The per-request middleware hook: negotiate a locale for `ctx` and
    /// return the bound scope.
    ///
    /// The scope bundles the translator with the session operations
    /// (`get_locale`, `set_locale`, `use_locale`, `renegotiate`); the host
    /// composes it into its own request context type.
    pub async fn request_scope(self: &Arc<Self>, ctx: &C) -> RequestScope<C> {
        let mut scope = self.scope(ctx);
        scope.negotiate(ctx).await;
        scope
    }

    /// An unbound scope for `ctx`; negotiation happens lazily on the first
    /// `get_locale` call (or explicitly via `negotiate`/`use_locale`).
    #[must_use]
    pub fn scope(self: &Arc<Self>, ctx: &C) -> RequestScope<C> {
        RequestScope::new(Arc::clone(self), ctx)
    }
}

/// Predicate over a request scope matching inbound text against the
/// translation of `key` in the currently bound locale.
///
/// Useful for routing on localized command or button labels:
/// the predicate holds exactly when the text equals the bound-locale
/// translation of `key`.
pub fn hears<C: UpdateContext>(key: impl Into<String>) -> impl Fn(&RequestScope<C>, &str) -> bool {
    let key = key.into();
    move |scope, text| scope.t(&key) == text
}

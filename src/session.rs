//! Per-request locale negotiation and the bound translator.
//!
//! One [`RequestScope`] exists per inbound update and is owned exclusively
//! by the task processing it: mutating operations take `&mut self`, so the
//! last-negotiated-wins ordering inside a request is enforced by the
//! borrow checker rather than by locks. The shared engine behind the scope
//! is only ever read.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use thiserror::Error;

use crate::events::I18nEvent;
use crate::i18n::I18n;
use crate::resolve::interpolate;
use crate::store::Dictionary;

/// Host-side view of one inbound update.
///
/// The host's request context implements this to expose the best-effort
/// locale hint (e.g. the client-reported language tag) and the identity
/// key used for persistent locale selection. Both default to absent.
pub trait UpdateContext {
    /// Client-reported language tag attached to the update, if any.
    fn language_hint(&self) -> Option<&str> {
        None
    }

    /// Identity key for session persistence, if any.
    fn session_key(&self) -> Option<String> {
        None
    }
}

/// Pluggable async locale negotiator.
///
/// Consulted first during negotiation; returning `None` hands the decision
/// over to the rest of the fallback chain.
pub type LocaleNegotiator<C> =
    Box<dyn for<'a> Fn(&'a C) -> BoxFuture<'a, Option<String>> + Send + Sync>;

/// Supplier of global translation variables, evaluated once per request.
pub type GlobalContextFn<C> = Box<dyn Fn(&C) -> HashMap<String, String> + Send + Sync>;

/// Error from a [`LocaleStorage`] backend.
pub type StorageError = Box<dyn std::error::Error + Send + Sync>;

/// Persistent locale selection backend.
///
/// Only consulted when `useSession` is enabled in the settings. Reads feed
/// the negotiation chain; writes happen in [`RequestScope::set_locale`]
/// and must complete before the locale change is applied.
pub trait LocaleStorage: Send + Sync {
    /// Read the stored locale for `key`.
    fn load<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, StorageError>>;

    /// Durably record `locale` for `key`.
    fn store<'a>(
        &'a self,
        key: &'a str,
        locale: &'a str,
    ) -> BoxFuture<'a, Result<(), StorageError>>;
}

/// Error raised by [`RequestScope::set_locale`].
///
/// Lookup misses never error; persistence is the one place where failing
/// loudly beats degrading, because a silent drop would leave the caller
/// believing the locale was durably changed.
#[derive(Error, Debug)]
pub enum SessionError {
    /// `useSession` is enabled but no storage backend is wired.
    #[error("session persistence is enabled but no storage backend is configured")]
    StorageUnavailable,

    /// The current update carries no session identity.
    #[error("session persistence requires a session key for the current update")]
    MissingSessionKey,

    /// The backend rejected the write; the locale change was not applied.
    #[error("failed to persist locale selection: {0}")]
    Storage(StorageError),
}

/// Per-request locale negotiation session plus the bound translator.
///
/// Starts unbound; [`negotiate`](Self::negotiate) or
/// [`use_locale`](Self::use_locale) transition it to bound, and it can be
/// re-bound any number of times within the request. Translator calls
/// always observe the most recent binding.
pub struct RequestScope<C> {
    /// Shared engine: dictionary store plus configuration.
    i18n: Arc<I18n<C>>,
    /// Currently bound locale; `None` until the first negotiation.
    locale: Option<String>,
    /// Cached dictionary slice for the bound locale.
    dictionary: Option<Arc<Dictionary>>,
    /// Global variables computed once for this request.
    global_vars: HashMap<String, String>,
}

impl<C> std::fmt::Debug for RequestScope<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestScope")
            .field("locale", &self.locale)
            .field("global_vars", &self.global_vars)
            .finish_non_exhaustive()
    }
}

impl<C: UpdateContext> RequestScope<C> {
    /// Create an unbound scope for one request.
    pub(crate) fn new(i18n: Arc<I18n<C>>, ctx: &C) -> Self {
        let global_vars = i18n.global_vars(ctx);
        Self { i18n, locale: None, dictionary: None, global_vars }
    }

    /// Negotiate a locale for this request and bind it.
    ///
    /// Fallback chain: external negotiator → persisted session locale (when
    /// session persistence is enabled) → request language hint → configured
    /// default.
    pub async fn negotiate(&mut self, ctx: &C) {
        let candidate = self.negotiated_locale(ctx).await;
        self.use_locale(&candidate);
    }

    /// Re-run negotiation mid-request (e.g. after the user changed their
    /// language preference). Subsequent translator calls observe the new
    /// locale immediately.
    pub async fn renegotiate(&mut self, ctx: &C) {
        self.negotiate(ctx).await;
    }

    /// Resolve the locale to use without binding it.
    async fn negotiated_locale(&self, ctx: &C) -> String {
        if let Some(negotiator) = self.i18n.negotiator() {
            let negotiated = negotiator(ctx).await;
            if let Some(locale) = negotiated {
                return locale;
            }
        }
        if let Some(locale) = self.session_locale(ctx).await {
            return locale;
        }
        if let Some(hint) = ctx.language_hint() {
            return hint.to_string();
        }
        self.i18n.settings().default_locale.clone()
    }

    /// Read the persisted locale, when session persistence is active.
    ///
    /// Read failures degrade to `None`; negotiation must never take a
    /// request down.
    async fn session_locale(&self, ctx: &C) -> Option<String> {
        if !self.i18n.settings().use_session {
            return None;
        }
        let storage = self.i18n.storage()?;
        let key = ctx.session_key()?;
        match storage.load(&key).await {
            Ok(locale) => locale,
            Err(error) => {
                tracing::warn!(error = %error, "failed to read persisted locale");
                None
            }
        }
    }

    /// Bind `candidate` for the rest of the request (or until re-bound).
    ///
    /// An unknown candidate emits [`I18nEvent::UnknownLocale`] and binds
    /// the configured default locale instead.
    pub fn use_locale(&mut self, candidate: &str) {
        let default_locale = &self.i18n.settings().default_locale;
        let resolved = if self.i18n.store().has_locale(candidate) {
            candidate
        } else {
            self.i18n.emit(&I18nEvent::UnknownLocale {
                requested: candidate.to_string(),
                fallback: default_locale.clone(),
            });
            default_locale
        };

        self.dictionary = self.i18n.store().dictionary(resolved).cloned();
        self.locale = Some(resolved.to_string());
    }

    /// Bind `candidate` and, when session persistence is enabled, record
    /// it durably first.
    ///
    /// Without `useSession` this is an alias for
    /// [`use_locale`](Self::use_locale).
    ///
    /// # Errors
    /// - No storage backend wired while `useSession` is enabled
    /// - The update carries no session key
    /// - The backend write failed (the locale change is not applied)
    pub async fn set_locale(&mut self, ctx: &C, candidate: &str) -> Result<(), SessionError> {
        if self.i18n.settings().use_session {
            let storage = self.i18n.storage().ok_or(SessionError::StorageUnavailable)?;
            let key = ctx.session_key().ok_or(SessionError::MissingSessionKey)?;
            storage.store(&key, candidate).await.map_err(SessionError::Storage)?;
        }
        self.use_locale(candidate);
        Ok(())
    }

    /// Currently bound locale, negotiating (and binding) one if the scope
    /// is still unbound.
    pub async fn get_locale(&mut self, ctx: &C) -> String {
        if let Some(locale) = &self.locale {
            return locale.clone();
        }
        self.negotiate(ctx).await;
        self.locale
            .clone()
            .unwrap_or_else(|| self.i18n.settings().default_locale.clone())
    }

    /// Currently bound locale without negotiating.
    #[must_use]
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// Translate `key` against the bound locale.
    ///
    /// Falls back to the default locale's dictionary when the cached one
    /// is unavailable, then performs the same two-stage key lookup as the
    /// resolver. A key missing everywhere comes back unchanged.
    #[must_use]
    pub fn translate(&self, key: &str, variables: &HashMap<String, String>) -> String {
        if self.i18n.store().is_empty() {
            self.i18n.emit(&I18nEvent::EmptyStore { key: key.to_string() });
            return key.to_string();
        }

        let default_locale = &self.i18n.settings().default_locale;
        match self.lookup(key, default_locale) {
            Some(template) => self.render(template, variables),
            None => {
                self.i18n.emit(&I18nEvent::MissingKey {
                    locale: self.locale.clone().unwrap_or_else(|| default_locale.clone()),
                    key: key.to_string(),
                });
                key.to_string()
            }
        }
    }

    /// Shorthand for [`translate`](Self::translate) without variables.
    #[must_use]
    pub fn t(&self, key: &str) -> String {
        self.translate(key, &HashMap::new())
    }

    /// Two-stage lookup against the cached dictionary.
    ///
    /// The default-locale fallback applies twice on purpose: once when the
    /// cached dictionary is absent (session bound to an unknown locale)
    /// and once per key, mirroring the resolver.
    fn lookup(&self, key: &str, default_locale: &str) -> Option<&str> {
        let bound_is_default = self.locale.as_deref() == Some(default_locale);

        let mut dictionary = self.dictionary.as_deref();
        let mut at_default = bound_is_default;
        if dictionary.is_none() && !bound_is_default {
            dictionary = self.i18n.store().dictionary(default_locale).map(Arc::as_ref);
            at_default = true;
        }

        if let Some(found) = dictionary.and_then(|dictionary| dictionary.get(key)) {
            return Some(found);
        }
        if at_default {
            return None;
        }
        self.i18n
            .store()
            .dictionary(default_locale)
            .and_then(|dictionary| dictionary.get(key))
    }

    /// Interpolate with the request's global variables underneath the
    /// call-site ones (call-site wins on conflicts).
    fn render(&self, template: &str, variables: &HashMap<String, String>) -> String {
        if self.global_vars.is_empty() {
            return interpolate(template, variables);
        }
        let mut merged = self.global_vars.clone();
        merged.extend(variables.iter().map(|(name, value)| (name.clone(), value.clone())));
        interpolate(template, &merged)
    }
}

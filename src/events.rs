//! Diagnostic events for degraded lookups.
//!
//! Lookup misses never fail request processing; they degrade to a fallback
//! value instead. The events here make that degradation observable: a sink
//! closure is wired in at construction, so hosts can count, assert on, or
//! forward the events instead of relying on hard-coded warning output.

/// Non-fatal diagnostic emitted when a lookup or negotiation degrades.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum I18nEvent {
    /// A negotiated or requested locale is not present in the store.
    UnknownLocale {
        /// The locale that was asked for.
        requested: String,
        /// The locale substituted in its place.
        fallback: String,
    },

    /// A key is missing from both the requested and the default locale;
    /// the literal key was returned.
    MissingKey {
        /// The locale the lookup ran against.
        locale: String,
        /// The missing key.
        key: String,
    },

    /// The dictionary store holds no locales at all (e.g. no source
    /// directory was configured); every lookup returns the literal key.
    EmptyStore {
        /// The key that was requested.
        key: String,
    },
}

/// Sink receiving diagnostic events.
pub type EventSink = Box<dyn Fn(&I18nEvent) + Send + Sync>;

/// Default sink: logs through `tracing`.
///
/// Missing keys are logged at debug level only; a missing translation is
/// an expected condition, not a misuse.
pub(crate) fn log_event(event: &I18nEvent) {
    match event {
        I18nEvent::UnknownLocale { requested, fallback } => {
            tracing::warn!(%requested, %fallback, "locale not found, falling back");
        }
        I18nEvent::MissingKey { locale, key } => {
            tracing::debug!(%locale, %key, "translation missing, returning key");
        }
        I18nEvent::EmptyStore { key } => {
            tracing::warn!(%key, "translations not initialized, returning key");
        }
    }
}

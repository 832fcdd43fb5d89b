//! bot-i18n
//!
//! チャットボットの update パイプライン向けのロケール交渉・翻訳ミドルウェア
//!
//! Locale-keyed translation dictionaries are loaded once from JSON files,
//! merged and flattened into an immutable store, and shared read-only
//! across concurrent request tasks. Each request negotiates its own locale
//! and gets a bound translator scoped to that request.

pub mod config;
pub mod events;
pub mod i18n;
pub mod resolve;
pub mod session;
pub mod store;

pub use events::{
    EventSink,
    I18nEvent,
};
pub use i18n::{
    hears,
    I18n,
    I18nConfig,
    I18nError,
};
pub use session::{
    LocaleNegotiator,
    LocaleStorage,
    RequestScope,
    SessionError,
    StorageError,
    UpdateContext,
};

//! update パイプラインへの統合に関するテスト
//!
//! Covers the full flow: load a locales directory, negotiate per request,
//! translate through the bound scope, re-negotiate mid-request, and
//! persist locale selection through a storage backend.

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]
#![allow(missing_docs)]

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{
    Arc,
    Mutex,
};

use bot_i18n::{
    hears,
    I18n,
    I18nConfig,
    I18nEvent,
    LocaleStorage,
    SessionError,
    StorageError,
    UpdateContext,
};
use futures::future::{
    self,
    BoxFuture,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// Test double for the host's update context.
#[derive(Default)]
struct TestUpdate {
    language_code: Option<String>,
    chat_id: Option<String>,
    first_name: Option<String>,
}

impl TestUpdate {
    fn with_language(code: &str) -> Self {
        Self { language_code: Some(code.to_string()), ..Self::default() }
    }
}

impl UpdateContext for TestUpdate {
    fn language_hint(&self) -> Option<&str> {
        self.language_code.as_deref()
    }

    fn session_key(&self) -> Option<String> {
        self.chat_id.clone()
    }
}

/// In-memory storage backend.
#[derive(Default)]
struct MemoryStorage {
    locales: Mutex<HashMap<String, String>>,
}

impl LocaleStorage for MemoryStorage {
    fn load<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, StorageError>> {
        Box::pin(future::ready(Ok(self.locales.lock().unwrap().get(key).cloned())))
    }

    fn store<'a>(
        &'a self,
        key: &'a str,
        locale: &'a str,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        self.locales.lock().unwrap().insert(key.to_string(), locale.to_string());
        Box::pin(future::ready(Ok(())))
    }
}

/// Storage backend whose writes always fail.
struct BrokenStorage;

impl LocaleStorage for BrokenStorage {
    fn load<'a>(&'a self, _key: &'a str) -> BoxFuture<'a, Result<Option<String>, StorageError>> {
        Box::pin(future::ready(Ok(None)))
    }

    fn store<'a>(
        &'a self,
        _key: &'a str,
        _locale: &'a str,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(future::ready(Err("storage offline".into())))
    }
}

fn negotiate_cn(_ctx: &TestUpdate) -> BoxFuture<'_, Option<String>> {
    Box::pin(future::ready(Some("cn".to_string())))
}

fn negotiate_nothing(_ctx: &TestUpdate) -> BoxFuture<'_, Option<String>> {
    Box::pin(future::ready(None))
}

fn negotiate_unknown(_ctx: &TestUpdate) -> BoxFuture<'_, Option<String>> {
    Box::pin(future::ready(Some("not-exist".to_string())))
}

fn write_locales(dir: &Path) {
    fs::write(
        dir.join("en.json"),
        r#"{"hello":"Hello","bye":"Goodbye","greet":"Hello, {name}!","menu":{"settings":"Settings"}}"#,
    )
    .unwrap();
    fs::write(dir.join("cn.json"), r#"{"hello":"你好","greet":"你好, {name}!"}"#).unwrap();
    let tw_dir = dir.join("tw");
    fs::create_dir(&tw_dir).unwrap();
    fs::write(tw_dir.join("base.json"), r#"{"hello":"哈囉","menu":{"settings":"overridden"}}"#)
        .unwrap();
    fs::write(tw_dir.join("extra.json"), r#"{"menu":{"settings":"設定"}}"#).unwrap();
}

async fn build_i18n(mut config: I18nConfig<TestUpdate>) -> (TempDir, Arc<I18n<TestUpdate>>) {
    let temp_dir = TempDir::new().unwrap();
    write_locales(temp_dir.path());
    config.settings.directory = Some(temp_dir.path().to_path_buf());
    let i18n = I18n::new(config).await.unwrap();
    (temp_dir, Arc::new(i18n))
}

fn vars(entries: &[(&str, &str)]) -> HashMap<String, String> {
    entries.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("bot_i18n=debug")
        .with_test_writer()
        .try_init();
}

#[tokio::test]
async fn default_event_sink_logs_instead_of_failing() {
    init_tracing();
    let (_guard, i18n) = build_i18n(I18nConfig::default()).await;
    let ctx = TestUpdate::with_language("not-exist");

    let scope = i18n.request_scope(&ctx).await;

    assert_eq!(scope.t("hello"), "Hello");
}

#[tokio::test]
async fn negotiates_locale_from_request_hint() {
    let (_guard, i18n) = build_i18n(I18nConfig::default()).await;
    let ctx = TestUpdate::with_language("cn");

    let scope = i18n.request_scope(&ctx).await;

    assert_eq!(scope.locale(), Some("cn"));
    assert_eq!(scope.t("hello"), "你好");
    assert_eq!(scope.translate("greet", &vars(&[("name", "小明")])), "你好, 小明!");
    // Missing in cn, present in en.
    assert_eq!(scope.t("bye"), "Goodbye");
    // Missing everywhere.
    assert_eq!(scope.t("nope"), "nope");
}

#[tokio::test]
async fn falls_back_to_default_without_hint_or_negotiator() {
    let (_guard, i18n) = build_i18n(I18nConfig::default()).await;
    let ctx = TestUpdate::default();

    let scope = i18n.request_scope(&ctx).await;

    assert_eq!(scope.locale(), Some("en"));
    assert_eq!(scope.t("hello"), "Hello");
}

#[tokio::test]
async fn unknown_locale_falls_back_and_emits_event() {
    let observed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&observed);
    let config = I18nConfig {
        event_sink: Some(Box::new(move |event: &I18nEvent| {
            sink.lock().unwrap().push(event.clone());
        })),
        ..I18nConfig::default()
    };
    let (_guard, i18n) = build_i18n(config).await;
    let ctx = TestUpdate::with_language("not-exist");

    let scope = i18n.request_scope(&ctx).await;

    assert_eq!(scope.locale(), Some("en"));
    assert_eq!(scope.t("hello"), "Hello");
    let events = observed.lock().unwrap();
    assert!(events.contains(&I18nEvent::UnknownLocale {
        requested: "not-exist".to_string(),
        fallback: "en".to_string(),
    }));
}

#[tokio::test]
async fn negotiator_takes_precedence_over_hint() {
    let config = I18nConfig {
        negotiator: Some(Box::new(negotiate_cn)),
        ..I18nConfig::default()
    };
    let (_guard, i18n) = build_i18n(config).await;
    let ctx = TestUpdate::with_language("tw");

    let scope = i18n.request_scope(&ctx).await;

    assert_eq!(scope.locale(), Some("cn"));
}

#[tokio::test]
async fn negotiator_yielding_nothing_falls_through_to_hint() {
    let config = I18nConfig {
        negotiator: Some(Box::new(negotiate_nothing)),
        ..I18nConfig::default()
    };
    let (_guard, i18n) = build_i18n(config).await;
    let ctx = TestUpdate::with_language("tw");

    let scope = i18n.request_scope(&ctx).await;

    assert_eq!(scope.locale(), Some("tw"));
    assert_eq!(scope.t("hello"), "哈囉");
}

#[tokio::test]
async fn negotiator_yielding_unknown_locale_falls_back_to_default() {
    let config = I18nConfig {
        negotiator: Some(Box::new(negotiate_unknown)),
        ..I18nConfig::default()
    };
    let (_guard, i18n) = build_i18n(config).await;
    let ctx = TestUpdate::with_language("cn");

    let scope = i18n.request_scope(&ctx).await;

    // The unknown negotiated locale falls back to the default, not to the
    // request hint: negotiation happened, binding degraded.
    assert_eq!(scope.locale(), Some("en"));
}

#[tokio::test]
async fn later_files_override_earlier_ones_for_the_same_locale() {
    let (_guard, i18n) = build_i18n(I18nConfig::default()).await;
    let ctx = TestUpdate::with_language("tw");

    let scope = i18n.request_scope(&ctx).await;

    // extra.json sorts after base.json and wins on the conflicting leaf.
    assert_eq!(scope.t("menu.settings"), "設定");
    assert_eq!(scope.t("hello"), "哈囉");
}

#[tokio::test]
async fn nested_keys_are_flattened_at_load_time() {
    let (_guard, i18n) = build_i18n(I18nConfig::default()).await;

    assert_eq!(i18n.translate("en", "menu.settings", &HashMap::new()), "Settings");
    // The intermediate node is not a key.
    assert_eq!(i18n.translate("en", "menu", &HashMap::new()), "menu");
}

#[tokio::test]
async fn mid_request_renegotiation_switches_immediately() {
    let (_guard, i18n) = build_i18n(I18nConfig::default()).await;
    let ctx = TestUpdate::with_language("tw");

    let mut scope = i18n.request_scope(&ctx).await;
    assert_eq!(scope.t("hello"), "哈囉");

    scope.use_locale("cn");
    assert_eq!(scope.locale(), Some("cn"));
    assert_eq!(scope.t("hello"), "你好");

    scope.renegotiate(&ctx).await;
    assert_eq!(scope.locale(), Some("tw"));
    assert_eq!(scope.t("hello"), "哈囉");
}

#[tokio::test]
async fn get_locale_negotiates_lazily_on_unbound_scope() {
    let (_guard, i18n) = build_i18n(I18nConfig::default()).await;
    let ctx = TestUpdate::with_language("cn");

    let mut scope = i18n.scope(&ctx);
    assert_eq!(scope.locale(), None);

    assert_eq!(scope.get_locale(&ctx).await, "cn");
    assert_eq!(scope.locale(), Some("cn"));
}

#[tokio::test]
async fn set_locale_persists_before_applying() {
    let storage = Arc::new(MemoryStorage::default());
    let mut config = I18nConfig::default();
    config.settings.use_session = true;
    config.storage = Some(Arc::clone(&storage) as Arc<dyn LocaleStorage>);
    let (_guard, i18n) = build_i18n(config).await;
    let ctx = TestUpdate {
        language_code: Some("en".to_string()),
        chat_id: Some("chat-1".to_string()),
        first_name: None,
    };

    let mut scope = i18n.request_scope(&ctx).await;
    scope.set_locale(&ctx, "cn").await.unwrap();

    assert_eq!(scope.t("hello"), "你好");
    assert_eq!(storage.locales.lock().unwrap().get("chat-1").map(String::as_str), Some("cn"));

    // A fresh request for the same chat negotiates the persisted locale.
    let ctx_next = TestUpdate { chat_id: Some("chat-1".to_string()), ..TestUpdate::default() };
    let next_scope = i18n.request_scope(&ctx_next).await;
    assert_eq!(next_scope.locale(), Some("cn"));
}

#[tokio::test]
async fn set_locale_without_backend_is_a_configuration_error() {
    let mut config = I18nConfig::default();
    config.settings.use_session = true;
    let (_guard, i18n) = build_i18n(config).await;
    let ctx = TestUpdate { chat_id: Some("chat-1".to_string()), ..TestUpdate::default() };

    let mut scope = i18n.request_scope(&ctx).await;
    let result = scope.set_locale(&ctx, "cn").await;

    assert!(matches!(result, Err(SessionError::StorageUnavailable)));
}

#[tokio::test]
async fn set_locale_without_session_key_fails() {
    let mut config = I18nConfig::default();
    config.settings.use_session = true;
    config.storage = Some(Arc::new(MemoryStorage::default()));
    let (_guard, i18n) = build_i18n(config).await;
    let ctx = TestUpdate::with_language("en");

    let mut scope = i18n.request_scope(&ctx).await;
    let result = scope.set_locale(&ctx, "cn").await;

    assert!(matches!(result, Err(SessionError::MissingSessionKey)));
}

#[tokio::test]
async fn failed_persistence_does_not_apply_the_locale() {
    let mut config = I18nConfig::default();
    config.settings.use_session = true;
    config.storage = Some(Arc::new(BrokenStorage));
    let (_guard, i18n) = build_i18n(config).await;
    let ctx = TestUpdate {
        language_code: Some("en".to_string()),
        chat_id: Some("chat-1".to_string()),
        first_name: None,
    };

    let mut scope = i18n.request_scope(&ctx).await;
    let result = scope.set_locale(&ctx, "cn").await;

    assert!(matches!(result, Err(SessionError::Storage(_))));
    assert_eq!(scope.locale(), Some("en"));
    assert_eq!(scope.t("hello"), "Hello");
}

#[tokio::test]
async fn set_locale_without_session_config_is_a_use_locale_alias() {
    let (_guard, i18n) = build_i18n(I18nConfig::default()).await;
    let ctx = TestUpdate::with_language("en");

    let mut scope = i18n.request_scope(&ctx).await;
    scope.set_locale(&ctx, "cn").await.unwrap();

    assert_eq!(scope.locale(), Some("cn"));
}

#[tokio::test]
async fn empty_store_degrades_to_the_literal_key() {
    let observed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&observed);
    let config = I18nConfig {
        event_sink: Some(Box::new(move |event: &I18nEvent| {
            sink.lock().unwrap().push(event.clone());
        })),
        ..I18nConfig::default()
    };
    // No directory configured: the store stays empty.
    let i18n = Arc::new(I18n::new(config).await.unwrap());
    let ctx = TestUpdate::with_language("cn");

    let scope = i18n.request_scope(&ctx).await;

    assert_eq!(scope.t("hello"), "hello");
    assert_eq!(i18n.translate("cn", "hello", &HashMap::new()), "hello");
    let events = observed.lock().unwrap();
    assert!(events.iter().any(|event| matches!(event, I18nEvent::EmptyStore { .. })));
}

#[tokio::test]
async fn direct_translate_manages_locale_explicitly() {
    let (_guard, i18n) = build_i18n(I18nConfig::default()).await;

    assert_eq!(i18n.translate("cn", "hello", &HashMap::new()), "你好");
    assert_eq!(i18n.translate("cn", "greet", &vars(&[("name", "小明")])), "你好, 小明!");
    assert_eq!(i18n.translate("cn", "bye", &HashMap::new()), "Goodbye");
    assert_eq!(i18n.translate("not-exist", "hello", &HashMap::new()), "Hello");
    assert_eq!(i18n.translate("cn", "nope", &HashMap::new()), "nope");
}

#[tokio::test]
async fn hears_matches_the_bound_locale_translation() {
    let (_guard, i18n) = build_i18n(I18nConfig::default()).await;
    let ctx = TestUpdate::with_language("cn");

    let scope = i18n.request_scope(&ctx).await;
    let is_hello = hears("hello");

    assert!(is_hello(&scope, "你好"));
    assert!(!is_hello(&scope, "Hello"));
    assert!(!is_hello(&scope, "哈囉"));
}

#[tokio::test]
async fn global_context_variables_fill_placeholders() {
    let config = I18nConfig {
        global_context: Some(Box::new(|ctx: &TestUpdate| {
            let mut variables = HashMap::new();
            if let Some(name) = &ctx.first_name {
                variables.insert("name".to_string(), name.clone());
            }
            variables
        })),
        ..I18nConfig::default()
    };
    let (_guard, i18n) = build_i18n(config).await;
    let ctx = TestUpdate {
        language_code: Some("en".to_string()),
        chat_id: None,
        first_name: Some("Tom".to_string()),
    };

    let scope = i18n.request_scope(&ctx).await;

    assert_eq!(scope.t("greet"), "Hello, Tom!");
    // Call-site variables win over the global context.
    assert_eq!(scope.translate("greet", &vars(&[("name", "Ann")])), "Hello, Ann!");
}

#[tokio::test]
async fn locales_are_listed_in_discovery_order() {
    let (_guard, i18n) = build_i18n(I18nConfig::default()).await;

    // The walk is sorted by file name: cn.json, en.json, tw/.
    assert_eq!(i18n.locales(), ["cn", "en", "tw"]);
}

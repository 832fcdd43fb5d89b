//! Key resolution and placeholder interpolation.
//!
//! Both functions are pure and synchronous; they are shared by the direct
//! [`crate::i18n::I18n::translate`] entry point and the per-request bound
//! translator.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{
    Captures,
    Regex,
};

use crate::store::DictionaryStore;

/// Placeholder pattern: a brace-delimited identifier with no nested braces.
#[allow(clippy::unwrap_used)] // the pattern is a literal and always compiles
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([^{}]+)\}").unwrap());

/// Resolve `key` for `locale` with two-stage fallback.
///
/// Tries the requested locale's dictionary first, then (only when `locale`
/// differs from `default_locale`) the default locale's dictionary. Returns
/// `None` when the key is missing from both; callers render the key itself
/// in that case, which makes a failed lookup indistinguishable from a
/// translation that happens to equal the key text.
#[must_use]
pub fn resolve<'a>(
    store: &'a DictionaryStore,
    locale: &str,
    key: &str,
    default_locale: &str,
) -> Option<&'a str> {
    let requested = store.dictionary(locale).and_then(|dictionary| dictionary.get(key));
    if requested.is_some() || locale == default_locale {
        return requested;
    }
    store.dictionary(default_locale).and_then(|dictionary| dictionary.get(key))
}

/// Substitute `{name}` placeholders in `template` from `variables`.
///
/// Placeholders without a matching variable are left in place, so an
/// unresolved substitution stays visible in the rendered text instead of
/// silently disappearing.
#[must_use]
pub fn interpolate(template: &str, variables: &HashMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |captures: &Captures<'_>| {
            let name = captures.get(1).map_or("", |m| m.as_str());
            variables.get(name).cloned().unwrap_or_else(|| {
                captures.get(0).map_or_else(String::new, |m| m.as_str().to_string())
            })
        })
        .into_owned()
}

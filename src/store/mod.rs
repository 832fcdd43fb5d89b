//! Locale dictionaries and the immutable dictionary store.

pub mod loader;
pub mod merge;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::store::merge::{
    deep_merge,
    flatten,
};

/// Flat translation map for a single locale.
///
/// Keys are the dot-joined paths produced by [`merge::flatten`]; no nested
/// structure survives into this map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dictionary {
    /// Flattened key → template string entries.
    entries: HashMap<String, String>,
}

impl Dictionary {
    /// Look up a template string by its flattened key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the dictionary holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(entries: I) -> Self {
        Self { entries: entries.into_iter().collect() }
    }
}

/// Immutable mapping from locale ID to its flattened dictionary.
///
/// Built once at startup and only ever read afterwards; request tasks share
/// it through `Arc` without locking. Hot reloading, if ever added, must
/// replace the whole store atomically instead of mutating it in place.
#[derive(Debug, Clone, Default)]
pub struct DictionaryStore {
    /// Known locale IDs in discovery order.
    locales: Vec<String>,
    /// Locale ID → flattened dictionary.
    dictionaries: HashMap<String, Arc<Dictionary>>,
}

impl DictionaryStore {
    /// Build a store from raw `(locale, nested tree)` contributions.
    ///
    /// Contributions for the same locale are deep-merged in the order given
    /// (last write wins on conflicting leaves) and flattened afterwards,
    /// joining nested keys with `separator`.
    #[must_use]
    pub fn from_contributions<I>(contributions: I, separator: &str) -> Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut locales: Vec<String> = Vec::new();
        let mut merged: HashMap<String, Value> = HashMap::new();

        for (locale, tree) in contributions {
            match merged.get_mut(&locale) {
                Some(target) => deep_merge(target, tree),
                None => {
                    locales.push(locale.clone());
                    merged.insert(locale, tree);
                }
            }
        }

        let mut dictionaries = HashMap::with_capacity(locales.len());
        for locale in &locales {
            if let Some(tree) = merged.remove(locale) {
                let entries = flatten(&tree, separator, None);
                dictionaries.insert(locale.clone(), Arc::new(Dictionary { entries }));
            }
        }

        Self { locales, dictionaries }
    }

    /// Dictionary for `locale`, if the locale is known.
    #[must_use]
    pub fn dictionary(&self, locale: &str) -> Option<&Arc<Dictionary>> {
        self.dictionaries.get(locale)
    }

    /// Whether `locale` was discovered at load time.
    #[must_use]
    pub fn has_locale(&self, locale: &str) -> bool {
        self.locales.iter().any(|known| known == locale)
    }

    /// Known locale IDs in discovery order.
    #[must_use]
    pub fn locales(&self) -> &[String] {
        &self.locales
    }

    /// Whether the store holds no locales at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locales.is_empty()
    }

    /// Number of known locales.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locales.len()
    }
}

//! Translation source discovery and loading.
//!
//! Walks a locales directory, derives the locale ID for every matching
//! file, and parses the raw nested trees. Any unreadable or malformed file
//! fails the whole load; a broken translation source is a startup problem,
//! not something to paper over per key.

use std::path::{
    Path,
    PathBuf,
};

use globset::{
    Glob,
    GlobSet,
    GlobSetBuilder,
};
use ignore::WalkBuilder;
use serde_json::Value;
use thiserror::Error;

/// Error raised while loading translation sources.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The configured file pattern is not a valid glob.
    #[error("invalid translation file pattern '{pattern}': {source}")]
    Pattern {
        /// The offending pattern.
        pattern: String,
        /// Underlying glob error.
        #[source]
        source: globset::Error,
    },

    /// The locales directory cannot be walked.
    #[error("failed to read locales directory '{path}': {source}")]
    Directory {
        /// The directory that failed.
        path: PathBuf,
        /// Underlying walk error.
        #[source]
        source: ignore::Error,
    },

    /// A translation file could not be read.
    #[error("failed to read translation file '{path}': {source}")]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A translation file holds malformed JSON.
    #[error("failed to parse translation file '{path}': {source}")]
    Parse {
        /// The file that failed.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}

/// Load all translation contributions under `root`.
///
/// Files matching `pattern` are read concurrently; the returned
/// contributions keep discovery order, which fixes merge precedence for
/// locales spread over several files.
///
/// # Errors
/// - Invalid file pattern
/// - Unreadable directory or file
/// - Malformed JSON content
pub async fn load_locales_dir(
    root: &Path,
    pattern: &str,
) -> Result<Vec<(String, Value)>, LoadError> {
    let files = find_translation_files(root, pattern)?;
    tracing::debug!(root = %root.display(), files = files.len(), "Loading translation sources");

    let reads = files.iter().map(tokio::fs::read_to_string);
    let contents = futures::future::join_all(reads).await;

    let mut contributions = Vec::with_capacity(files.len());
    for (path, content) in files.into_iter().zip(contents) {
        let content = content.map_err(|source| LoadError::Io { path: path.clone(), source })?;
        let tree: Value = serde_json::from_str(&content)
            .map_err(|source| LoadError::Parse { path: path.clone(), source })?;
        if let Some(locale) = locale_for_path(root, &path) {
            contributions.push((locale, tree));
        }
    }

    Ok(contributions)
}

/// Collect translation files under `root` matching `pattern`.
///
/// The walk is sorted by file name so discovery order is stable across
/// platforms and runs.
fn find_translation_files(root: &Path, pattern: &str) -> Result<Vec<PathBuf>, LoadError> {
    let matcher = build_matcher(pattern)?;

    let mut found = Vec::new();
    for result in WalkBuilder::new(root)
        .hidden(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build()
    {
        let entry = result
            .map_err(|source| LoadError::Directory { path: root.to_path_buf(), source })?;

        if !entry.file_type().is_some_and(|file_type| file_type.is_file()) {
            continue;
        }

        let path = entry.path();
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        if !matcher.is_match(relative) {
            continue;
        }

        found.push(path.to_path_buf());
    }

    Ok(found)
}

/// Build the glob matcher for translation files.
fn build_matcher(pattern: &str) -> Result<GlobSet, LoadError> {
    let glob = Glob::new(pattern)
        .map_err(|source| LoadError::Pattern { pattern: pattern.to_string(), source })?;
    GlobSetBuilder::new()
        .add(glob)
        .build()
        .map_err(|source| LoadError::Pattern { pattern: pattern.to_string(), source })
}

/// Derive the locale ID for a translation file.
///
/// The ID is the first path segment relative to the walk root with any
/// extension stripped, so `en.json` and `en/buttons.json` both contribute
/// to `en`.
fn locale_for_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let first = relative.components().next()?;
    let name = first.as_os_str().to_string_lossy();
    let locale = name.split('.').next()?;
    (!locale.is_empty()).then(|| locale.to_string())
}

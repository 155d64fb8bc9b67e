//! Process-wide key/value providers.
//!
//! Environment variables and system properties are global state owned by the
//! operating system or the process. Sources read them through the
//! [`EnvironmentReader`] trait so tests can inject a [`StaticEnvironment`]
//! instead of mutating real process state.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::error::{ConfigError, ConfigResult};

/// Read-only view over a flat string-to-string namespace.
pub trait EnvironmentReader: fmt::Debug + Send + Sync {
    /// Take a snapshot of every entry.
    fn snapshot(&self) -> BTreeMap<String, String>;

    /// Whether any entry name starts with `prefix`.
    fn has_prefix(&self, prefix: &str) -> bool {
        self.snapshot().keys().any(|name| name.starts_with(prefix))
    }
}

/// The real process environment.
///
/// Entries whose name or value is not valid UTF-8 are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl EnvironmentReader for ProcessEnvironment {
    fn snapshot(&self) -> BTreeMap<String, String> {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }

    fn has_prefix(&self, prefix: &str) -> bool {
        std::env::vars_os().any(|(k, _)| k.to_str().is_some_and(|k| k.starts_with(prefix)))
    }
}

fn registry() -> &'static RwLock<BTreeMap<String, String>> {
    static REGISTRY: OnceLock<RwLock<BTreeMap<String, String>>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(BTreeMap::new()))
}

/// Process-wide system property registry.
///
/// The registry is shared by every [`SystemProperties`] handle in the
/// process. Binaries usually populate it from `-D key=value` arguments before
/// loading configuration.
///
/// # Example
///
/// ```
/// use strata_config::SystemProperties;
///
/// SystemProperties::define("docs.example.port=7000").unwrap();
/// assert_eq!(SystemProperties::get("docs.example.port").as_deref(), Some("7000"));
/// SystemProperties::remove("docs.example.port");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProperties;

impl SystemProperties {
    /// Set a property, returning its previous value.
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        registry().write().insert(key.into(), value.into())
    }

    /// Read a property.
    pub fn get(key: &str) -> Option<String> {
        registry().read().get(key).cloned()
    }

    /// Remove a property, returning its value.
    pub fn remove(key: &str) -> Option<String> {
        registry().write().remove(key)
    }

    /// Set a property from a `key=value` definition.
    ///
    /// The value may be empty; the key may not.
    pub fn define(definition: &str) -> ConfigResult<()> {
        let (key, value) = definition.split_once('=').ok_or_else(|| {
            ConfigError::invalid_value(definition, "expected a `key=value` definition")
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ConfigError::invalid_value(definition, "property name is empty"));
        }
        Self::set(key, value);
        Ok(())
    }
}

impl EnvironmentReader for SystemProperties {
    fn snapshot(&self) -> BTreeMap<String, String> {
        registry().read().clone()
    }

    fn has_prefix(&self, prefix: &str) -> bool {
        registry().read().keys().any(|name| name.starts_with(prefix))
    }
}

/// A map-backed reader whose clones share the same entries.
///
/// Used in tests and when embedding the loader in a host that already owns
/// its settings.
#[derive(Debug, Clone, Default)]
pub struct StaticEnvironment {
    entries: Arc<RwLock<BTreeMap<String, String>>>,
}

impl StaticEnvironment {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an entry, returning its previous value.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.write().insert(key.into(), value.into())
    }

    /// Remove an entry, returning its value.
    pub fn remove(&self, key: &str) -> Option<String> {
        self.entries.write().remove(key)
    }

    /// Builder-style variant of [`StaticEnvironment::set`].
    #[must_use]
    pub fn with(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }
}

impl<K, V> FromIterator<(K, V)> for StaticEnvironment
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let entries = iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self {
            entries: Arc::new(RwLock::new(entries)),
        }
    }
}

impl EnvironmentReader for StaticEnvironment {
    fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries.read().clone()
    }

    fn has_prefix(&self, prefix: &str) -> bool {
        self.entries.read().keys().any(|name| name.starts_with(prefix))
    }
}

/// A `.env` file overlaid by the real process environment.
///
/// Variables already present in the process win over the file, matching
/// `dotenvy`'s own precedence. A missing or unreadable file contributes
/// nothing.
#[derive(Debug, Clone)]
pub struct DotenvEnvironment {
    path: PathBuf,
}

impl DotenvEnvironment {
    /// Read variables from the given `.env` file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read variables from `.env` in the current directory.
    pub fn current_dir() -> Self {
        Self::new(".env")
    }

    /// Path of the `.env` file.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn file_entries(&self) -> BTreeMap<String, String> {
        let iter = match dotenvy::from_path_iter(&self.path) {
            Ok(iter) => iter,
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "No .env file loaded");
                return BTreeMap::new();
            }
        };

        let mut entries = BTreeMap::new();
        for item in iter {
            match item {
                Ok((key, value)) => {
                    entries.insert(key, value);
                }
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "Skipping malformed .env line");
                }
            }
        }
        entries
    }
}

impl EnvironmentReader for DotenvEnvironment {
    fn snapshot(&self) -> BTreeMap<String, String> {
        let mut entries = self.file_entries();
        entries.extend(ProcessEnvironment.snapshot());
        entries
    }
}

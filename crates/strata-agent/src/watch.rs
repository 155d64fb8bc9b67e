//! The agent's watch configuration.
//!
//! The agent watches a set of folders for file changes. Its configuration
//! can arrive in two shapes:
//!
//! - a structured document, usually YAML:
//!
//!   ```yaml
//!   strata:
//!     port: 8080
//!     watch:
//!       - path: target/debug
//!         patterns: ["**/*.class"]
//!         recursive: true
//!         interval_ms: 500
//!   ```
//!
//! - flat keys, from system properties, environment variables or a
//!   properties file: `port`, `watch.paths` (comma separated),
//!   `watch.recursive`, `watch.interval_ms`, `watch.patterns`. Environment
//!   variables use `_` instead of `.` (`STRATA_WATCH_PATHS`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strata_config::{ConfigError, ConfigResult, RawValue};

/// Section that wraps the structured document.
pub const ROOT_SECTION: &str = "strata";

/// Port used when none is configured.
pub const DEFAULT_PORT: u16 = 8080;

/// Polling interval used when none is configured.
pub const DEFAULT_INTERVAL_MS: u64 = 1000;

/// Pattern used when a folder lists none.
pub const DEFAULT_PATTERN: &str = "**/*";

/// Build output directories watched by default, in lookup order.
pub const DEFAULT_OUTPUT_DIRS: [&str; 4] = ["target/debug", "target/release", "build", "out"];

/// Resolved agent configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfiguration {
    /// Port the agent listens on.
    pub port: u16,
    /// Folders to watch.
    pub folders: Vec<FolderWatch>,
}

/// A watched folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderWatch {
    /// Folder path.
    pub path: PathBuf,
    /// Polling interval in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Glob patterns of files to watch.
    #[serde(default = "default_patterns")]
    pub patterns: Vec<String>,
    /// Whether subfolders are watched.
    #[serde(default = "default_recursive")]
    pub recursive: bool,
}

const fn default_interval_ms() -> u64 {
    DEFAULT_INTERVAL_MS
}

fn default_patterns() -> Vec<String> {
    vec![DEFAULT_PATTERN.to_string()]
}

const fn default_recursive() -> bool {
    true
}

impl FolderWatch {
    /// Watch `path` with default settings.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            interval_ms: DEFAULT_INTERVAL_MS,
            patterns: default_patterns(),
            recursive: true,
        }
    }
}

impl WatchConfiguration {
    /// Default configuration rooted at the current directory.
    pub fn create_default() -> Self {
        Self::default_in(Path::new("."))
    }

    /// Default configuration rooted at `root`.
    ///
    /// Watches every existing build output directory under `root`, or `root`
    /// itself when there is none.
    pub fn default_in(root: &Path) -> Self {
        let mut folders: Vec<FolderWatch> = DEFAULT_OUTPUT_DIRS
            .iter()
            .map(|dir| root.join(dir))
            .filter(|path| path.is_dir())
            .map(FolderWatch::new)
            .collect();

        if folders.is_empty() {
            folders.push(FolderWatch::new(root));
        }

        Self {
            port: DEFAULT_PORT,
            folders,
        }
    }

    /// Check business rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a zero port, an empty folder
    /// list, an empty path, a zero interval, or a folder without patterns.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.port == 0 {
            return Err(ConfigError::invalid_value("port", "must be non-zero"));
        }
        if self.folders.is_empty() {
            return Err(ConfigError::invalid_value("watch", "at least one folder is required"));
        }

        for (index, folder) in self.folders.iter().enumerate() {
            if folder.path.as_os_str().is_empty() {
                return Err(ConfigError::invalid_value(
                    format!("watch[{index}].path"),
                    "must not be empty",
                ));
            }
            if folder.interval_ms == 0 {
                return Err(ConfigError::invalid_value(
                    format!("watch[{index}].interval_ms"),
                    "must be positive",
                ));
            }
            if folder.patterns.iter().all(|p| p.trim().is_empty()) {
                return Err(ConfigError::invalid_value(
                    format!("watch[{index}].patterns"),
                    "at least one pattern is required",
                ));
            }
        }

        Ok(())
    }
}

/// Turn raw source data into a [`WatchConfiguration`].
///
/// # Errors
///
/// Fails when the data is not a map, a value cannot be parsed, or no watch
/// path is configured.
pub fn transform(raw: RawValue) -> ConfigResult<WatchConfiguration> {
    let mut map = raw
        .into_map()
        .ok_or_else(|| ConfigError::invalid_value("configuration", "expected a map of settings"))?;

    let section = match map.remove(ROOT_SECTION) {
        Some(RawValue::Map(inner)) => inner,
        Some(other) => {
            map.insert(ROOT_SECTION, other);
            map
        }
        None => map,
    };

    let port = match section.get("port") {
        Some(value) => value.clone().deserialize()?,
        None => DEFAULT_PORT,
    };

    let folders = match section.get("watch") {
        Some(RawValue::List(items)) => items
            .iter()
            .cloned()
            .map(RawValue::deserialize::<FolderWatch>)
            .collect::<ConfigResult<Vec<_>>>()?,
        Some(RawValue::Map(watch)) => flat_folders(|key| watch.get(key))?,
        _ => flat_folders(|key| {
            section
                .get(&format!("watch.{key}"))
                .or_else(|| section.get(&format!("watch_{key}")))
        })?,
    };

    Ok(WatchConfiguration { port, folders })
}

fn flat_folders<'a>(lookup: impl Fn(&str) -> Option<&'a RawValue>) -> ConfigResult<Vec<FolderWatch>> {
    let paths: Vec<String> = optional(lookup("paths"))?.unwrap_or_default();
    let paths: Vec<String> = paths.into_iter().filter(|p| !p.is_empty()).collect();
    if paths.is_empty() {
        return Err(ConfigError::missing_field("watch.paths"));
    }

    let interval_ms = optional(lookup("interval_ms"))?.unwrap_or(DEFAULT_INTERVAL_MS);
    let recursive = optional(lookup("recursive"))?.unwrap_or(true);
    let patterns: Vec<String> = optional(lookup("patterns"))?.unwrap_or_else(default_patterns);

    Ok(paths
        .into_iter()
        .map(|path| FolderWatch {
            path: PathBuf::from(path),
            interval_ms,
            patterns: patterns.clone(),
            recursive,
        })
        .collect())
}

fn optional<T: serde::de::DeserializeOwned>(value: Option<&RawValue>) -> ConfigResult<Option<T>> {
    value.cloned().map(RawValue::deserialize).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_config::RawMap;

    fn flat(entries: &[(&str, &str)]) -> RawValue {
        RawValue::Map(entries.iter().copied().collect())
    }

    #[test]
    fn test_flat_keys() {
        let config = transform(flat(&[
            ("port", "9000"),
            ("watch.paths", "a, b"),
            ("watch.recursive", "no"),
            ("watch.interval_ms", "250"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.folders.len(), 2);
        assert_eq!(config.folders[0].path, PathBuf::from("a"));
        assert_eq!(config.folders[1].path, PathBuf::from("b"));
        assert!(!config.folders[1].recursive);
        assert_eq!(config.folders[1].interval_ms, 250);
        assert_eq!(config.folders[1].patterns, vec!["**/*".to_string()]);
    }

    #[test]
    fn test_environment_style_keys() {
        let config = transform(flat(&[("watch_paths", "src"), ("watch_patterns", "*.rs,*.toml")])).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.folders[0].path, PathBuf::from("src"));
        assert_eq!(config.folders[0].patterns, vec!["*.rs".to_string(), "*.toml".to_string()]);
    }

    #[test]
    fn test_structured_document() {
        let mut folder = RawMap::new();
        folder.insert("path", "target/debug");
        folder.insert("patterns", RawValue::List(vec!["**/*.class".into()]));
        folder.insert("interval_ms", "500");

        let mut section = RawMap::new();
        section.insert("port", "7000");
        section.insert("watch", RawValue::List(vec![RawValue::Map(folder)]));

        let mut root = RawMap::new();
        root.insert(ROOT_SECTION, section);

        let config = transform(RawValue::Map(root)).unwrap();
        assert_eq!(config.port, 7000);
        assert_eq!(
            config.folders,
            vec![FolderWatch {
                path: PathBuf::from("target/debug"),
                interval_ms: 500,
                patterns: vec!["**/*.class".to_string()],
                recursive: true,
            }]
        );
    }

    #[test]
    fn test_nested_watch_map() {
        let mut watch = RawMap::new();
        watch.insert("paths", "out");
        let mut root = RawMap::new();
        root.insert("watch", watch);

        let config = transform(RawValue::Map(root)).unwrap();
        assert_eq!(config.folders, vec![FolderWatch::new("out")]);
    }

    #[test]
    fn test_missing_paths_is_error() {
        let err = transform(flat(&[("port", "9000")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { .. }));

        let err = transform(flat(&[("watch.paths", " , ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { .. }));
    }

    #[test]
    fn test_bad_port_is_error() {
        let err = transform(flat(&[("port", "http"), ("watch.paths", "a")])).unwrap_err();
        assert!(matches!(err, ConfigError::Decode(_)));
    }

    #[test]
    fn test_non_map_is_error() {
        assert!(transform(RawValue::Scalar("nope".to_string())).is_err());
    }

    #[test]
    fn test_validate() {
        let valid = WatchConfiguration {
            port: 8080,
            folders: vec![FolderWatch::new("out")],
        };
        assert!(valid.validate().is_ok());

        let mut config = valid.clone();
        config.port = 0;
        assert!(config.validate().is_err());

        let mut config = valid.clone();
        config.folders.clear();
        assert!(config.validate().is_err());

        let mut config = valid.clone();
        config.folders[0].interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = valid.clone();
        config.folders[0].patterns = vec![" ".to_string()];
        assert!(config.validate().is_err());

        let mut config = valid;
        config.folders[0].path = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_prefers_build_output() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("target/release")).unwrap();
        std::fs::create_dir_all(dir.path().join("out")).unwrap();

        let config = WatchConfiguration::default_in(dir.path());
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(
            config.folders,
            vec![
                FolderWatch::new(dir.path().join("target/release")),
                FolderWatch::new(dir.path().join("out")),
            ]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_falls_back_to_root() {
        let dir = tempfile::tempdir().unwrap();
        let config = WatchConfiguration::default_in(dir.path());
        assert_eq!(config.folders, vec![FolderWatch::new(dir.path())]);
    }
}

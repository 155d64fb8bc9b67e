//! File-backed sources.
//!
//! A [`FileSource`] pairs an [`Origin`] (filesystem path or classpath
//! resource) with a [`FileFormat`]. Obtaining the bytes is the only step that
//! differs between the two origins; parsing and error wrapping are shared.

use std::fmt;
use std::marker::PhantomData;
use std::path::PathBuf;

use crate::error::{ConfigError, ConfigResult};
use crate::raw::{RawMap, RawValue};
use crate::source::ConfigurationSource;

use super::classpath::{is_readable_file, read_optional, Classpath};

/// A configuration file syntax.
pub trait FileFormat: fmt::Debug + Send + Sync + 'static {
    /// Name used in source descriptions, e.g. `"YAML"`.
    const NAME: &'static str;

    /// Priority used when the caller does not assign one.
    const DEFAULT_PRIORITY: i32;

    /// Parse raw bytes. `Ok(None)` means the content holds no configuration.
    fn parse(bytes: &[u8], location: &str) -> ConfigResult<Option<RawValue>>;
}

/// Where a file source reads its bytes from.
#[derive(Debug, Clone)]
pub enum Origin {
    /// A path on the filesystem.
    Filesystem(PathBuf),
    /// A named resource resolved through a [`Classpath`].
    Classpath {
        /// Resource name relative to the classpath roots.
        resource: String,
        /// Lookup roots and embedded resources.
        classpath: Classpath,
    },
}

impl Origin {
    /// Whether the bytes can be obtained, without reading them.
    pub fn exists(&self) -> bool {
        match self {
            Self::Filesystem(path) => is_readable_file(path),
            Self::Classpath {
                resource,
                classpath,
            } => classpath.contains(resource),
        }
    }

    /// Read the bytes. A vanished file or unresolvable resource is `Ok(None)`.
    pub fn read(&self) -> ConfigResult<Option<Vec<u8>>> {
        match self {
            Self::Filesystem(path) => {
                read_optional(path).map_err(|e| ConfigError::read_error(self.location(), e))
            }
            Self::Classpath {
                resource,
                classpath,
            } => classpath
                .read(resource)
                .map_err(|e| ConfigError::read_error(self.location(), e)),
        }
    }

    /// Path or resource name.
    pub fn location(&self) -> String {
        match self {
            Self::Filesystem(path) => path.display().to_string(),
            Self::Classpath { resource, .. } => resource.clone(),
        }
    }

    /// Whether this origin is a classpath resource.
    pub fn is_classpath(&self) -> bool {
        matches!(self, Self::Classpath { .. })
    }

    fn mode(&self) -> &'static str {
        if self.is_classpath() {
            "classpath"
        } else {
            "file system"
        }
    }
}

/// A source backed by a single file in format `F`.
pub struct FileSource<F: FileFormat> {
    origin: Origin,
    priority: i32,
    prefix: Option<String>,
    format: PhantomData<F>,
}

impl<F: FileFormat> FileSource<F> {
    /// Read from a filesystem path.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self::with_origin(Origin::Filesystem(path.into()))
    }

    /// Read a resource from the default [`Classpath::from_env`].
    pub fn from_classpath(resource: impl Into<String>) -> Self {
        Self::from_classpath_in(resource, Classpath::from_env())
    }

    /// Read a resource from an explicit classpath.
    pub fn from_classpath_in(resource: impl Into<String>, classpath: Classpath) -> Self {
        Self::with_origin(Origin::Classpath {
            resource: resource.into(),
            classpath,
        })
    }

    /// Read from an arbitrary origin.
    pub fn with_origin(origin: Origin) -> Self {
        Self {
            origin,
            priority: F::DEFAULT_PRIORITY,
            prefix: None,
            format: PhantomData,
        }
    }

    /// Override the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Keep only keys under `prefix`, with the prefix stripped.
    ///
    /// With prefix `app.`, both the flat key `app.port` and the nested
    /// section `app: {port: ..}` yield key `port`.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Where the bytes come from.
    pub fn origin(&self) -> &Origin {
        &self.origin
    }
}

impl<F: FileFormat> Clone for FileSource<F> {
    fn clone(&self) -> Self {
        Self {
            origin: self.origin.clone(),
            priority: self.priority,
            prefix: self.prefix.clone(),
            format: PhantomData,
        }
    }
}

impl<F: FileFormat> fmt::Debug for FileSource<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSource")
            .field("format", &F::NAME)
            .field("origin", &self.origin)
            .field("priority", &self.priority)
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl<F: FileFormat> ConfigurationSource for FileSource<F> {
    fn is_available(&self) -> bool {
        self.origin.exists()
    }

    fn load(&self) -> ConfigResult<Option<RawValue>> {
        match self.origin.read()? {
            Some(bytes) => {
                let parsed = F::parse(&bytes, &self.origin.location())?;
                Ok(match &self.prefix {
                    Some(prefix) => parsed.and_then(|raw| scope(raw, prefix, &self.origin.location())),
                    None => parsed,
                })
            }
            None => {
                tracing::debug!(source = %self.description(), "Configuration file disappeared before load");
                Ok(None)
            }
        }
    }

    fn description(&self) -> String {
        format!("{} File ({}): {}", F::NAME, self.origin.mode(), self.origin.location())
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

fn scope(raw: RawValue, prefix: &str, location: &str) -> Option<RawValue> {
    let section = prefix.trim_end_matches('.');
    let RawValue::Map(map) = raw else {
        tracing::debug!(location, prefix, "Document is not a map, nothing under the prefix");
        return None;
    };

    let mut scoped = RawMap::new();
    for (key, value) in map {
        if key == section {
            match value {
                RawValue::Map(inner) => {
                    for (inner_key, inner_value) in inner {
                        scoped.insert(inner_key, inner_value);
                    }
                }
                other => {
                    tracing::debug!(location, section, value = ?other, "Ignoring non-map prefix section");
                }
            }
        } else if let Some(rest) = key.strip_prefix(prefix) {
            if !rest.is_empty() {
                scoped.insert(rest, value);
            }
        }
    }
    (!scoped.is_empty()).then_some(RawValue::Map(scoped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{PropertiesSource, YamlSource};

    #[test]
    fn test_filesystem_yaml_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.yaml");
        std::fs::write(&path, "port: 8080\n").unwrap();

        let source = YamlSource::from_file(&path);
        assert!(source.is_available());
        assert_eq!(source.priority(), 500);
        assert_eq!(
            source.description(),
            format!("YAML File (file system): {}", path.display())
        );

        let raw = source.load().unwrap().unwrap();
        assert_eq!(raw.as_map().and_then(|m| m.get_str("port")), Some("8080"));
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let source = PropertiesSource::from_file("/nonexistent/strata/app.properties");
        assert!(!source.is_available());
        assert!(source.load().unwrap().is_none());
    }

    #[test]
    fn test_vanished_file_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.properties");
        std::fs::write(&path, "port=1\n").unwrap();

        let source = PropertiesSource::from_file(&path);
        assert!(source.is_available());
        std::fs::remove_file(&path).unwrap();
        assert!(source.load().unwrap().is_none());
    }

    #[test]
    fn test_directory_read_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = YamlSource::from_file(dir.path());
        assert!(!source.is_available());
        let err = source.load().unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn test_classpath_source() {
        let classpath = Classpath::new().with_embedded("app.properties", b"port=9000\n");
        let source = PropertiesSource::from_classpath_in("app.properties", classpath);
        assert!(source.origin().is_classpath());
        assert!(source.is_available());
        assert_eq!(source.priority(), 400);
        assert_eq!(source.description(), "Properties File (classpath): app.properties");

        let raw = source.load().unwrap().unwrap();
        assert_eq!(raw.as_map().and_then(|m| m.get_str("port")), Some("9000"));
    }

    #[test]
    fn test_unresolved_classpath_resource() {
        let source = YamlSource::from_classpath_in("missing.yaml", Classpath::new());
        assert!(!source.is_available());
        assert!(source.load().unwrap().is_none());
    }

    #[test]
    fn test_prefix_strips_flat_and_nested_keys() {
        let dir = tempfile::tempdir().unwrap();
        let props = dir.path().join("app.properties");
        let yaml = dir.path().join("app.yaml");
        std::fs::write(&props, "app.a=1\napp.b=2\nother.c=3\n").unwrap();
        std::fs::write(&yaml, "app:\n  a: 1\n  b: 2\nother:\n  c: 3\n").unwrap();

        let expected = RawValue::Map(RawMap::from_iter([("a", "1"), ("b", "2")]));
        let from_props = PropertiesSource::from_file(&props).with_prefix("app.").load().unwrap();
        let from_yaml = YamlSource::from_file(&yaml).with_prefix("app.").load().unwrap();
        assert_eq!(from_props, Some(expected.clone()));
        assert_eq!(from_yaml, Some(expected));
    }

    #[test]
    fn test_prefix_without_matches_is_absent() {
        let classpath = Classpath::new().with_embedded("app.properties", b"other.c=3\n");
        let source = PropertiesSource::from_classpath_in("app.properties", classpath).with_prefix("app.");
        assert!(source.is_available());
        assert!(source.load().unwrap().is_none());
    }

    #[test]
    fn test_prefix_skips_non_map_section_and_multi_document() {
        let classpath = Classpath::new()
            .with_embedded("scalar.yaml", b"app: 5\n")
            .with_embedded("mixed.yaml", b"app: 5\napp.b: 2\n")
            .with_embedded("multi.yaml", b"app:\n  a: 1\n---\nother: 2\n");

        let scalar = YamlSource::from_classpath_in("scalar.yaml", classpath.clone()).with_prefix("app.");
        assert!(scalar.load().unwrap().is_none());

        let mixed = YamlSource::from_classpath_in("mixed.yaml", classpath.clone()).with_prefix("app.");
        assert_eq!(
            mixed.load().unwrap(),
            Some(RawValue::Map(RawMap::from_iter([("b", "2")])))
        );

        let multi = YamlSource::from_classpath_in("multi.yaml", classpath).with_prefix("app.");
        assert!(multi.is_available());
        assert!(multi.load().unwrap().is_none());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let classpath = Classpath::new().with_embedded("bad.yaml", b"a: [1, 2\nb: }");
        let source = YamlSource::from_classpath_in("bad.yaml", classpath);
        assert!(source.is_available());
        let err = source.load().unwrap_err();
        assert!(err.category().is_recoverable());
    }
}

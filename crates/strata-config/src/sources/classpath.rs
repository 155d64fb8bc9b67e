//! Resource lookup for classpath-mode file sources.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// Environment variable holding classpath roots, in platform path-list syntax.
pub const CLASSPATH_ENV: &str = "CONFIG_CLASSPATH";

/// An ordered set of places where named resources are looked up.
///
/// Embedded resources (usually `include_bytes!` data) are consulted first,
/// then each root directory in order. The first match wins.
///
/// # Example
///
/// ```
/// use strata_config::Classpath;
///
/// let classpath = Classpath::new()
///     .with_embedded("defaults.yaml", b"port: 8080\n")
///     .with_root("/etc/myapp");
///
/// assert!(classpath.contains("defaults.yaml"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Classpath {
    roots: Vec<PathBuf>,
    embedded: BTreeMap<String, Cow<'static, [u8]>>,
}

impl Classpath {
    /// Create an empty classpath.
    pub fn new() -> Self {
        Self::default()
    }

    /// Roots from [`CLASSPATH_ENV`], or the current directory when unset.
    pub fn from_env() -> Self {
        let roots: Vec<PathBuf> = std::env::var_os(CLASSPATH_ENV)
            .map(|paths| std::env::split_paths(&paths).collect())
            .unwrap_or_default();

        if roots.is_empty() {
            Self::new().with_root(".")
        } else {
            Self {
                roots,
                embedded: BTreeMap::new(),
            }
        }
    }

    /// Append a root directory.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.roots.push(root.into());
        self
    }

    /// Register a resource compiled into the binary.
    #[must_use]
    pub fn with_embedded(mut self, name: impl Into<String>, bytes: &'static [u8]) -> Self {
        self.embedded.insert(name.into(), Cow::Borrowed(bytes));
        self
    }

    /// Register an owned in-memory resource.
    #[must_use]
    pub fn with_resource(mut self, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.embedded.insert(name.into(), Cow::Owned(bytes));
        self
    }

    /// Root directories in lookup order.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Whether a resource resolves, without reading it.
    pub fn contains(&self, name: &str) -> bool {
        self.embedded.contains_key(name) || self.locate(name).is_some()
    }

    /// Filesystem location of a resource, if it resolves to a root.
    pub fn locate(&self, name: &str) -> Option<PathBuf> {
        let relative = name.trim_start_matches('/');
        self.roots
            .iter()
            .map(|root| root.join(relative))
            .find(|candidate| is_readable_file(candidate))
    }

    /// Read a resource. Returns `Ok(None)` when it does not resolve.
    pub fn read(&self, name: &str) -> io::Result<Option<Vec<u8>>> {
        if let Some(bytes) = self.embedded.get(name) {
            return Ok(Some(bytes.to_vec()));
        }
        match self.locate(name) {
            Some(path) => read_optional(&path),
            None => Ok(None),
        }
    }
}

/// Whether `path` is a regular file this process can open.
pub(crate) fn is_readable_file(path: &Path) -> bool {
    path.is_file() && File::open(path).is_ok()
}

/// Read a file, mapping "not found" to `Ok(None)`.
pub(crate) fn read_optional(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

//! System property source.

use std::sync::Arc;

use crate::environment::{EnvironmentReader, SystemProperties};
use crate::error::ConfigResult;
use crate::raw::{RawMap, RawValue};
use crate::source::{ConfigurationSource, SYSTEM_PROPERTY_PRIORITY};

/// Reads every system property starting with a prefix.
///
/// The prefix is stripped and the remainder keeps its case, so with prefix
/// `myapp.` the property `myapp.port` becomes key `port`.
#[derive(Debug, Clone)]
pub struct SystemPropertySource {
    prefix: String,
    reader: Arc<dyn EnvironmentReader>,
}

impl SystemPropertySource {
    /// Read from the process-wide [`SystemProperties`] registry.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::with_reader(prefix, Arc::new(SystemProperties))
    }

    /// Read from an injected reader.
    pub fn with_reader(prefix: impl Into<String>, reader: Arc<dyn EnvironmentReader>) -> Self {
        Self {
            prefix: prefix.into(),
            reader,
        }
    }

    /// The property name prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl ConfigurationSource for SystemPropertySource {
    fn is_available(&self) -> bool {
        self.reader.has_prefix(&self.prefix)
    }

    fn load(&self) -> ConfigResult<Option<RawValue>> {
        let map: RawMap = self
            .reader
            .snapshot()
            .into_iter()
            .filter_map(|(name, value)| {
                let key = name.strip_prefix(self.prefix.as_str())?;
                (!key.is_empty()).then(|| (key.to_string(), value))
            })
            .collect();

        Ok((!map.is_empty()).then_some(RawValue::Map(map)))
    }

    fn description(&self) -> String {
        format!("System Properties (prefix: {})", self.prefix)
    }

    fn priority(&self) -> i32 {
        SYSTEM_PROPERTY_PRIORITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::StaticEnvironment;

    fn source(entries: &[(&str, &str)]) -> SystemPropertySource {
        let reader = StaticEnvironment::from_iter(entries.iter().copied());
        SystemPropertySource::with_reader("myapp.", Arc::new(reader))
    }

    #[test]
    fn test_strips_prefix_and_keeps_case() {
        let source = source(&[("myapp.port", "7000"), ("myapp.Host", "h"), ("other.x", "1")]);
        assert!(source.is_available());

        let raw = source.load().unwrap().unwrap();
        let map = raw.as_map().unwrap();
        assert_eq!(map.get_str("port"), Some("7000"));
        assert_eq!(map.get_str("Host"), Some("h"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_unavailable_without_matching_property() {
        let source = source(&[("other.port", "1")]);
        assert!(!source.is_available());
        assert!(source.load().unwrap().is_none());
    }

    #[test]
    fn test_bare_prefix_loads_nothing() {
        let source = source(&[("myapp.", "x")]);
        assert!(source.is_available());
        assert!(source.load().unwrap().is_none());
    }

    #[test]
    fn test_description_and_priority() {
        let source = SystemPropertySource::new("myapp.");
        assert_eq!(source.description(), "System Properties (prefix: myapp.)");
        assert_eq!(source.priority(), 1000);
        assert_eq!(source.prefix(), "myapp.");
    }
}

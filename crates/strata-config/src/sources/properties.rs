//! Java properties file format.

use crate::error::{ConfigError, ConfigResult};
use crate::raw::{RawMap, RawValue};
use crate::source::PROPERTIES_PRIORITY;

use super::file::{FileFormat, FileSource};

/// `key=value` properties parsed with `java-properties`.
///
/// Supports `#`/`!` comments, `=`/`:`/whitespace separators, backslash line
/// continuations and `\uXXXX` escapes. The result is a flat map; a file with
/// no entries is absent.
#[derive(Debug, Clone, Copy)]
pub struct Properties;

/// A properties file source.
pub type PropertiesSource = FileSource<Properties>;

impl FileFormat for Properties {
    const NAME: &'static str = "Properties";
    const DEFAULT_PRIORITY: i32 = PROPERTIES_PRIORITY;

    fn parse(bytes: &[u8], location: &str) -> ConfigResult<Option<RawValue>> {
        let entries = java_properties::read(bytes).map_err(|source| ConfigError::PropertiesError {
            location: location.to_string(),
            source,
        })?;

        let map: RawMap = entries.into_iter().collect();
        Ok((!map.is_empty()).then_some(RawValue::Map(map)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> RawMap {
        Properties::parse(text.as_bytes(), "test.properties")
            .unwrap()
            .and_then(RawValue::into_map)
            .unwrap()
    }

    #[test]
    fn test_properties_syntax() {
        let map = parse(
            "# comment\n! also a comment\nport=8080\nhost : localhost\nname value\npaths=a,\\\n    b\nunicode=caf\\u00e9\n",
        );
        assert_eq!(map.get_str("port"), Some("8080"));
        assert_eq!(map.get_str("host"), Some("localhost"));
        assert_eq!(map.get_str("name"), Some("value"));
        assert_eq!(map.get_str("paths"), Some("a,b"));
        assert_eq!(map.get_str("unicode"), Some("café"));
        assert_eq!(map.len(), 5);
    }

    #[test]
    fn test_empty_is_absent() {
        assert!(Properties::parse(b"# nothing here\n", "empty.properties")
            .unwrap()
            .is_none());
    }
}

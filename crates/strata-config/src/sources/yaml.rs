//! YAML file format.

use serde::Deserialize;
use serde_yaml::Value;

use crate::error::{ConfigError, ConfigResult};
use crate::raw::{RawMap, RawValue};
use crate::source::YAML_PRIORITY;

use super::file::{FileFormat, FileSource};

/// YAML 1.1 documents parsed with `serde_yaml`.
///
/// A single document is returned as-is; a multi-document stream is returned
/// as a [`RawValue::List`] of documents. Empty input is absent.
#[derive(Debug, Clone, Copy)]
pub struct Yaml;

/// A YAML file source.
///
/// # Example
///
/// ```no_run
/// use strata_config::{ConfigurationSource, YamlSource};
///
/// let source = YamlSource::from_file("/etc/myapp/app.yaml").with_priority(450);
/// assert_eq!(source.description(), "YAML File (file system): /etc/myapp/app.yaml");
/// ```
pub type YamlSource = FileSource<Yaml>;

impl FileFormat for Yaml {
    const NAME: &'static str = "YAML";
    const DEFAULT_PRIORITY: i32 = YAML_PRIORITY;

    fn parse(bytes: &[u8], location: &str) -> ConfigResult<Option<RawValue>> {
        let mut documents = Vec::new();
        for document in serde_yaml::Deserializer::from_slice(bytes) {
            let value = Value::deserialize(document).map_err(|source| ConfigError::YamlError {
                location: location.to_string(),
                source,
            })?;
            documents.push(convert(value, location)?);
        }

        if documents.iter().all(RawValue::is_null) {
            return Ok(None);
        }
        if documents.len() == 1 {
            return Ok(documents.pop());
        }
        Ok(Some(RawValue::List(documents)))
    }
}

fn convert(value: Value, location: &str) -> ConfigResult<RawValue> {
    let raw = match value {
        Value::Null => RawValue::Null,
        Value::Bool(flag) => RawValue::Scalar(flag.to_string()),
        Value::Number(number) => RawValue::Scalar(number.to_string()),
        Value::String(text) => RawValue::Scalar(text),
        Value::Sequence(items) => RawValue::List(
            items
                .into_iter()
                .map(|item| convert(item, location))
                .collect::<ConfigResult<_>>()?,
        ),
        Value::Mapping(mapping) => {
            let mut map = RawMap::new();
            for (key, value) in mapping {
                let key = match key {
                    Value::String(text) => text,
                    Value::Bool(flag) => flag.to_string(),
                    Value::Number(number) => number.to_string(),
                    other => {
                        return Err(ConfigError::malformed(
                            location,
                            format!("mapping keys must be scalars, found {other:?}"),
                        ))
                    }
                };
                map.insert(key, convert(value, location)?);
            }
            RawValue::Map(map)
        }
        Value::Tagged(tagged) => convert(tagged.value, location)?,
    };
    Ok(raw)
}

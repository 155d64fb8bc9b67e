//! Environment variable source.

use std::sync::Arc;

use crate::environment::{EnvironmentReader, ProcessEnvironment};
use crate::error::{ConfigError, ConfigResult};
use crate::raw::{RawMap, RawValue};
use crate::source::{ConfigurationSource, ENVIRONMENT_VARIABLE_PRIORITY};

/// Reads every environment variable starting with a prefix.
///
/// The prefix is stripped and the remainder lowercased verbatim, so with
/// prefix `MYAPP_` the variable `MYAPP_PORT` becomes key `port`. In
/// hierarchical mode underscores in the remainder separate nested keys:
/// `MYAPP_SERVER_PORT` becomes `{server: {port}}`.
///
/// Two variables whose remainders differ only in case (`MYAPP_Port` and
/// `MYAPP_PORT`) make the source malformed.
#[derive(Debug, Clone)]
pub struct EnvironmentVariableSource {
    prefix: String,
    reader: Arc<dyn EnvironmentReader>,
    hierarchical: bool,
}

impl EnvironmentVariableSource {
    /// Read from the real process environment.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::with_reader(prefix, Arc::new(ProcessEnvironment))
    }

    /// Read from an injected reader.
    pub fn with_reader(prefix: impl Into<String>, reader: Arc<dyn EnvironmentReader>) -> Self {
        Self {
            prefix: prefix.into(),
            reader,
            hierarchical: false,
        }
    }

    /// Interpret underscores in variable names as nesting separators.
    #[must_use]
    pub fn hierarchical(mut self, enabled: bool) -> Self {
        self.hierarchical = enabled;
        self
    }

    /// The variable name prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether underscores produce nested keys.
    pub fn is_hierarchical(&self) -> bool {
        self.hierarchical
    }
}

impl ConfigurationSource for EnvironmentVariableSource {
    fn is_available(&self) -> bool {
        self.reader.has_prefix(&self.prefix)
    }

    fn load(&self) -> ConfigResult<Option<RawValue>> {
        let mut flat = RawMap::new();
        for (name, value) in self.reader.snapshot() {
            let Some(key) = name.strip_prefix(self.prefix.as_str()) else {
                continue;
            };
            if key.is_empty() {
                continue;
            }
            if flat.insert(key.to_lowercase(), value).is_some() {
                return Err(ConfigError::malformed(
                    format!("{} variable `{name}`", self.description()),
                    "name collides with another variable after lowercasing",
                ));
            }
        }

        let map = if self.hierarchical {
            flat.nest('_').map_err(|e| match e {
                ConfigError::Malformed { location, reason } => {
                    ConfigError::malformed(format!("{} {location}", self.description()), reason)
                }
                other => other,
            })?
        } else {
            flat
        };

        Ok((!map.is_empty()).then_some(RawValue::Map(map)))
    }

    fn description(&self) -> String {
        format!("Environment Variables (prefix: {})", self.prefix)
    }

    fn priority(&self) -> i32 {
        ENVIRONMENT_VARIABLE_PRIORITY
    }
}

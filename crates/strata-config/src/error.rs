//! Configuration error types.
//!
//! Every failure that crosses the [`ConfigurationLoader::load`] boundary is a
//! [`ConfigError`]. Variants carry the description of the offending source and
//! keep the underlying cause reachable through [`std::error::Error::source`].
//!
//! [`ConfigurationLoader::load`]: crate::ConfigurationLoader::load

use std::fmt;

use thiserror::Error;

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Classification of configuration errors.
///
/// | Category | Recoverable | Raised by |
/// |---|---|---|
/// | `SourceLoad` | yes | a source that exists but cannot be read or parsed |
/// | `Transform` | no | raw data whose shape does not fit the target type |
/// | `Validation` | no | a well-formed configuration violating a business rule |
/// | `NoConfiguration` | no | no source produced data and no default is available |
/// | `Usage` | no | a loader that was assembled incorrectly |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// I/O failure or malformed raw content in a source.
    SourceLoad,
    /// Raw data could not be converted to the target type.
    Transform,
    /// The typed configuration failed validation.
    Validation,
    /// Nothing produced a configuration.
    NoConfiguration,
    /// The loader was built with missing or inconsistent settings.
    Usage,
}

impl ErrorCategory {
    /// Whether the loader keeps consulting lower-priority sources after an
    /// error of this category.
    pub fn is_recoverable(self) -> bool {
        matches!(self, Self::SourceLoad)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SourceLoad => "source_load",
            Self::Transform => "transform",
            Self::Validation => "validation",
            Self::NoConfiguration => "no_configuration",
            Self::Usage => "usage",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during configuration resolution.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read a configuration resource.
    #[error("failed to read configuration from {location}")]
    ReadError {
        /// File path or classpath resource that failed.
        location: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// YAML parsing error.
    #[error("failed to parse YAML configuration from {location}")]
    YamlError {
        /// File path or classpath resource that failed.
        location: String,
        /// Underlying error.
        #[source]
        source: serde_yaml::Error,
    },

    /// Properties parsing error.
    #[error("failed to parse properties configuration from {location}")]
    PropertiesError {
        /// File path or classpath resource that failed.
        location: String,
        /// Underlying error.
        #[source]
        source: java_properties::PropertiesError,
    },

    /// Raw content that parsed but cannot be represented as raw configuration.
    #[error("malformed configuration in {location}: {reason}")]
    Malformed {
        /// Source or resource containing the content.
        location: String,
        /// Explanation of the problem.
        reason: String,
    },

    /// Raw data could not be deserialized into the requested type.
    #[error("failed to decode configuration: {0}")]
    Decode(String),

    /// Invalid configuration value.
    #[error("invalid configuration value for {field}: {reason}")]
    InvalidValue {
        /// The field with the invalid value.
        field: String,
        /// Explanation of why the value is invalid.
        reason: String,
    },

    /// Missing required field.
    #[error("missing required configuration field: {field}")]
    MissingField {
        /// The missing field name.
        field: String,
    },

    /// Business-rule violation reported by a validator.
    #[error("configuration validation failed: {0}")]
    ValidationError(String),

    /// The transform step rejected the data produced by a source.
    #[error("failed to transform configuration from {origin}")]
    Transform {
        /// Description of the source whose data was rejected.
        origin: String,
        /// Why the transform failed.
        #[source]
        source: Box<ConfigError>,
    },

    /// A transformed configuration failed validation.
    #[error("invalid configuration from {origin}")]
    Validation {
        /// Description of the source that produced the configuration.
        origin: String,
        /// Why validation failed.
        #[source]
        source: Box<ConfigError>,
    },

    /// No source produced data and the loader has no default.
    #[error("no configuration source produced data and no default configuration is available")]
    NoConfiguration,

    /// The loader itself is misconfigured.
    #[error("invalid loader setup: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },
}

impl ConfigError {
    /// Create a new read error.
    pub fn read_error(location: impl Into<String>, source: std::io::Error) -> Self {
        Self::ReadError {
            location: location.into(),
            source,
        }
    }

    /// Create a new malformed-content error.
    pub fn malformed(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Create a new invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a new missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create a new validation error.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// Wrap a transform failure with the description of its source.
    pub fn transform(origin: impl Into<String>, cause: ConfigError) -> Self {
        Self::Transform {
            origin: origin.into(),
            source: Box::new(cause),
        }
    }

    /// Wrap a validation failure with the description of its source.
    pub fn validation(origin: impl Into<String>, cause: ConfigError) -> Self {
        Self::Validation {
            origin: origin.into(),
            source: Box::new(cause),
        }
    }

    /// Create a new loader setup error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ReadError { .. }
            | Self::YamlError { .. }
            | Self::PropertiesError { .. }
            | Self::Malformed { .. } => ErrorCategory::SourceLoad,
            Self::Decode(_) | Self::MissingField { .. } | Self::Transform { .. } => {
                ErrorCategory::Transform
            }
            Self::InvalidValue { .. } | Self::ValidationError(_) | Self::Validation { .. } => {
                ErrorCategory::Validation
            }
            Self::NoConfiguration => ErrorCategory::NoConfiguration,
            Self::InvalidConfig { .. } => ErrorCategory::Usage,
        }
    }

    /// Description of the source that caused a transform or validation failure.
    pub fn origin(&self) -> Option<&str> {
        match self {
            Self::Transform { origin, .. } | Self::Validation { origin, .. } => Some(origin),
            _ => None,
        }
    }
}

impl serde::de::Error for ConfigError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self::Decode(msg.to_string())
    }
}

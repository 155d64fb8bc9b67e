//! Prioritized configuration resolution for Strata.
//!
//! This crate resolves one validated configuration object from an ordered
//! list of sources:
//! - System properties (in-process `key=value` registry)
//! - Environment variables
//! - YAML files, from the filesystem or the classpath
//! - Java-style properties files
//! - A programmatic default
//!
//! # Overview
//!
//! Every source implements [`ConfigurationSource`] and produces a
//! [`RawValue`] tree. The [`ConfigurationLoader`] consults sources in
//! descending priority order; the first one that is available and yields data
//! is transformed into the target type and validated. If no source yields
//! data, the default is used.
//!
//! | Source | Priority |
//! |---|---|
//! | [`SystemPropertySource`] | 1000 |
//! | [`EnvironmentVariableSource`] | 900 |
//! | [`YamlSource`] | 500 unless overridden |
//! | [`PropertiesSource`] | 400 unless overridden |
//! | default | always last |
//!
//! Sources are alternatives, not layers: values are never merged across
//! sources.
//!
//! # Example
//!
//! ```no_run
//! use serde::Deserialize;
//! use strata_config::{ConfigurationLoader, PropertiesSource, YamlSource};
//!
//! #[derive(Debug, Deserialize)]
//! struct ServerConfig {
//!     port: u16,
//!     #[serde(default)]
//!     hosts: Vec<String>,
//! }
//!
//! # fn main() -> Result<(), strata_config::ConfigError> {
//! let mut loader = ConfigurationLoader::<ServerConfig>::builder()
//!     .name("server")
//!     .source(YamlSource::from_file("/etc/server/server.yaml"))
//!     .source(PropertiesSource::from_classpath("server.properties"))
//!     .deserialize()
//!     .create_default(|| ServerConfig {
//!         port: 8080,
//!         hosts: Vec::new(),
//!     })
//!     .build()?;
//!
//! let config = loader.load()?;
//! println!(
//!     "listening on {} (from {:?})",
//!     config.port,
//!     loader.configuration_source_used()
//! );
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! A source that fails to load is logged and skipped. A source whose data
//! fails to transform or validate aborts the load by default; see
//! [`FailurePolicy`].

#![warn(missing_docs)]

mod environment;
mod error;
mod loader;
mod raw;
mod source;
pub mod sources;

pub use environment::{
    DotenvEnvironment, EnvironmentReader, ProcessEnvironment, StaticEnvironment, SystemProperties,
};
pub use error::{ConfigError, ConfigResult, ErrorCategory};
pub use loader::{
    ConfigurationLoader, ConfigurationLoaderBuilder, FailurePolicy, DEFAULT_SOURCE_DESCRIPTION,
};
pub use raw::{RawMap, RawValue};
pub use source::{
    ConfigurationSource, ENVIRONMENT_VARIABLE_PRIORITY, PROPERTIES_PRIORITY,
    SYSTEM_PROPERTY_PRIORITY, YAML_PRIORITY,
};
pub use sources::{
    Classpath, EnvironmentVariableSource, PropertiesSource, SystemPropertySource, YamlSource,
};

//! The configuration source contract.

use std::fmt;

use crate::error::ConfigResult;
use crate::raw::RawValue;

/// Priority of the system property source.
pub const SYSTEM_PROPERTY_PRIORITY: i32 = 1000;

/// Priority of the environment variable source.
pub const ENVIRONMENT_VARIABLE_PRIORITY: i32 = 900;

/// Default priority of YAML file sources.
pub const YAML_PRIORITY: i32 = 500;

/// Default priority of properties file sources.
pub const PROPERTIES_PRIORITY: i32 = 400;

/// A named, prioritized strategy for producing raw configuration data.
///
/// Sources are immutable once constructed. The loader consults them in
/// descending [`priority`](ConfigurationSource::priority) order and stops at
/// the first one that yields data.
///
/// # Contract
///
/// - [`is_available`](ConfigurationSource::is_available) is a cheap probe. It
///   never parses and never fails.
/// - [`load`](ConfigurationSource::load) returns `Ok(None)` when there is
///   nothing to load (including a resource that vanished after the probe),
///   and an error only when the source exists but is broken.
pub trait ConfigurationSource: fmt::Debug + Send + Sync {
    /// Whether the source looks usable, without reading it.
    fn is_available(&self) -> bool;

    /// Read and parse the source.
    fn load(&self) -> ConfigResult<Option<RawValue>>;

    /// Human-readable identity used in logs and diagnostics.
    fn description(&self) -> String;

    /// Static priority; higher values are consulted first.
    fn priority(&self) -> i32;
}

impl<S: ConfigurationSource + ?Sized> ConfigurationSource for Box<S> {
    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn load(&self) -> ConfigResult<Option<RawValue>> {
        (**self).load()
    }

    fn description(&self) -> String {
        (**self).description()
    }

    fn priority(&self) -> i32 {
        (**self).priority()
    }
}

impl<S: ConfigurationSource + ?Sized> ConfigurationSource for std::sync::Arc<S> {
    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn load(&self) -> ConfigResult<Option<RawValue>> {
        (**self).load()
    }

    fn description(&self) -> String {
        (**self).description()
    }

    fn priority(&self) -> i32 {
        (**self).priority()
    }
}

//! Prioritized configuration resolution.
//!
//! This module provides the [`ConfigurationLoader`], which consults its
//! sources in descending priority order and returns the first configuration
//! that transforms and validates, falling back to a default.

use std::any::type_name;
use std::cmp::Reverse;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::environment::{EnvironmentReader, ProcessEnvironment, SystemProperties};
use crate::error::{ConfigError, ConfigResult};
use crate::raw::RawValue;
use crate::source::ConfigurationSource;
use crate::sources::{EnvironmentVariableSource, SystemPropertySource};

/// Description reported when the default configuration was used.
pub const DEFAULT_SOURCE_DESCRIPTION: &str = "Default Configuration";

type TransformFn<T> = Box<dyn Fn(RawValue) -> ConfigResult<T> + Send + Sync>;
type ValidateFn<T> = Box<dyn Fn(&T) -> ConfigResult<()> + Send + Sync>;
type DefaultFn<T> = Box<dyn Fn() -> T + Send + Sync>;

/// What to do when a source yields data that fails to transform or validate.
///
/// Load failures (I/O errors, malformed files) always fall through to the
/// next source. This policy only governs data that was read successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort the whole resolution, even if a lower-priority source could
    /// have produced a valid configuration.
    #[default]
    Abort,
    /// Log the failure and keep consulting lower-priority sources.
    ///
    /// The default configuration is still validated fatally.
    FallThrough,
}

struct CachedState<T> {
    value: Option<Arc<T>>,
    origin: Option<String>,
}

impl<T> Default for CachedState<T> {
    fn default() -> Self {
        Self {
            value: None,
            origin: None,
        }
    }
}

/// Resolves one validated configuration from prioritized sources.
///
/// Resolution order is system properties (1000), environment variables
/// (900), caller-supplied sources by descending priority (registration order
/// breaks ties), then the default configuration. The first source that is
/// available and yields data wins.
///
/// The result is cached until [`clear_cache`](Self::clear_cache) is called.
/// Loading takes `&mut self`; share a loader between threads behind a mutex,
/// or resolve once at startup and share the returned `Arc<T>`.
///
/// # Example
///
/// ```
/// use serde::Deserialize;
/// use strata_config::{ConfigError, ConfigurationLoader, StaticEnvironment};
///
/// #[derive(Debug, Deserialize)]
/// struct AppConfig {
///     port: u16,
/// }
///
/// # fn main() -> Result<(), ConfigError> {
/// let env = StaticEnvironment::new().with("MYAPP_PORT", "9090");
///
/// let mut loader = ConfigurationLoader::<AppConfig>::builder()
///     .name("myapp")
///     .environment(env)
///     .system_properties(StaticEnvironment::new())
///     .deserialize()
///     .validate(|config| {
///         if config.port == 0 {
///             return Err(ConfigError::invalid_value("port", "must be non-zero"));
///         }
///         Ok(())
///     })
///     .create_default(|| AppConfig { port: 8080 })
///     .build()?;
///
/// let config = loader.load()?;
/// assert_eq!(config.port, 9090);
/// assert_eq!(
///     loader.configuration_source_used(),
///     Some("Environment Variables (prefix: MYAPP_)")
/// );
/// # Ok(())
/// # }
/// ```
pub struct ConfigurationLoader<T> {
    sources: Vec<Box<dyn ConfigurationSource>>,
    transform: TransformFn<T>,
    validate: ValidateFn<T>,
    create_default: Option<DefaultFn<T>>,
    policy: FailurePolicy,
    cache: CachedState<T>,
}

impl<T> ConfigurationLoader<T> {
    /// Create a new loader builder.
    pub fn builder() -> ConfigurationLoaderBuilder<T> {
        ConfigurationLoaderBuilder::new()
    }

    /// Resolve the configuration, or return the cached one.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - the first source yielding data cannot be transformed
    ///   ([`ConfigError::Transform`])
    /// - the transformed configuration fails validation
    ///   ([`ConfigError::Validation`])
    /// - no source yields data and there is no default
    ///   ([`ConfigError::NoConfiguration`])
    ///
    /// Under [`FailurePolicy::FallThrough`] the first two only abort for the
    /// default configuration.
    pub fn load(&mut self) -> ConfigResult<Arc<T>> {
        if let Some(value) = &self.cache.value {
            debug!(source = ?self.cache.origin, "Returning cached configuration");
            return Ok(Arc::clone(value));
        }

        let (value, origin) = self.resolve()?;
        info!(source = %origin, "Configuration resolved");

        let value = Arc::new(value);
        self.cache = CachedState {
            value: Some(Arc::clone(&value)),
            origin: Some(origin),
        };
        Ok(value)
    }

    /// Forget the cached configuration. The next [`load`](Self::load)
    /// consults the sources again.
    pub fn clear_cache(&mut self) {
        debug!("Configuration cache cleared");
        self.cache = CachedState::default();
    }

    /// Whether a configuration is cached.
    pub fn is_loaded(&self) -> bool {
        self.cache.value.is_some()
    }

    /// Whether a load could produce something: any source is available or a
    /// default exists. Never reads or transforms a source.
    pub fn is_configuration_available(&self) -> bool {
        self.create_default.is_some() || self.sources.iter().any(|s| s.is_available())
    }

    /// Description of the source behind the cached configuration.
    ///
    /// Returns [`DEFAULT_SOURCE_DESCRIPTION`] when the default was used, and
    /// `None` when nothing is cached.
    pub fn configuration_source_used(&self) -> Option<&str> {
        self.cache.origin.as_deref()
    }

    /// Descriptions of all sources in consultation order.
    pub fn source_descriptions(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.description()).collect()
    }

    /// The transform/validation failure policy.
    pub fn failure_policy(&self) -> FailurePolicy {
        self.policy
    }

    fn resolve(&self) -> ConfigResult<(T, String)> {
        for source in &self.sources {
            let description = source.description();

            if !source.is_available() {
                debug!(source = %description, "Configuration source unavailable");
                continue;
            }

            let raw = match source.load() {
                Ok(Some(raw)) => raw,
                Ok(None) => {
                    debug!(source = %description, "Configuration source had nothing to load");
                    continue;
                }
                Err(e) => {
                    warn!(
                        source = %description,
                        priority = source.priority(),
                        error = %e,
                        "Failed to load configuration source, trying next"
                    );
                    continue;
                }
            };

            match self.accept(raw, &description) {
                Ok(config) => return Ok((config, description)),
                Err(e) if self.policy == FailurePolicy::FallThrough => {
                    warn!(
                        source = %description,
                        error = %e,
                        "Rejected configuration source, trying next"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        let Some(create_default) = &self.create_default else {
            return Err(ConfigError::NoConfiguration);
        };

        debug!("No configuration source produced data, using default");
        let config = create_default();
        (self.validate)(&config)
            .map_err(|e| ConfigError::validation(DEFAULT_SOURCE_DESCRIPTION, e))?;
        Ok((config, DEFAULT_SOURCE_DESCRIPTION.to_string()))
    }

    fn accept(&self, raw: RawValue, description: &str) -> ConfigResult<T> {
        let config = (self.transform)(raw).map_err(|e| ConfigError::transform(description, e))?;
        (self.validate)(&config).map_err(|e| ConfigError::validation(description, e))?;
        Ok(config)
    }
}

impl<T> fmt::Debug for ConfigurationLoader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationLoader")
            .field("sources", &self.sources)
            .field("has_default", &self.create_default.is_some())
            .field("policy", &self.policy)
            .field("loaded_from", &self.cache.origin)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ConfigurationLoader`].
///
/// Only a transform is required. Without explicit prefixes, the system
/// property prefix is `lowercase(name) + "."` and the environment prefix is
/// `UPPERCASE(name) + "_"`, where `name` defaults to the simple name of `T`.
pub struct ConfigurationLoaderBuilder<T> {
    name: Option<String>,
    system_property_prefix: Option<String>,
    env_prefix: Option<String>,
    system_properties: Arc<dyn EnvironmentReader>,
    environment: Arc<dyn EnvironmentReader>,
    hierarchical_env: bool,
    sources: Vec<Box<dyn ConfigurationSource>>,
    transform: Option<TransformFn<T>>,
    validate: Option<ValidateFn<T>>,
    create_default: Option<DefaultFn<T>>,
    policy: FailurePolicy,
}

impl<T> Default for ConfigurationLoaderBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ConfigurationLoaderBuilder<T> {
    /// Create a builder reading the real process environment and the global
    /// [`SystemProperties`] registry.
    pub fn new() -> Self {
        Self {
            name: None,
            system_property_prefix: None,
            env_prefix: None,
            system_properties: Arc::new(SystemProperties),
            environment: Arc::new(ProcessEnvironment),
            hierarchical_env: false,
            sources: Vec::new(),
            transform: None,
            validate: None,
            create_default: None,
            policy: FailurePolicy::default(),
        }
    }

    /// Name used to derive both default prefixes.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Prefix for system property names, e.g. `myapp.`.
    #[must_use]
    pub fn system_property_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.system_property_prefix = Some(prefix.into());
        self
    }

    /// Prefix for environment variable names, e.g. `MYAPP_`.
    #[must_use]
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Reader backing the system property source.
    #[must_use]
    pub fn system_properties(mut self, reader: impl EnvironmentReader + 'static) -> Self {
        self.system_properties = Arc::new(reader);
        self
    }

    /// Reader backing the environment variable source.
    #[must_use]
    pub fn environment(mut self, reader: impl EnvironmentReader + 'static) -> Self {
        self.environment = Arc::new(reader);
        self
    }

    /// Nest environment variables on underscores.
    #[must_use]
    pub fn hierarchical_env(mut self, enabled: bool) -> Self {
        self.hierarchical_env = enabled;
        self
    }

    /// Add a caller-supplied source.
    #[must_use]
    pub fn source(mut self, source: impl ConfigurationSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Add several boxed sources, keeping their order for priority ties.
    #[must_use]
    pub fn sources(mut self, sources: impl IntoIterator<Item = Box<dyn ConfigurationSource>>) -> Self {
        self.sources.extend(sources);
        self
    }

    /// Conversion from raw data to `T`.
    #[must_use]
    pub fn transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(RawValue) -> ConfigResult<T> + Send + Sync + 'static,
    {
        self.transform = Some(Box::new(transform));
        self
    }

    /// Business-rule check run on every candidate. Defaults to accepting
    /// everything.
    #[must_use]
    pub fn validate<F>(mut self, validate: F) -> Self
    where
        F: Fn(&T) -> ConfigResult<()> + Send + Sync + 'static,
    {
        self.validate = Some(Box::new(validate));
        self
    }

    /// Configuration used when no source yields data.
    #[must_use]
    pub fn create_default<F>(mut self, create_default: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.create_default = Some(Box::new(create_default));
        self
    }

    /// Policy for transform and validation failures.
    #[must_use]
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Assemble the loader.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConfig`] if no transform was configured
    /// or a prefix is empty.
    pub fn build(self) -> ConfigResult<ConfigurationLoader<T>> {
        let transform = self.transform.ok_or_else(|| {
            ConfigError::invalid_config("no transform configured; call `transform` or `deserialize`")
        })?;

        let name = self.name.unwrap_or_else(simple_type_name::<T>);
        let system_property_prefix = self
            .system_property_prefix
            .unwrap_or_else(|| format!("{}.", name.to_lowercase()));
        let env_prefix = self
            .env_prefix
            .unwrap_or_else(|| format!("{}_", name.to_uppercase()));

        if system_property_prefix.is_empty() || env_prefix.is_empty() {
            return Err(ConfigError::invalid_config("source prefixes must not be empty"));
        }

        let mut sources: Vec<Box<dyn ConfigurationSource>> = Vec::with_capacity(self.sources.len() + 2);
        sources.push(Box::new(SystemPropertySource::with_reader(
            system_property_prefix,
            self.system_properties,
        )));
        sources.push(Box::new(
            EnvironmentVariableSource::with_reader(env_prefix, self.environment)
                .hierarchical(self.hierarchical_env),
        ));
        sources.extend(self.sources);
        sources.sort_by_key(|source| Reverse(source.priority()));

        debug!(
            sources = ?sources.iter().map(|s| s.description()).collect::<Vec<_>>(),
            "Configuration loader built"
        );

        Ok(ConfigurationLoader {
            sources,
            transform,
            validate: self.validate.unwrap_or_else(|| Box::new(|_| Ok(()))),
            create_default: self.create_default,
            policy: self.policy,
            cache: CachedState::default(),
        })
    }
}

impl<T: DeserializeOwned + 'static> ConfigurationLoaderBuilder<T> {
    /// Use serde to transform raw data, see [`RawValue::deserialize`].
    #[must_use]
    pub fn deserialize(self) -> Self {
        self.transform(RawValue::deserialize::<T>)
    }
}

impl<T> fmt::Debug for ConfigurationLoaderBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationLoaderBuilder")
            .field("name", &self.name)
            .field("system_property_prefix", &self.system_property_prefix)
            .field("env_prefix", &self.env_prefix)
            .field("sources", &self.sources)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

// `my_crate::config::AppConfig<String>` -> `AppConfig`
fn simple_type_name<T>() -> String {
    let full = type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

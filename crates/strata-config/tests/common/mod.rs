//! Shared fixtures for loader integration tests.

#![allow(dead_code)]

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Deserialize;
use strata_config::{
    ConfigError, ConfigResult, ConfigurationLoader, ConfigurationLoaderBuilder,
    ConfigurationSource, RawMap, RawValue, StaticEnvironment,
};

/// Configuration type used across the loader tests.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    pub port: u16,
    #[serde(default)]
    pub name: Option<String>,
}

impl AppConfig {
    pub fn new(port: u16) -> Self {
        Self { port, name: None }
    }
}

/// Rejects port 0.
pub fn validate(config: &AppConfig) -> ConfigResult<()> {
    if config.port == 0 {
        return Err(ConfigError::invalid_value("port", "must be non-zero"));
    }
    Ok(())
}

type LoadFn = Box<dyn Fn() -> ConfigResult<Option<RawValue>> + Send + Sync>;

/// A source that counts how often it is probed and loaded.
pub struct MockSource {
    description: String,
    priority: i32,
    available: bool,
    load: LoadFn,
    availability_checks: AtomicUsize,
    loads: AtomicUsize,
}

impl MockSource {
    fn new<F>(description: &str, priority: i32, available: bool, load: F) -> Arc<Self>
    where
        F: Fn() -> ConfigResult<Option<RawValue>> + Send + Sync + 'static,
    {
        Arc::new(Self {
            description: description.to_string(),
            priority,
            available,
            load: Box::new(load),
            availability_checks: AtomicUsize::new(0),
            loads: AtomicUsize::new(0),
        })
    }

    /// An available source yielding `{port: <port>}`.
    pub fn port(description: &str, priority: i32, port: &str) -> Arc<Self> {
        let port = port.to_string();
        Self::new(
            description,
            priority,
            true,
            move || Ok(Some(raw([("port", port.as_str())]))),
        )
    }

    /// An available source yielding arbitrary data.
    pub fn data(description: &str, priority: i32, data: RawValue) -> Arc<Self> {
        Self::new(description, priority, true, move || Ok(Some(data.clone())))
    }

    /// A source that reports itself unavailable.
    pub fn unavailable(description: &str, priority: i32) -> Arc<Self> {
        Self::new(
            description,
            priority,
            false,
            || panic!("unavailable source must not be loaded"),
        )
    }

    /// An available source that yields nothing.
    pub fn empty(description: &str, priority: i32) -> Arc<Self> {
        Self::new(description, priority, true, || Ok(None))
    }

    /// An available source whose read fails.
    pub fn broken(description: &str, priority: i32) -> Arc<Self> {
        let location = description.to_string();
        Self::new(
            description,
            priority,
            true,
            move || {
                Err(ConfigError::read_error(
                    location.clone(),
                    std::io::Error::new(std::io::ErrorKind::NotFound, "file vanished"),
                ))
            },
        )
    }

    pub fn availability_checks(&self) -> usize {
        self.availability_checks.load(Ordering::SeqCst)
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for MockSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockSource")
            .field("description", &self.description)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

impl ConfigurationSource for MockSource {
    fn is_available(&self) -> bool {
        self.availability_checks.fetch_add(1, Ordering::SeqCst);
        self.available
    }

    fn load(&self) -> ConfigResult<Option<RawValue>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        (self.load)()
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// Build a flat raw map.
pub fn raw<const N: usize>(entries: [(&str, &str); N]) -> RawValue {
    RawValue::Map(RawMap::from_iter(entries))
}

/// A builder isolated from the real process environment, using the
/// `myapp.` / `MYAPP_` prefixes.
pub fn builder(
    properties: &StaticEnvironment,
    env: &StaticEnvironment,
) -> ConfigurationLoaderBuilder<AppConfig> {
    ConfigurationLoader::<AppConfig>::builder()
        .name("myapp")
        .system_properties(properties.clone())
        .environment(env.clone())
        .deserialize()
        .validate(validate)
}

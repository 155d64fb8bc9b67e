//! Loader wiring for the agent.
//!
//! Sources, highest priority first:
//!
//! | Source | Priority |
//! |---|---|
//! | system properties `strata.*` | 1000 |
//! | environment `STRATA_*` | 900 |
//! | `--config` YAML file | 600 |
//! | classpath `strata.yml`, `strata.yaml`, `application.yml`, `application.yaml` | 500, 490, 480, 470 |
//! | classpath `strata.properties` | 400 |
//! | build output directories | default |
//!
//! Classpath YAML resources only contribute their `strata` section, so a
//! shared `application.yml` without one is passed over.

use std::path::PathBuf;

use serde::Serialize;
use strata_config::{
    Classpath, ConfigurationLoader, ConfigurationLoaderBuilder, FailurePolicy, PropertiesSource,
    YamlSource, PROPERTIES_PRIORITY,
};
use tracing::info;

use crate::error::AgentResult;
use crate::watch::{self, WatchConfiguration};

/// System property prefix.
pub const SYSTEM_PROPERTY_PREFIX: &str = "strata.";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "STRATA_";

/// Priority of an explicitly given configuration file.
pub const CONFIG_FILE_PRIORITY: i32 = 600;

/// Classpath YAML resources and their priorities, in lookup order.
///
/// Each is scoped to [`SYSTEM_PROPERTY_PREFIX`].
pub const YAML_RESOURCES: [(&str, i32); 4] = [
    ("strata.yml", 500),
    ("strata.yaml", 490),
    ("application.yml", 480),
    ("application.yaml", 470),
];

/// Classpath properties resource.
pub const PROPERTIES_RESOURCE: &str = "strata.properties";

/// How the agent locates its configuration.
#[derive(Debug, Clone, Default)]
pub struct BootstrapOptions {
    /// Explicit YAML file, consulted above the classpath resources.
    pub config_file: Option<PathBuf>,
    /// Where classpath resources are looked up.
    pub classpath: Classpath,
    /// Policy for sources whose data is rejected.
    pub failure_policy: FailurePolicy,
}

/// A resolved configuration and where it came from.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    /// Description of the source used.
    pub source: String,
    /// The configuration.
    pub configuration: WatchConfiguration,
}

impl Resolution {
    /// Pretty-printed JSON rendering.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::Render` if serialization fails.
    pub fn to_json(&self) -> AgentResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Builder with every agent source registered.
///
/// The caller may still replace the system property and environment readers
/// before building.
pub fn loader_builder(options: &BootstrapOptions) -> ConfigurationLoaderBuilder<WatchConfiguration> {
    let mut builder = ConfigurationLoader::builder()
        .system_property_prefix(SYSTEM_PROPERTY_PREFIX)
        .env_prefix(ENV_PREFIX)
        .transform(watch::transform)
        .validate(WatchConfiguration::validate)
        .create_default(WatchConfiguration::create_default)
        .failure_policy(options.failure_policy);

    if let Some(path) = &options.config_file {
        builder = builder.source(YamlSource::from_file(path).with_priority(CONFIG_FILE_PRIORITY));
    }

    for (resource, priority) in YAML_RESOURCES {
        builder = builder.source(
            YamlSource::from_classpath_in(resource, options.classpath.clone())
                .with_priority(priority)
                .with_prefix(SYSTEM_PROPERTY_PREFIX),
        );
    }

    builder.source(
        PropertiesSource::from_classpath_in(PROPERTIES_RESOURCE, options.classpath.clone())
            .with_priority(PROPERTIES_PRIORITY),
    )
}

/// Resolve with a prepared builder.
///
/// # Errors
///
/// Returns an error if the loader cannot be built or resolution fails.
pub fn resolve_with(builder: ConfigurationLoaderBuilder<WatchConfiguration>) -> AgentResult<Resolution> {
    let mut loader = builder.build()?;
    let configuration = loader.load()?;
    let source = loader
        .configuration_source_used()
        .unwrap_or_default()
        .to_string();

    info!(
        source = %source,
        port = configuration.port,
        folders = configuration.folders.len(),
        "Agent configuration loaded"
    );

    Ok(Resolution {
        source,
        configuration: (*configuration).clone(),
    })
}

/// Resolve from the real process environment and system properties.
///
/// # Errors
///
/// Returns an error if resolution fails.
pub fn resolve(options: &BootstrapOptions) -> AgentResult<Resolution> {
    resolve_with(loader_builder(options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watch::FolderWatch;
    use strata_config::{StaticEnvironment, DEFAULT_SOURCE_DESCRIPTION};

    fn isolated(options: &BootstrapOptions) -> ConfigurationLoaderBuilder<WatchConfiguration> {
        loader_builder(options)
            .system_properties(StaticEnvironment::new())
            .environment(StaticEnvironment::new())
    }

    #[test]
    fn test_source_order() {
        let options = BootstrapOptions {
            config_file: Some(PathBuf::from("/etc/strata/agent.yaml")),
            ..Default::default()
        };
        let loader = isolated(&options).build().unwrap();
        assert_eq!(
            loader.source_descriptions(),
            vec![
                "System Properties (prefix: strata.)".to_string(),
                "Environment Variables (prefix: STRATA_)".to_string(),
                "YAML File (file system): /etc/strata/agent.yaml".to_string(),
                "YAML File (classpath): strata.yml".to_string(),
                "YAML File (classpath): strata.yaml".to_string(),
                "YAML File (classpath): application.yml".to_string(),
                "YAML File (classpath): application.yaml".to_string(),
                "Properties File (classpath): strata.properties".to_string(),
            ]
        );
    }

    #[test]
    fn test_classpath_yaml() {
        let classpath = Classpath::new().with_embedded(
            "application.yaml",
            b"strata:\n  port: 7070\n  watch:\n    - path: out\n",
        );
        let options = BootstrapOptions {
            classpath,
            ..Default::default()
        };

        let resolution = resolve_with(isolated(&options)).unwrap();
        assert_eq!(resolution.source, "YAML File (classpath): application.yaml");
        assert_eq!(resolution.configuration.port, 7070);
        assert_eq!(resolution.configuration.folders, vec![FolderWatch::new("out")]);
    }

    #[test]
    fn test_classpath_yaml_without_section_is_passed_over() {
        let classpath = Classpath::new()
            .with_embedded("application.yml", b"spring:\n  datasource: x\n")
            .with_embedded("application.yaml", b"strata.watch.paths: flat\n");
        let options = BootstrapOptions {
            classpath,
            ..Default::default()
        };

        let resolution = resolve_with(isolated(&options)).unwrap();
        assert_eq!(resolution.source, "YAML File (classpath): application.yaml");
        assert_eq!(resolution.configuration.folders, vec![FolderWatch::new("flat")]);
    }

    #[test]
    fn test_resolution_to_json() {
        let resolution = Resolution {
            source: DEFAULT_SOURCE_DESCRIPTION.to_string(),
            configuration: WatchConfiguration::create_default(),
        };
        let json = resolution.to_json().unwrap();
        assert!(json.contains("\"source\": \"Default Configuration\""));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_environment_beats_files() {
        let classpath = Classpath::new().with_embedded("strata.properties", b"watch.paths=from-file\n");
        let options = BootstrapOptions {
            classpath,
            ..Default::default()
        };
        let env = StaticEnvironment::new().with("STRATA_WATCH_PATHS", "from-env");

        let resolution = resolve_with(isolated(&options).environment(env)).unwrap();
        assert_eq!(resolution.configuration.folders[0].path, PathBuf::from("from-env"));
    }

    #[test]
    fn test_default_when_nothing_configured() {
        let resolution = resolve_with(isolated(&BootstrapOptions::default())).unwrap();
        assert_eq!(resolution.source, DEFAULT_SOURCE_DESCRIPTION);
        assert!(!resolution.configuration.folders.is_empty());
    }

    #[test]
    fn test_invalid_source_aborts() {
        let options = BootstrapOptions::default();
        let properties = StaticEnvironment::new()
            .with("strata.watch.paths", "src")
            .with("strata.port", "0");

        let err = resolve_with(isolated(&options).system_properties(properties)).unwrap_err();
        assert!(err.to_string().contains("System Properties"));
    }

    #[test]
    fn test_fall_through_skips_invalid_source() {
        let options = BootstrapOptions {
            failure_policy: FailurePolicy::FallThrough,
            ..Default::default()
        };
        let properties = StaticEnvironment::new().with("strata.port", "0").with("strata.watch.paths", "src");
        let env = StaticEnvironment::new().with("STRATA_WATCH_PATHS", "lib");

        let resolution = resolve_with(isolated(&options).system_properties(properties).environment(env)).unwrap();
        assert_eq!(resolution.source, "Environment Variables (prefix: STRATA_)");
        assert_eq!(resolution.configuration.folders[0].path, PathBuf::from("lib"));
    }
}

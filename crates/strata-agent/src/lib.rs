//! Strata agent bootstrap.
//!
//! The agent resolves its [`WatchConfiguration`] once at startup with a
//! [`strata_config::ConfigurationLoader`] and refuses to start on any
//! configuration error.
//!
//! # Example Usage
//!
//! ```bash
//! # Resolve from classpath resources in ./config
//! $ strata-agent --classpath ./config
//!
//! # Override the watched folders with a system property
//! $ strata-agent -D strata.watch.paths=target/debug,target/release
//!
//! # Or with an environment variable
//! $ STRATA_WATCH_PATHS=out strata-agent
//! ```

#![warn(missing_docs)]

pub mod bootstrap;
pub mod error;
pub mod logging;
pub mod watch;

pub use bootstrap::{resolve, BootstrapOptions, Resolution};
pub use error::{AgentError, AgentResult};
pub use logging::{init_logging, LogConfig, LogFormat};
pub use watch::{FolderWatch, WatchConfiguration};

/// Agent version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

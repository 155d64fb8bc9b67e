//! Error types for the Strata agent.

use strata_config::ConfigError;
use thiserror::Error;

/// Agent-specific errors.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Configuration could not be resolved.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The tracing subscriber could not be installed.
    #[error("Logging initialization failed: {0}")]
    LoggingInit(String),

    /// The resolved configuration could not be rendered.
    #[error("Failed to render configuration: {0}")]
    Render(#[from] serde_json::Error),
}

/// Result type for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;

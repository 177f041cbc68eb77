//! CLI error type.

use thiserror::Error;

use flowlayer::config::ConfigError;
use flowlayer::lifecycle::FlowError;
use flowlayer::route::RouteError;

/// Errors surfaced to the user by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Flow(#[from] FlowError),

    #[error("Route error: {0}")]
    Route(#[from] RouteError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::Config(err.to_string())
    }
}

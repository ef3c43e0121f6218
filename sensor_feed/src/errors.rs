use shared_utils::env::InvalidEnvVarError;
use thiserror::Error;

use crate::{models::retry_budget::RetryBudgetError, providers::ProviderInitError};

/// The unified error type for the `sensor_feed` crate.
#[derive(Debug, Error)]
pub enum Error {
    /// An error related to configuration values.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The configured endpoint is not an absolute http(s) URL.
    #[error("Invalid endpoint {endpoint:?}: {message}")]
    InvalidEndpoint { endpoint: String, message: String },

    /// The retry budget violates its constraints.
    #[error("Invalid retry budget: {0}")]
    InvalidBudget(#[from] RetryBudgetError),

    /// An environment override could not be parsed.
    #[error(transparent)]
    Env(#[from] InvalidEnvVarError),

    /// The config file is not valid TOML for [`FeedConfig`](crate::config::FeedConfig).
    #[error("Failed to parse config: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// The resolved config could not be rendered back to TOML.
    #[error("Failed to render config: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// The HTTP transport could not be constructed.
    #[error("Provider initialization error: {0}")]
    ProviderInit(#[from] ProviderInitError),

    /// A generic I/O error.
    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

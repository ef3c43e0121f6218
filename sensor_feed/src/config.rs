//! Feed configuration: TOML file, environment overrides and validation.
//!
//! Values are resolved in layers, later ones winning:
//!
//! 1. [`FeedConfig::default`] (the local dashboard endpoint with temperature
//!    and humidity),
//! 2. a TOML file ([`FeedConfig::from_path`]),
//! 3. `SENSOR_FEED_*` environment variables ([`FeedConfig::apply_env`]),
//! 4. whatever the caller sets afterwards (e.g. CLI flags).
//!
//! [`FeedConfig::validate`] runs once all layers are applied.
//!
//! ```toml
//! endpoint = "http://localhost:8000/api/information/"
//! request_timeout_ms = 10000
//!
//! [retry]
//! max_attempts = 3
//! base_delay_ms = 1000
//! max_delay_ms = 30000
//!
//! [[metrics]]
//! name = "temperature"
//! unit = "°C"
//!
//! [[metrics]]
//! name = "humidity"
//! axis = "right"
//! range = { min = 0.0, max = 100.0 }
//! ```

use std::{collections::HashSet, path::Path, time::Duration};

use chrono::NaiveDate;
use indexmap::IndexSet;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use shared_utils::env::{get_env_var_opt, parse_env_var};
use tracing::debug;

use crate::{
    errors::Error,
    models::{metric::MetricSpec, retry_budget::RetryBudget},
    requests::fetch_client::parse_endpoint,
};

/// Endpoint the dashboard reads from when nothing else is configured.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/api/information/";
/// Per-request timeout applied when the config does not set one.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

pub const ENDPOINT_ENV: &str = "SENSOR_FEED_ENDPOINT";
pub const MAX_ATTEMPTS_ENV: &str = "SENSOR_FEED_MAX_ATTEMPTS";
pub const BASE_DELAY_ENV: &str = "SENSOR_FEED_BASE_DELAY_MS";
pub const MAX_DELAY_ENV: &str = "SENSOR_FEED_MAX_DELAY_MS";

/// Everything needed to build an [`AcquisitionMachine`](crate::acquisition::AcquisitionMachine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedConfig {
    /// Absolute http(s) URL returning the JSON record array.
    pub endpoint: String,

    /// Bound on each individual request. `None` leaves requests unbounded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,

    /// Bound on a whole cycle, retries and backoff included.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle_timeout_ms: Option<u64>,

    /// Date given to bare `HH:MM` timestamps. Defaults to the cycle's start date (UTC).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_date: Option<NaiveDate>,

    pub retry: RetryBudget,

    /// Metrics to extract, in display order.
    pub metrics: Vec<MetricSpec>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_ms: Some(DEFAULT_REQUEST_TIMEOUT_MS),
            cycle_timeout_ms: None,
            reference_date: None,
            retry: RetryBudget::default(),
            metrics: vec![MetricSpec::temperature(), MetricSpec::humidity()],
        }
    }
}

impl FeedConfig {
    /// Parses a config from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, Error> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Reads and parses a TOML config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "Loaded feed config");
        Self::from_toml_str(&text)
    }

    /// Resolves defaults, the optional file and the environment, in that order.
    ///
    /// The result is not validated yet, so callers can layer more overrides on
    /// top before calling [`validate`](Self::validate).
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let mut config = match path {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Overrides endpoint and retry settings from `SENSOR_FEED_*` variables.
    ///
    /// Unset or blank variables leave the current value alone.
    pub fn apply_env(&mut self) -> Result<(), Error> {
        if let Some(endpoint) = get_env_var_opt(ENDPOINT_ENV) {
            self.endpoint = endpoint;
        }
        if let Some(max_attempts) = parse_env_var(MAX_ATTEMPTS_ENV)? {
            self.retry.max_attempts = max_attempts;
        }
        if let Some(base_delay_ms) = parse_env_var(BASE_DELAY_ENV)? {
            self.retry.base_delay_ms = base_delay_ms;
        }
        if let Some(max_delay_ms) = parse_env_var(MAX_DELAY_ENV)? {
            self.retry.max_delay_ms = max_delay_ms;
        }
        Ok(())
    }

    /// Checks the endpoint, the retry budget and the metric list.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidEndpoint`] - the endpoint is not an absolute http(s) URL.
    /// * [`Error::InvalidBudget`] - zero attempts, or a cap below the base delay.
    /// * [`Error::Config`] - no metrics, a blank or duplicate metric name, or a zero timeout.
    pub fn validate(&self) -> Result<(), Error> {
        self.endpoint_url()?;
        self.retry.validate()?;

        if self.metrics.is_empty() {
            return Err(Error::Config("at least one metric is required".into()));
        }
        let mut seen = HashSet::new();
        for metric in &self.metrics {
            if metric.name.trim().is_empty() {
                return Err(Error::Config("metric names must not be blank".into()));
            }
            if !seen.insert(metric.name.as_str()) {
                return Err(Error::Config(format!(
                    "metric {:?} is listed more than once",
                    metric.name
                )));
            }
        }

        if self.request_timeout_ms == Some(0) || self.cycle_timeout_ms == Some(0) {
            return Err(Error::Config("timeouts must be greater than zero".into()));
        }
        Ok(())
    }

    pub fn endpoint_url(&self) -> Result<Url, Error> {
        parse_endpoint(&self.endpoint)
    }

    /// Metric names in configured order.
    pub fn metric_names(&self) -> IndexSet<String> {
        self.metrics.iter().map(|m| m.name.clone()).collect()
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    pub fn cycle_timeout(&self) -> Option<Duration> {
        self.cycle_timeout_ms.map(Duration::from_millis)
    }

    /// Renders the config as TOML, the same shape [`from_toml_str`](Self::from_toml_str) reads.
    pub fn to_toml_string(&self) -> Result<String, Error> {
        Ok(toml::to_string(self)?)
    }
}

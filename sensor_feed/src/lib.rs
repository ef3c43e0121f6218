//! Sensor time-series acquisition.
//!
//! The pipeline has three stages:
//!
//! 1. [`requests::fetch_client::FetchClient`] issues a GET against the sensor
//!    endpoint and retries transient failures with bounded exponential backoff.
//! 2. [`transform::normalizer::normalize`] turns the untrusted record array into
//!    time-ordered [`models::point::Series`], one per requested metric.
//! 3. [`acquisition::machine::AcquisitionMachine`] drives both and publishes a
//!    single [`models::state::AcquisitionState`] that renderers observe.
//!
//! [`chart`] and [`io`] adapt finished series for plotting and persistence.

pub mod acquisition;
pub mod chart;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod errors;
pub mod io;
pub mod models;
pub mod providers;
pub mod requests;
pub mod transform;

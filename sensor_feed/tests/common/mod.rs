#![allow(dead_code)]

use std::sync::Arc;

use reqwest::Url;
use sensor_feed::{
    acquisition::{AcquisitionMachine, MachineOptions},
    models::retry_budget::RetryBudget,
    providers::scripted::ScriptedTransport,
    requests::fetch_client::FetchClient,
};

pub use sensor_feed::providers::scripted::{ok, status};

pub const ENDPOINT: &str = "http://localhost:8000/api/information/";

/// Two records: a numeric-string temperature and one without humidity.
pub const SCENARIO_PAYLOAD: &str = r#"[
    {"timestamp": "2025-01-01T00:00:00Z", "temperature": "22.5"},
    {"timestamp": "2025-01-01T01:00:00Z", "temperature": 21.9, "humidity": 60}
]"#;

pub fn machine(
    endpoint: Arc<ScriptedTransport>,
    budget: RetryBudget,
    options: MachineOptions,
) -> AcquisitionMachine<Arc<ScriptedTransport>> {
    let client = FetchClient::new(endpoint, Url::parse(ENDPOINT).unwrap(), budget).unwrap();
    let metrics = ["temperature", "humidity"].into_iter().map(String::from).collect();
    AcquisitionMachine::with_options(client, metrics, options)
}

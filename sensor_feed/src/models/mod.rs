pub mod metric;
pub mod point;
pub mod retry_budget;
pub mod state;

/// A decoded response body, before any normalization.
pub type RawPayload = serde_json::Value;

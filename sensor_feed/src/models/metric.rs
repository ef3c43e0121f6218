use serde::{Deserialize, Serialize};

/// Which y-axis a metric is drawn against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisSide {
    #[default]
    Left,
    Right,
}

/// Fixed bounds for a y-axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

/// A metric to extract from each record, plus how to present it.
///
/// Only `name` takes part in normalization; the rest is carried through to
/// [`ChartDataset`](crate::chart::ChartDataset).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricSpec {
    /// Record field holding the reading (e.g. "temperature").
    pub name: String,

    /// Human-readable legend label. Defaults to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Unit suffix shown next to values (e.g. "°C").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(default)]
    pub axis: AxisSide,

    /// Fixed axis bounds; the axis autoscales when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<AxisRange>,
}

impl MetricSpec {
    /// A spec with no presentation hints, drawn on the left axis.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            unit: None,
            axis: AxisSide::Left,
            range: None,
        }
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Temperature in °C on the left axis.
    pub fn temperature() -> Self {
        Self {
            name: "temperature".into(),
            label: Some("Temperature".into()),
            unit: Some("°C".into()),
            axis: AxisSide::Left,
            range: None,
        }
    }

    /// Relative humidity in percent on the right axis, fixed to 0–100.
    pub fn humidity() -> Self {
        Self {
            name: "humidity".into(),
            label: Some("Humidity".into()),
            unit: Some("%".into()),
            axis: AxisSide::Right,
            range: Some(AxisRange {
                min: 0.0,
                max: 100.0,
            }),
        }
    }
}

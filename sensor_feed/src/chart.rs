//! Chart-ready datasets built from normalized series.
//!
//! Each [`ChartDataset`] carries the points in the `{x, y}` shape a time-scale
//! line chart consumes, plus the legend label, unit and y-axis taken from the
//! matching [`MetricSpec`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{
    metric::{AxisRange, AxisSide, MetricSpec},
    point::Series,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: DateTime<Utc>,
    pub y: f64,
}

/// One line on the chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDataset {
    pub label: String,
    pub metric: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub axis: AxisSide,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<AxisRange>,
    pub points: Vec<ChartPoint>,
}

/// Pairs every series with its spec by metric name.
///
/// Output follows the order of `series`. A series with no matching spec is
/// labelled with its metric name and drawn on the left axis.
pub fn build_datasets(series: &[Series], specs: &[MetricSpec]) -> Vec<ChartDataset> {
    series
        .iter()
        .map(|s| {
            let spec = specs
                .iter()
                .find(|spec| spec.name == s.metric())
                .cloned()
                .unwrap_or_else(|| MetricSpec::named(s.metric()));

            ChartDataset {
                label: spec.label().to_string(),
                metric: spec.name,
                unit: spec.unit,
                axis: spec.axis,
                range: spec.range,
                points: s
                    .points()
                    .iter()
                    .map(|p| ChartPoint {
                        x: p.timestamp,
                        y: p.value,
                    })
                    .collect(),
            }
        })
        .collect()
}

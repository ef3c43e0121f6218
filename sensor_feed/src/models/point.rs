//! Canonical in-memory representation of a normalized sensor series.
//!
//! These types are the output of [`normalize`](crate::transform::normalizer::normalize)
//! and the payload of [`AcquisitionState::Ready`](crate::models::state::AcquisitionState::Ready).

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A single reading of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    /// When the reading was taken (UTC).
    pub timestamp: DateTime<Utc>,

    /// The reading. Always finite.
    pub value: f64,
}

/// One metric's readings, ordered by timestamp.
///
/// Points are sorted non-decreasing by timestamp on construction; points that
/// share a timestamp keep the order they were supplied in. A series is never
/// mutated after it is built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    metric: String,
    points: Vec<Point>,
}

impl Series {
    /// Builds a series, stable-sorting `points` by timestamp.
    pub fn from_points(metric: impl Into<String>, mut points: Vec<Point>) -> Self {
        points.sort_by_key(|p| p.timestamp);
        Self {
            metric: metric.into(),
            points,
        }
    }

    /// The metric this series holds (e.g. "temperature").
    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First and last timestamp, if the series has any points.
    pub fn time_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((self.points.first()?.timestamp, self.points.last()?.timestamp))
    }
}

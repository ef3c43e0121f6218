//! The observable outcome of the latest acquisition cycle.

use std::{fmt, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};

use crate::models::point::Series;

/// Why a cycle ended without a chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The endpoint answered, but no requested metric had a usable point.
    NoData,

    /// Every attempt failed; `message` describes the last failure.
    Fetch { message: String, attempts: u32 },

    /// The consumer cancelled the cycle.
    Cancelled,

    /// The cycle ran past its overall deadline.
    TimedOut { after: Duration },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::NoData => {
                write!(f, "connected, but no usable data points were returned")
            }
            FailureReason::Fetch { message, .. } => write!(f, "connection failed: {message}"),
            FailureReason::Cancelled => write!(f, "fetch cancelled"),
            FailureReason::TimedOut { after } => {
                write!(f, "fetch timed out after {} ms", after.as_millis())
            }
        }
    }
}

/// Everything currently known about the latest fetch cycle.
///
/// Exactly one variant is live at a time. `Idle` only exists before the first
/// `start()`; nothing transitions back into it.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AcquisitionState {
    #[default]
    Idle,

    /// A cycle is in flight; `attempt` is the 0-based attempt being made.
    Loading { attempt: u32 },

    /// The latest cycle produced at least one non-empty series.
    Ready {
        series: Arc<[Series]>,
        fetched_at: DateTime<Utc>,
    },

    Failed {
        reason: FailureReason,
        last_attempt: u32,
    },
}

/// The single element a renderer should show for a state.
#[derive(Debug, Clone, PartialEq)]
pub enum View<'a> {
    Placeholder,
    Spinner { attempt: u32 },
    Chart { series: &'a [Series] },
    NoData,
    ConnectionFailed { message: String },
}

impl AcquisitionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, AcquisitionState::Loading { .. })
    }

    /// Whether a cycle has finished (successfully or not).
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            AcquisitionState::Ready { .. } | AcquisitionState::Failed { .. }
        )
    }

    pub fn series(&self) -> Option<&[Series]> {
        match self {
            AcquisitionState::Ready { series, .. } => Some(&series[..]),
            _ => None,
        }
    }

    pub fn view(&self) -> View<'_> {
        match self {
            AcquisitionState::Idle => View::Placeholder,
            AcquisitionState::Loading { attempt } => View::Spinner { attempt: *attempt },
            AcquisitionState::Ready { series, .. } => View::Chart {
                series: &series[..],
            },
            AcquisitionState::Failed {
                reason: FailureReason::NoData,
                ..
            } => View::NoData,
            AcquisitionState::Failed { reason, .. } => View::ConnectionFailed {
                message: reason.to_string(),
            },
        }
    }
}

impl fmt::Display for AcquisitionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquisitionState::Idle => write!(f, "idle"),
            AcquisitionState::Loading { attempt } => write!(f, "loading (attempt {})", attempt + 1),
            AcquisitionState::Ready { series, fetched_at } => {
                let points: usize = series.iter().map(Series::len).sum();
                write!(
                    f,
                    "ready ({} series, {points} points, fetched {})",
                    series.len(),
                    fetched_at.to_rfc3339()
                )
            }
            AcquisitionState::Failed {
                reason,
                last_attempt,
            } => write!(f, "failed after attempt {}: {reason}", last_attempt + 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_state_maps_to_exactly_one_view() {
        let series: Arc<[Series]> = vec![Series::from_points("temperature", Vec::new())].into();

        assert_eq!(AcquisitionState::Idle.view(), View::Placeholder);
        assert_eq!(
            AcquisitionState::Loading { attempt: 2 }.view(),
            View::Spinner { attempt: 2 }
        );
        let ready = AcquisitionState::Ready {
            series: series.clone(),
            fetched_at: Utc::now(),
        };
        assert_eq!(
            ready.view(),
            View::Chart {
                series: &series[..]
            }
        );

        let no_data = AcquisitionState::Failed {
            reason: FailureReason::NoData,
            last_attempt: 0,
        };
        assert_eq!(no_data.view(), View::NoData);

        let failed = AcquisitionState::Failed {
            reason: FailureReason::Fetch {
                message: "HTTP status 503".into(),
                attempts: 3,
            },
            last_attempt: 2,
        };
        match failed.view() {
            View::ConnectionFailed { message } => assert!(message.contains("503")),
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn cancelled_and_timed_out_render_as_connection_failures() {
        for reason in [
            FailureReason::Cancelled,
            FailureReason::TimedOut {
                after: Duration::from_millis(1_500),
            },
        ] {
            let state = AcquisitionState::Failed {
                reason,
                last_attempt: 0,
            };
            assert!(matches!(state.view(), View::ConnectionFailed { .. }));
        }
    }

    #[test]
    fn settled_and_loading_are_exclusive() {
        let loading = AcquisitionState::Loading { attempt: 0 };
        assert!(loading.is_loading());
        assert!(!loading.is_settled());
        assert!(!AcquisitionState::Idle.is_settled());
        assert!(
            AcquisitionState::Failed {
                reason: FailureReason::Cancelled,
                last_attempt: 0
            }
            .is_settled()
        );
    }
}

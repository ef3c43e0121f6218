//! Pure transition table for [`AcquisitionState`].

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::models::{
    point::Series,
    state::{AcquisitionState, FailureReason},
};

/// Everything that can happen to an acquisition.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The consumer asked for a (new) cycle.
    Start,
    /// The fetch client moved on to `attempt`.
    Retry { attempt: u32 },
    /// The fetch succeeded and its payload was normalized into `series`.
    Fetched {
        series: Vec<Series>,
        fetched_at: DateTime<Utc>,
    },
    /// The fetch exhausted its retry budget.
    FetchFailed { message: String, attempts: u32 },
    /// The consumer withdrew interest in the running cycle.
    Cancel,
    /// The running cycle hit its overall deadline.
    TimedOut { after: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// `start()` while a cycle is already in flight.
    AlreadyLoading,
}

/// Result of feeding an [`Event`] to a state.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// The event produced a new state.
    Moved(AcquisitionState),
    /// The event is not allowed in the current state; nothing changed.
    Rejected(RejectReason),
    /// The event has no meaning in the current state; nothing changed.
    Ignored,
}

impl AcquisitionState {
    /// Computes the state that follows `event`.
    ///
    /// Total over every (state, event) pair. Events addressed to a cycle
    /// (`Retry`, `Fetched`, `FetchFailed`, `Cancel`, `TimedOut`) only act on
    /// `Loading`; `Start` acts on every state except `Loading`.
    pub fn apply(&self, event: Event) -> Transition {
        use AcquisitionState::*;

        match (self, event) {
            (Loading { .. }, Event::Start) => Transition::Rejected(RejectReason::AlreadyLoading),
            (Idle | Ready { .. } | Failed { .. }, Event::Start) => {
                Transition::Moved(Loading { attempt: 0 })
            }

            (Loading { attempt }, Event::Retry { attempt: next }) if next > *attempt => {
                Transition::Moved(Loading { attempt: next })
            }

            (Loading { attempt }, Event::Fetched { series, fetched_at }) => {
                if series.is_empty() {
                    Transition::Moved(Failed {
                        reason: FailureReason::NoData,
                        last_attempt: *attempt,
                    })
                } else {
                    Transition::Moved(Ready {
                        series: series.into(),
                        fetched_at,
                    })
                }
            }

            (Loading { attempt }, Event::FetchFailed { message, attempts }) => {
                Transition::Moved(Failed {
                    reason: FailureReason::Fetch { message, attempts },
                    last_attempt: *attempt,
                })
            }

            (Loading { attempt }, Event::Cancel) => Transition::Moved(Failed {
                reason: FailureReason::Cancelled,
                last_attempt: *attempt,
            }),

            (Loading { attempt }, Event::TimedOut { after }) => Transition::Moved(Failed {
                reason: FailureReason::TimedOut { after },
                last_attempt: *attempt,
            }),

            _ => Transition::Ignored,
        }
    }
}

//! Drives fetch cycles and publishes the resulting [`AcquisitionState`].
//!
//! One [`AcquisitionMachine`] owns one state. A cycle is started with
//! [`start`](AcquisitionMachine::start) (or its alias
//! [`refresh`](AcquisitionMachine::refresh)) and runs on a spawned Tokio task:
//! fetch with retry, normalize, then a single terminal transition.
//!
//! Concurrency rules:
//!
//! - At most one cycle is in flight; `start()` while loading is rejected with
//!   [`StartError::AlreadyLoading`] and leaves the running cycle untouched.
//! - Each cycle carries a generation number. Events from a cycle that is no
//!   longer current (cancelled, or superseded by a newer one) are dropped.
//! - [`cancel`](AcquisitionMachine::cancel) and dropping the machine abort the
//!   pending request and any backoff sleep.
//!
//! Machines share nothing with each other, so any number can run side by side.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use chrono::{NaiveDate, Utc};
use indexmap::IndexSet;
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    acquisition::transition::{Event, RejectReason, Transition},
    config::FeedConfig,
    errors::Error,
    models::state::AcquisitionState,
    providers::{HttpTransport, reqwest_transport::ReqwestTransport},
    requests::fetch_client::FetchClient,
    transform::normalizer::normalize,
};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StartError {
    /// A cycle is already running; wait for it or cancel it first.
    #[error("an acquisition cycle is already in flight")]
    AlreadyLoading,

    /// Cycles run as Tokio tasks, so there must be a runtime to spawn on.
    #[error("start() must be called from within a Tokio runtime")]
    NoRuntime,
}

impl From<RejectReason> for StartError {
    fn from(reason: RejectReason) -> Self {
        match reason {
            RejectReason::AlreadyLoading => StartError::AlreadyLoading,
        }
    }
}

#[derive(Default)]
struct CycleSlot {
    generation: u64,
    cancel: Option<CancellationToken>,
}

struct Shared<T> {
    client: FetchClient<T>,
    metrics: IndexSet<String>,
    reference_date: Option<NaiveDate>,
    cycle_timeout: Option<Duration>,
    state: watch::Sender<AcquisitionState>,
    cycle: Mutex<CycleSlot>,
}

impl<T> Shared<T> {
    fn lock_cycle(&self) -> MutexGuard<'_, CycleSlot> {
        self.cycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `event` to the published state. Caller holds the cycle lock.
    fn apply_locked(&self, event: Event) -> Transition {
        let transition = self.state.borrow().apply(event);
        if let Transition::Moved(next) = &transition {
            debug!(state = %next, "Acquisition state changed");
            self.state.send_replace(next.clone());
        }
        transition
    }

    /// Applies an event raised by cycle `generation`, unless that cycle is stale.
    fn apply_for(&self, generation: u64, event: Event) -> Transition {
        let mut slot = self.lock_cycle();
        if slot.generation != generation {
            debug!(
                generation,
                current = slot.generation,
                "Dropping event from a stale cycle"
            );
            return Transition::Ignored;
        }
        let transition = self.apply_locked(event);
        if matches!(&transition, Transition::Moved(next) if next.is_settled()) {
            slot.cancel = None;
        }
        transition
    }
}

/// Per-machine cycle settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MachineOptions {
    /// Date that bare `HH:MM` timestamps belong to. When unset, each cycle
    /// uses the UTC date it started on.
    pub reference_date: Option<NaiveDate>,

    /// Overall deadline for a cycle, backoff included. Unbounded when unset.
    pub cycle_timeout: Option<Duration>,
}

/// Orchestrates fetch and normalization behind one observable state.
pub struct AcquisitionMachine<T> {
    shared: Arc<Shared<T>>,
}

impl AcquisitionMachine<ReqwestTransport> {
    /// Builds a machine talking to the configured endpoint over HTTP.
    pub fn from_config(config: &FeedConfig) -> Result<Self, Error> {
        config.validate()?;
        let transport = ReqwestTransport::new(config.request_timeout())?;
        let client = FetchClient::new(transport, config.endpoint_url()?, config.retry)?;

        let options = MachineOptions {
            reference_date: config.reference_date,
            cycle_timeout: config.cycle_timeout(),
        };
        let backoff = config.retry.total_backoff();
        if let Some(limit) = options.cycle_timeout.filter(|limit| *limit < backoff) {
            warn!(
                cycle_timeout_ms = limit.as_millis() as u64,
                backoff_ms = backoff.as_millis() as u64,
                "Cycle timeout is shorter than the full retry backoff; late attempts will not run"
            );
        }
        let machine = Self::with_options(client, config.metric_names(), options);
        Ok(machine)
    }
}

impl<T> AcquisitionMachine<T>
where
    T: HttpTransport + 'static,
{
    /// Creates an idle machine that extracts `metrics` from each payload.
    pub fn new(client: FetchClient<T>, metrics: IndexSet<String>) -> Self {
        Self::with_options(client, metrics, MachineOptions::default())
    }

    pub fn with_options(
        client: FetchClient<T>,
        metrics: IndexSet<String>,
        options: MachineOptions,
    ) -> Self {
        let (state, _) = watch::channel(AcquisitionState::Idle);
        Self {
            shared: Arc::new(Shared {
                client,
                metrics,
                reference_date: options.reference_date,
                cycle_timeout: options.cycle_timeout,
                state,
                cycle: Mutex::default(),
            }),
        }
    }

    /// A snapshot of the current state.
    pub fn state(&self) -> AcquisitionState {
        self.shared.state.borrow().clone()
    }

    /// A receiver that yields the current state and is notified on every transition.
    pub fn subscribe(&self) -> watch::Receiver<AcquisitionState> {
        self.shared.state.subscribe()
    }

    /// Starts a fetch cycle.
    ///
    /// Moves `Idle`, `Ready` or `Failed` to `Loading { attempt: 0 }`, discarding
    /// the previous outcome, and spawns the cycle on the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// * [`StartError::AlreadyLoading`] - a cycle is in flight. It keeps running
    ///   unaffected.
    /// * [`StartError::NoRuntime`] - called outside a Tokio runtime. The state is
    ///   left as it was.
    pub fn start(&self) -> Result<(), StartError> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("Start requested outside a Tokio runtime; rejected");
            return Err(StartError::NoRuntime);
        };

        let mut slot = self.shared.lock_cycle();
        if let Transition::Rejected(reason) = self.shared.apply_locked(Event::Start) {
            warn!("Start requested while a cycle is in flight; rejected");
            return Err(reason.into());
        }

        slot.generation += 1;
        let token = CancellationToken::new();
        slot.cancel = Some(token.clone());
        let generation = slot.generation;
        drop(slot);

        info!(
            endpoint = %self.shared.client.endpoint(),
            max_attempts = self.shared.client.budget().max_attempts,
            generation,
            "Acquisition cycle started"
        );
        runtime.spawn(run_cycle(Arc::clone(&self.shared), generation, token));
        Ok(())
    }

    /// Same as [`start`](Self::start); reads better for a manual reload.
    pub fn refresh(&self) -> Result<(), StartError> {
        self.start()
    }

    /// Cancels the in-flight cycle, if any.
    ///
    /// `Loading` becomes `Failed { reason: Cancelled }`. Anything the cancelled
    /// cycle produces afterwards is discarded. Returns whether a cycle was
    /// cancelled.
    pub fn cancel(&self) -> bool {
        let mut slot = self.shared.lock_cycle();
        let Some(token) = slot.cancel.take() else {
            return false;
        };
        token.cancel();
        slot.generation += 1;
        let moved = matches!(
            self.shared.apply_locked(Event::Cancel),
            Transition::Moved(_)
        );
        if moved {
            info!("Acquisition cycle cancelled");
        }
        moved
    }

    /// Waits until no cycle is loading and returns that state.
    ///
    /// Returns immediately when idle or already settled.
    pub async fn settled(&self) -> AcquisitionState {
        let mut rx = self.subscribe();
        match rx.wait_for(|state| !state.is_loading()).await {
            Ok(state) => state.clone(),
            // The sender lives in `self`, so the channel cannot close here.
            Err(_) => self.state(),
        }
    }
}

impl<T> Drop for AcquisitionMachine<T> {
    fn drop(&mut self) {
        let mut slot = self.shared.lock_cycle();
        if let Some(token) = slot.cancel.take() {
            token.cancel();
        }
        slot.generation += 1;
    }
}

async fn run_cycle<T>(shared: Arc<Shared<T>>, generation: u64, token: CancellationToken)
where
    T: HttpTransport + 'static,
{
    let reference_date = shared
        .reference_date
        .unwrap_or_else(|| Utc::now().date_naive());

    let progress = {
        let shared = Arc::clone(&shared);
        move |attempt: u32| {
            if attempt > 0 {
                shared.apply_for(generation, Event::Retry { attempt });
            }
        }
    };

    let outcome = tokio::select! {
        _ = token.cancelled() => {
            debug!(generation, "Cycle cancelled before completion");
            return;
        }
        outcome = async {
            let fetch = shared.client.fetch_with_progress(progress);
            match shared.cycle_timeout {
                Some(limit) => tokio::time::timeout(limit, fetch).await.map_err(|_| limit),
                None => Ok(fetch.await),
            }
        } => outcome,
    };

    let event = match outcome {
        Ok(Ok(payload)) => {
            let series = normalize(&payload, &shared.metrics, reference_date);
            if series.is_empty() {
                warn!(generation, "Fetch succeeded but yielded no usable points");
            }
            Event::Fetched {
                series,
                fetched_at: Utc::now(),
            }
        }
        Ok(Err(err)) => Event::FetchFailed {
            message: err.to_string(),
            attempts: err.attempts(),
        },
        Err(after) => {
            warn!(generation, timeout_ms = after.as_millis() as u64, "Cycle deadline exceeded");
            Event::TimedOut { after }
        }
    };

    if let Transition::Moved(state) = shared.apply_for(generation, event) {
        info!(generation, %state, "Acquisition cycle finished");
    }
}

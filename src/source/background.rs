//! Background tick driver.
//!
//! Runs the session inside a tokio task on a fixed interval, independent of
//! the UI refresh. Overrides and fault settings flow to the task through
//! watch channels; tick outcomes flow back through a bounded mpsc channel.
//! Readings themselves are shared through the [`SharedStore`], whose write
//! lock covers append and trim.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::data::{FaultInjection, Overrides, Session, SharedStore, TickOutcome};

use super::ReadingSource;

/// Outcomes buffered between polls before the producer starts dropping
/// notifications. Readings still reach the store when this is full.
const OUTCOME_BUFFER: usize = 64;

/// A source whose session ticks on a tokio interval.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use iaq_dashboard::{BackgroundSource, Generator, ReadingSource, Session, SharedStore};
///
/// # tokio_test::block_on(async {
/// let session = Session::new(Generator::with_seed(1, Vec::new()), SharedStore::default());
/// let source = BackgroundSource::spawn(
///     session,
///     Duration::from_millis(10),
///     &tokio::runtime::Handle::current(),
/// );
/// assert!(source.error().is_none());
/// # });
/// ```
#[derive(Debug)]
pub struct BackgroundSource {
    store: SharedStore,
    rooms: Vec<String>,
    overrides: watch::Sender<Overrides>,
    faults: watch::Sender<FaultInjection>,
    outcomes: mpsc::Receiver<TickOutcome>,
    task: JoinHandle<()>,
    description: String,
    last_error: Option<String>,
}

impl BackgroundSource {
    /// Move `session` into a producer task on `runtime` ticking every `interval`.
    pub fn spawn(session: Session, interval: Duration, runtime: &Handle) -> Self {
        let store = session.store().clone();
        let rooms = session.rooms().to_vec();
        let (overrides_tx, overrides_rx) = watch::channel(session.overrides());
        let (faults_tx, faults_rx) = watch::channel(session.faults());
        let (tx, rx) = mpsc::channel(OUTCOME_BUFFER);

        let task = runtime.spawn(produce(session, interval, overrides_rx, faults_rx, tx));

        Self {
            store,
            rooms,
            overrides: overrides_tx,
            faults: faults_tx,
            outcomes: rx,
            task,
            description: format!("background: every {}ms", interval.as_millis()),
            last_error: None,
        }
    }
}

async fn produce(
    mut session: Session,
    period: Duration,
    mut overrides: watch::Receiver<Overrides>,
    mut faults: watch::Receiver<FaultInjection>,
    tx: mpsc::Sender<TickOutcome>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tracing::info!(period_ms = period.as_millis() as u64, "background producer started");

    loop {
        ticker.tick().await;

        if overrides.has_changed().unwrap_or(false) {
            session.set_overrides(*overrides.borrow_and_update());
        }
        if faults.has_changed().unwrap_or(false) {
            session.set_faults(*faults.borrow_and_update());
        }

        let outcome = session.tick();
        match tx.try_send(outcome) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::debug!("outcome buffer full, notification dropped");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => break,
        }
    }

    tracing::info!(ticks = session.ticks(), "background producer stopped");
}

impl Drop for BackgroundSource {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl ReadingSource for BackgroundSource {
    fn poll(&mut self) -> Vec<TickOutcome> {
        let mut out = Vec::new();
        loop {
            match self.outcomes.try_recv() {
                Ok(outcome) => out.push(outcome),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    self.last_error = Some("Producer stopped".to_string());
                    break;
                }
            }
        }
        out
    }

    fn set_overrides(&mut self, overrides: Overrides) {
        self.overrides.send_replace(overrides);
    }

    fn set_faults(&mut self, faults: FaultInjection) {
        self.faults.send_replace(faults);
    }

    fn store(&self) -> &SharedStore {
        &self.store
    }

    fn rooms(&self) -> &[String] {
        &self.rooms
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

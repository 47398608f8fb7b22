//! Tick drivers that feed readings into the shared store.
//!
//! Both drivers own the [`Session`](crate::data::Session) exclusively, so
//! `last_reading` is never touched by anything but the generator. The UI
//! only sees the [`SharedStore`] and the outcomes returned by `poll()`.

mod background;
mod local;

pub use background::BackgroundSource;
pub use local::LocalSource;

use std::fmt::Debug;

use crate::data::{FaultInjection, Overrides, SharedStore, TickOutcome};

/// Trait for anything that produces readings into a [`SharedStore`].
///
/// # Example
///
/// ```
/// use iaq_dashboard::{Generator, LocalSource, ReadingSource, Session, SharedStore};
///
/// let session = Session::new(Generator::with_seed(1, Vec::new()), SharedStore::default());
/// let mut source = LocalSource::new(session);
/// let outcomes = source.poll();
/// assert_eq!(outcomes.len(), 1);
/// assert_eq!(source.store().len(), 1);
/// ```
pub trait ReadingSource: Send + Debug {
    /// Collect the ticks that happened since the last poll.
    ///
    /// Inline drivers tick once per call; background drivers return whatever
    /// the producer reported in the meantime. This method never blocks.
    fn poll(&mut self) -> Vec<TickOutcome>;

    /// Replace the demo overrides applied from the next tick on.
    fn set_overrides(&mut self, overrides: Overrides);

    /// Replace the fault-injection policy applied from the next tick on.
    fn set_faults(&mut self, faults: FaultInjection);

    /// The store readings are appended to.
    fn store(&self) -> &SharedStore;

    /// Rooms the generator draws from.
    fn rooms(&self) -> &[String];

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;

    /// Check if the source has stopped producing.
    fn error(&self) -> Option<&str>;
}

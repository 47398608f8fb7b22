//! Inline tick driver.
//!
//! Ticks the session synchronously on every poll. The caller's refresh
//! loop provides the fixed wall-clock interval.

use crate::data::{FaultInjection, Overrides, Session, SharedStore, TickOutcome};

use super::ReadingSource;

/// A source that runs one session tick per `poll()` on the calling thread.
#[derive(Debug)]
pub struct LocalSource {
    session: Session,
    description: String,
}

impl LocalSource {
    pub fn new(session: Session) -> Self {
        let description = format!("simulated: {} rooms", session.rooms().len());
        Self {
            session,
            description,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}

impl ReadingSource for LocalSource {
    fn poll(&mut self) -> Vec<TickOutcome> {
        vec![self.session.tick()]
    }

    fn set_overrides(&mut self, overrides: Overrides) {
        self.session.set_overrides(overrides);
    }

    fn set_faults(&mut self, faults: FaultInjection) {
        self.session.set_faults(faults);
    }

    fn store(&self) -> &SharedStore {
        self.session.store()
    }

    fn rooms(&self) -> &[String] {
        self.session.rooms()
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Generator;

    #[test]
    fn each_poll_is_one_tick() {
        let session = Session::new(
            Generator::with_seed(2, Vec::new()),
            SharedStore::with_capacity(5),
        );
        let mut source = LocalSource::new(session);

        for expected in 1..=7usize {
            assert_eq!(source.poll().len(), 1);
            assert_eq!(source.store().len(), expected.min(5));
        }
        assert_eq!(source.session().ticks(), 7);
        assert_eq!(source.description(), "simulated: 3 rooms");
    }

    #[test]
    fn overrides_reach_the_session() {
        let session = Session::new(Generator::with_seed(2, Vec::new()), SharedStore::default());
        let mut source = LocalSource::new(session);
        source.set_overrides(Overrides {
            force_high_pm: true,
            ..Default::default()
        });

        let outcomes = source.poll();
        assert_eq!(outcomes[0].reading().metrics.pm, 40.0);
    }
}

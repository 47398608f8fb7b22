//! Session-scoped state and the per-tick step.
//!
//! A [`Session`] owns the generator (and with it `last_reading`), the
//! current demo overrides and the fault-injection policy. Each call to
//! [`Session::tick`] runs generate → maybe-append → maybe-evict as one
//! step against the session's [`SharedStore`].

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::generator::{Generator, Overrides};
use super::reading::Reading;
use super::store::SharedStore;

/// Probability of dropping a generated reading when fault injection is on.
pub const DEFAULT_SKIP_PROBABILITY: f64 = 0.01;

/// Simulated missed sensor samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaultInjection {
    pub enabled: bool,
    pub skip_probability: f64,
}

impl Default for FaultInjection {
    fn default() -> Self {
        Self {
            enabled: false,
            skip_probability: DEFAULT_SKIP_PROBABILITY,
        }
    }
}

impl FaultInjection {
    pub fn enabled(skip_probability: f64) -> Self {
        Self {
            enabled: true,
            skip_probability,
        }
    }
}

/// Result of a single tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The reading was appended; `evicted` old readings were dropped.
    Appended { reading: Reading, evicted: usize },
    /// The reading was generated but dropped by fault injection.
    Skipped { reading: Reading },
}

impl TickOutcome {
    pub fn reading(&self) -> &Reading {
        match self {
            TickOutcome::Appended { reading, .. } | TickOutcome::Skipped { reading } => reading,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, TickOutcome::Skipped { .. })
    }
}

/// Single-writer session state.
#[derive(Debug)]
pub struct Session {
    generator: Generator,
    store: SharedStore,
    overrides: Overrides,
    faults: FaultInjection,
    fault_rng: StdRng,
    ticks: u64,
}

impl Session {
    pub fn new(generator: Generator, store: SharedStore) -> Self {
        Self {
            generator,
            store,
            overrides: Overrides::default(),
            faults: FaultInjection::default(),
            fault_rng: StdRng::from_entropy(),
            ticks: 0,
        }
    }

    /// Seed the fault-injection RNG for reproducible skips.
    pub fn with_fault_seed(mut self, seed: u64) -> Self {
        self.fault_rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_faults(mut self, faults: FaultInjection) -> Self {
        self.faults = faults;
        self
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn overrides(&self) -> Overrides {
        self.overrides
    }

    pub fn set_overrides(&mut self, overrides: Overrides) {
        self.overrides = overrides;
    }

    pub fn faults(&self) -> FaultInjection {
        self.faults
    }

    pub fn set_faults(&mut self, faults: FaultInjection) {
        self.faults = faults;
    }

    pub fn rooms(&self) -> &[String] {
        self.generator.rooms()
    }

    /// Number of ticks run so far, skipped ones included.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run one tick stamped with the current time.
    pub fn tick(&mut self) -> TickOutcome {
        self.tick_at(Utc::now())
    }

    /// Run one tick with an explicit capture time.
    ///
    /// A capture time earlier than the latest stored reading is raised to it.
    pub fn tick_at(&mut self, now: DateTime<Utc>) -> TickOutcome {
        self.ticks += 1;
        let latest = self.store.read().latest_timestamp();
        let now = latest.map_or(now, |last| now.max(last));
        let reading = self.generator.next_reading_at(now, self.overrides);

        if self.should_skip() {
            tracing::warn!(room = %reading.room, "sensor sample dropped by fault injection");
            return TickOutcome::Skipped { reading };
        }

        let evicted = self.store.append(reading.clone());
        if evicted > 0 {
            tracing::debug!(evicted, "evicted oldest readings");
        }
        TickOutcome::Appended { reading, evicted }
    }

    fn should_skip(&mut self) -> bool {
        self.faults.enabled && self.fault_rng.gen_bool(self.faults.skip_probability.clamp(0.0, 1.0))
    }
}

//! Synthetic reading generator.
//!
//! Each metric follows a mean-reverting random walk: the previous value is
//! pulled toward a fixed target, Gaussian noise is added, and the result is
//! clamped into the metric's band. Demo overrides replace a metric with its
//! alarm value, which lies outside the clamp band on purpose.
//!
//! The generator is a first-order Markov process over [`Metrics`]: the next
//! reading depends only on `last` and the overrides, never on the room.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use super::reading::{Metric, Metrics, Reading, DEFAULT_ROOMS};

/// Fraction of the distance to the target recovered on every step.
pub const REVERSION_RATE: f64 = 0.12;

/// Target values the walk reverts to, and the initial `last` state.
pub const TARGET: Metrics = Metrics {
    co2: 650.0,
    temp: 23.0,
    rh: 50.0,
    pm: 8.0,
};

/// Per-metric parameters of the walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricModel {
    pub target: f64,
    pub noise_sd: f64,
    pub low: f64,
    pub high: f64,
    /// Value forced by the demo override, if the metric has one.
    pub alarm: Option<f64>,
}

impl MetricModel {
    /// The fixed model for a metric.
    pub fn for_metric(metric: Metric) -> Self {
        match metric {
            Metric::Co2 => Self {
                target: TARGET.co2,
                noise_sd: 8.0,
                low: 500.0,
                high: 800.0,
                alarm: Some(1200.0),
            },
            Metric::Temp => Self {
                target: TARGET.temp,
                noise_sd: 0.25,
                low: 20.0,
                high: 25.0,
                alarm: Some(29.0),
            },
            Metric::Rh => Self {
                target: TARGET.rh,
                noise_sd: 0.8,
                low: 35.0,
                high: 60.0,
                alarm: None,
            },
            Metric::Pm => Self {
                target: TARGET.pm,
                noise_sd: 0.8,
                low: 4.0,
                high: 20.0,
                alarm: Some(40.0),
            },
        }
    }

    /// Deterministic part of one step: previous value plus drift toward target.
    pub fn drifted(&self, previous: f64) -> f64 {
        previous + REVERSION_RATE * (self.target - previous)
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.low, self.high)
    }
}

/// Demo flags that force individual metrics to their alarm value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overrides {
    pub force_high_co2: bool,
    pub force_high_pm: bool,
    pub force_high_temp: bool,
}

impl Overrides {
    /// Whether the override for `metric` is active. Humidity has none.
    pub fn is_forced(&self, metric: Metric) -> bool {
        match metric {
            Metric::Co2 => self.force_high_co2,
            Metric::Pm => self.force_high_pm,
            Metric::Temp => self.force_high_temp,
            Metric::Rh => false,
        }
    }

    pub fn any(&self) -> bool {
        self.force_high_co2 || self.force_high_pm || self.force_high_temp
    }
}

/// Produces one [`Reading`] per call, conditioned on the previous one.
#[derive(Debug)]
pub struct Generator {
    rng: StdRng,
    rooms: Vec<String>,
    models: [MetricModel; 4],
    noise_scale: f64,
    last: Metrics,
}

impl Generator {
    /// Create a generator seeded from the operating system.
    pub fn new(rooms: Vec<String>) -> Self {
        Self::with_rng(StdRng::from_entropy(), rooms, 1.0)
    }

    /// Create a reproducible generator.
    pub fn with_seed(seed: u64, rooms: Vec<String>) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), rooms, 1.0)
    }

    /// Create a generator that adds no noise, so every step is exactly
    /// `previous + drift` before clamping.
    pub fn noiseless(rooms: Vec<String>) -> Self {
        Self::with_rng(StdRng::seed_from_u64(0), rooms, 0.0)
    }

    fn with_rng(rng: StdRng, rooms: Vec<String>, noise_scale: f64) -> Self {
        let rooms = if rooms.is_empty() {
            DEFAULT_ROOMS.iter().map(|r| r.to_string()).collect()
        } else {
            rooms
        };
        Self {
            rng,
            rooms,
            models: Metric::ALL.map(MetricModel::for_metric),
            noise_scale,
            last: TARGET,
        }
    }

    /// Replace the state the next step starts from.
    pub fn with_last(mut self, last: Metrics) -> Self {
        self.last = last;
        self
    }

    /// Metrics the next step is conditioned on.
    pub fn last(&self) -> &Metrics {
        &self.last
    }

    pub fn rooms(&self) -> &[String] {
        &self.rooms
    }

    /// Produce the next reading timestamped with the current time.
    pub fn next_reading(&mut self, overrides: Overrides) -> Reading {
        self.next_reading_at(Utc::now(), overrides)
    }

    /// Produce the next reading with an explicit capture time.
    pub fn next_reading_at(&mut self, timestamp: DateTime<Utc>, overrides: Overrides) -> Reading {
        let previous = self.last;
        let mut next = previous;

        for (i, metric) in Metric::ALL.iter().copied().enumerate() {
            let model = &self.models[i];
            let value = match model.alarm {
                Some(alarm) if overrides.is_forced(metric) => alarm,
                _ => {
                    let z: f64 = self.rng.sample(StandardNormal);
                    let noise = z * model.noise_sd * self.noise_scale;
                    model.clamp(model.drifted(previous.get(metric)) + noise)
                }
            };
            next.set(metric, value);
        }

        let room = self
            .rooms
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_else(|| DEFAULT_ROOMS[0].to_string());

        self.last = next;
        Reading::new(timestamp, room, next)
    }
}

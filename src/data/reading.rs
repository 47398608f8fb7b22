//! Reading and metric types.
//!
//! A [`Reading`] always carries all four metrics: [`Metrics`] is a plain
//! struct rather than a map, so a reading with a missing metric cannot be
//! constructed.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rooms used when no room list is configured.
pub const DEFAULT_ROOMS: [&str; 3] = ["Office A", "Office B", "Lab"];

/// One of the four tracked air-quality metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Carbon dioxide concentration (ppm).
    Co2,
    /// Air temperature (°C).
    Temp,
    /// Relative humidity (%).
    Rh,
    /// Particulate matter (µg/m³).
    Pm,
}

impl Metric {
    /// All metrics in display order.
    pub const ALL: [Metric; 4] = [Metric::Co2, Metric::Temp, Metric::Rh, Metric::Pm];

    /// Short machine key used in exports and prompts.
    pub fn key(&self) -> &'static str {
        match self {
            Metric::Co2 => "co2",
            Metric::Temp => "temp",
            Metric::Rh => "rh",
            Metric::Pm => "pm",
        }
    }

    /// Human-readable label for tiles and chart titles.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Co2 => "CO₂",
            Metric::Temp => "Temp",
            Metric::Rh => "Humidity",
            Metric::Pm => "PM2.5",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Co2 => "ppm",
            Metric::Temp => "°C",
            Metric::Rh => "%",
            Metric::Pm => "µg/m³",
        }
    }

    /// Format a value with the precision the dashboard uses for this metric.
    pub fn format_value(&self, value: f64) -> String {
        match self {
            Metric::Co2 | Metric::Rh => format!("{:.0}", value),
            Metric::Temp | Metric::Pm => format!("{:.1}", value),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The four metric values of one observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub co2: f64,
    pub temp: f64,
    pub rh: f64,
    pub pm: f64,
}

impl Metrics {
    pub fn new(co2: f64, temp: f64, rh: f64, pm: f64) -> Self {
        Self { co2, temp, rh, pm }
    }

    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Co2 => self.co2,
            Metric::Temp => self.temp,
            Metric::Rh => self.rh,
            Metric::Pm => self.pm,
        }
    }

    pub fn set(&mut self, metric: Metric, value: f64) {
        match metric {
            Metric::Co2 => self.co2 = value,
            Metric::Temp => self.temp = value,
            Metric::Rh => self.rh = value,
            Metric::Pm => self.pm = value,
        }
    }

    /// Iterate `(metric, value)` pairs in [`Metric::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        Metric::ALL.iter().map(move |&m| (m, self.get(m)))
    }
}

/// One synthetic multi-metric observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Capture time.
    pub timestamp: DateTime<Utc>,
    pub room: String,
    #[serde(flatten)]
    pub metrics: Metrics,
}

impl Reading {
    pub fn new(timestamp: DateTime<Utc>, room: impl Into<String>, metrics: Metrics) -> Self {
        Self {
            timestamp,
            room: room.into(),
            metrics,
        }
    }

    pub fn value(&self, metric: Metric) -> f64 {
        self.metrics.get(metric)
    }
}

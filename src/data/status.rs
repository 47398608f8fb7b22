//! Status classification for readings.
//!
//! Each metric maps to one of three ordered bands using fixed thresholds.
//! The overall badge escalates on the number of degraded metrics, not on
//! their severity: one non-good metric is `Warn`, two or more is `Bad`.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::reading::{Metric, Metrics, Reading};

/// CO₂ level (ppm) above which a room-specific alert is raised.
pub const CO2_ALERT_PPM: f64 = 1000.0;

/// Ordinal severity band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Good,
    Warn,
    Bad,
}

impl Status {
    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            Status::Good => "GOOD",
            Status::Warn => "WARN",
            Status::Bad => "BAD",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Good => "good",
            Status::Warn => "warn",
            Status::Bad => "bad",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Threshold limits for one metric. A value outside `bad_*` is `Bad`,
/// outside `warn_*` is `Warn`, otherwise `Good`. Limits are exclusive:
/// a value equal to a limit stays in the milder band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    pub bad_below: Option<f64>,
    pub warn_below: Option<f64>,
    pub warn_above: f64,
    pub bad_above: f64,
}

impl Bands {
    pub fn for_metric(metric: Metric) -> Self {
        match metric {
            Metric::Co2 => Self {
                bad_below: None,
                warn_below: None,
                warn_above: 800.0,
                bad_above: 1000.0,
            },
            Metric::Temp => Self {
                bad_below: Some(18.0),
                warn_below: Some(20.0),
                warn_above: 25.0,
                bad_above: 27.0,
            },
            Metric::Rh => Self {
                bad_below: Some(30.0),
                warn_below: Some(35.0),
                warn_above: 60.0,
                bad_above: 70.0,
            },
            Metric::Pm => Self {
                bad_below: None,
                warn_below: None,
                warn_above: 12.0,
                bad_above: 35.0,
            },
        }
    }

    pub fn classify(&self, value: f64) -> Status {
        let below = |limit: Option<f64>| limit.is_some_and(|l| value < l);
        if value > self.bad_above || below(self.bad_below) {
            Status::Bad
        } else if value > self.warn_above || below(self.warn_below) {
            Status::Warn
        } else {
            Status::Good
        }
    }
}

/// Band for a single metric value.
pub fn classify(metric: Metric, value: f64) -> Status {
    Bands::for_metric(metric).classify(value)
}

/// Overall badge: `Bad` with two or more non-good metrics, `Warn` with one.
pub fn overall(metrics: &Metrics) -> Status {
    aggregate(metrics.iter().map(|(m, v)| classify(m, v)))
}

fn aggregate(bands: impl IntoIterator<Item = Status>) -> Status {
    match bands.into_iter().filter(|s| *s != Status::Good).count() {
        0 => Status::Good,
        1 => Status::Warn,
        _ => Status::Bad,
    }
}

/// Per-metric bands and the overall badge for one reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Assessment {
    pub co2: Status,
    pub temp: Status,
    pub rh: Status,
    pub pm: Status,
    pub overall: Status,
}

impl Assessment {
    pub fn of(metrics: &Metrics) -> Self {
        let co2 = classify(Metric::Co2, metrics.co2);
        let temp = classify(Metric::Temp, metrics.temp);
        let rh = classify(Metric::Rh, metrics.rh);
        let pm = classify(Metric::Pm, metrics.pm);
        Self {
            co2,
            temp,
            rh,
            pm,
            overall: aggregate([co2, temp, rh, pm]),
        }
    }

    pub fn get(&self, metric: Metric) -> Status {
        match metric {
            Metric::Co2 => self.co2,
            Metric::Temp => self.temp,
            Metric::Rh => self.rh,
            Metric::Pm => self.pm,
        }
    }

    /// Metrics not in the good band, worst first.
    pub fn degraded(&self) -> Vec<(Metric, Status)> {
        let mut out: Vec<_> = Metric::ALL
            .iter()
            .map(|&m| (m, self.get(m)))
            .filter(|(_, s)| *s != Status::Good)
            .collect();
        out.sort_by(|a, b| b.1.cmp(&a.1));
        out
    }
}

/// High-CO₂ alert for one room, independent of the overall badge.
#[derive(Debug, Clone, PartialEq)]
pub struct Co2Alert {
    pub room: String,
    pub co2: f64,
}

impl Co2Alert {
    /// Raise an alert when the reading's CO₂ exceeds [`CO2_ALERT_PPM`].
    pub fn check(reading: &Reading) -> Option<Self> {
        (reading.metrics.co2 > CO2_ALERT_PPM).then(|| Self {
            room: reading.room.clone(),
            co2: reading.metrics.co2,
        })
    }
}

impl fmt::Display for Co2Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "High CO₂ in {} — {:.0} ppm!", self.room, self.co2)
    }
}

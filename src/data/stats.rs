//! Aggregated statistics over a set of readings.
//!
//! These feed the insight summarizer and the export summary.

use std::collections::BTreeMap;

use serde::Serialize;

use super::reading::{Metric, Reading};

/// Mean and extremes of one metric over a window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Row count plus per-metric statistics. Metrics are absent when `rows == 0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WindowStats {
    pub rows: usize,
    pub metrics: BTreeMap<Metric, MetricStats>,
}

impl WindowStats {
    /// Compute statistics in one pass over `readings`.
    pub fn from_readings<'a>(readings: impl IntoIterator<Item = &'a Reading>) -> Self {
        let mut rows = 0usize;
        let mut sums = [0.0f64; 4];
        let mut mins = [f64::INFINITY; 4];
        let mut maxs = [f64::NEG_INFINITY; 4];

        for reading in readings {
            rows += 1;
            for (i, (_, v)) in reading.metrics.iter().enumerate() {
                sums[i] += v;
                mins[i] = mins[i].min(v);
                maxs[i] = maxs[i].max(v);
            }
        }

        let metrics = if rows == 0 {
            BTreeMap::new()
        } else {
            Metric::ALL
                .iter()
                .enumerate()
                .map(|(i, &m)| {
                    (
                        m,
                        MetricStats {
                            mean: sums[i] / rows as f64,
                            min: mins[i],
                            max: maxs[i],
                        },
                    )
                })
                .collect()
        };

        Self { rows, metrics }
    }

    pub fn get(&self, metric: Metric) -> Option<&MetricStats> {
        self.metrics.get(&metric)
    }

    pub fn mean(&self, metric: Metric) -> Option<f64> {
        self.get(metric).map(|s| s.mean)
    }

    pub fn max(&self, metric: Metric) -> Option<f64> {
        self.get(metric).map(|s| s.max)
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Flat JSON object (`rows`, `co2_avg`, `co2_max`, ...) used in prompts.
    pub fn to_summary_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert("rows".to_string(), serde_json::json!(self.rows));
        for (metric, s) in &self.metrics {
            map.insert(format!("{}_avg", metric.key()), serde_json::json!(round2(s.mean)));
            map.insert(format!("{}_max", metric.key()), serde_json::json!(round2(s.max)));
        }
        serde_json::Value::Object(map)
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::reading::Metrics;
    use chrono::Utc;

    fn reading(co2: f64, pm: f64) -> Reading {
        Reading::new(Utc::now(), "Lab", Metrics::new(co2, 22.0, 45.0, pm))
    }

    #[test]
    fn empty_window_has_no_metric_stats() {
        let stats = WindowStats::from_readings(std::iter::empty());
        assert!(stats.is_empty());
        assert!(stats.mean(Metric::Co2).is_none());
        assert_eq!(stats.to_summary_json(), serde_json::json!({"rows": 0}));
    }

    #[test]
    fn computes_mean_min_max() {
        let readings = vec![reading(600.0, 5.0), reading(700.0, 15.0), reading(800.0, 10.0)];
        let stats = WindowStats::from_readings(&readings);

        assert_eq!(stats.rows, 3);
        let co2 = stats.get(Metric::Co2).unwrap();
        assert_eq!(co2.mean, 700.0);
        assert_eq!(co2.min, 600.0);
        assert_eq!(co2.max, 800.0);
        assert_eq!(stats.max(Metric::Pm), Some(15.0));
        assert_eq!(stats.mean(Metric::Temp), Some(22.0));
    }

    #[test]
    fn summary_json_has_flat_keys() {
        let readings = vec![reading(650.0, 8.0)];
        let json = WindowStats::from_readings(&readings).to_summary_json();
        assert_eq!(json["rows"], 1);
        assert_eq!(json["co2_avg"], 650.0);
        assert_eq!(json["pm_max"], 8.0);
        assert_eq!(json["rh_avg"], 45.0);
    }
}

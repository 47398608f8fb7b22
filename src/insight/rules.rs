//! Offline rule-based summarizer.

use async_trait::async_trait;

use super::{InsightError, Summarizer};
use crate::data::{classify, Metric, Status, WindowStats};

/// Builds bullet insights and one recommendation from fixed rules.
#[derive(Debug, Clone, Default)]
pub struct RuleSummarizer;

impl RuleSummarizer {
    pub fn new() -> Self {
        Self
    }

    fn recommendation(stats: &WindowStats) -> &'static str {
        let peak = |m: Metric| stats.max(m).map_or(Status::Good, |v| classify(m, v));
        let typical = |m: Metric| stats.mean(m).map_or(Status::Good, |v| classify(m, v));

        if peak(Metric::Co2) == Status::Bad {
            "Increase fresh-air ventilation in the affected rooms."
        } else if peak(Metric::Pm) == Status::Bad {
            "Inspect HVAC filters and limit indoor particle sources."
        } else if typical(Metric::Temp) != Status::Good {
            "Adjust the thermostat setpoint toward 20–25 °C."
        } else if typical(Metric::Rh) != Status::Good {
            "Review humidification to keep humidity between 35 and 60 %."
        } else if typical(Metric::Co2) != Status::Good {
            "Consider demand-based ventilation during occupied hours."
        } else {
            "No action needed; keep the current ventilation schedule."
        }
    }
}

#[async_trait]
impl Summarizer for RuleSummarizer {
    async fn summarize(&self, stats: &WindowStats) -> Result<String, InsightError> {
        let (Some(co2), Some(temp), Some(rh), Some(pm)) = (
            stats.get(Metric::Co2),
            stats.get(Metric::Temp),
            stats.get(Metric::Rh),
            stats.get(Metric::Pm),
        ) else {
            return Ok("- No readings in the last window yet".to_string());
        };

        let mut lines = vec![format!(
            "- CO₂ averaged {:.0} ppm (peak {:.0} ppm) across {} readings",
            co2.mean, co2.max, stats.rows
        )];
        lines.push(format!(
            "- Comfort: {:.1} °C and {:.0} % RH on average ({} / {})",
            temp.mean,
            rh.mean,
            classify(Metric::Temp, temp.mean),
            classify(Metric::Rh, rh.mean)
        ));
        if classify(Metric::Pm, pm.max) != Status::Good {
            lines.push(format!("- Particulates peaked at {:.1} µg/m³", pm.max));
        }
        lines.push(format!("Recommendation: {}", Self::recommendation(stats)));

        Ok(lines.join("\n"))
    }

    fn name(&self) -> &str {
        "rules"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Metrics, Reading};
    use chrono::Utc;

    fn stats(values: &[Metrics]) -> WindowStats {
        let readings: Vec<Reading> =
            values.iter().map(|m| Reading::new(Utc::now(), "Lab", *m)).collect();
        WindowStats::from_readings(&readings)
    }

    #[tokio::test]
    async fn calm_window_needs_no_action() {
        let s = stats(&[Metrics::new(650.0, 23.0, 50.0, 8.0)]);
        let text = RuleSummarizer.summarize(&s).await.unwrap();
        assert!(text.contains("CO₂ averaged 650 ppm"));
        assert!(text.contains("No action needed"));
        assert!(!text.contains("Particulates"));
    }

    #[tokio::test]
    async fn co2_spike_recommends_ventilation() {
        let s = stats(&[
            Metrics::new(650.0, 23.0, 50.0, 8.0),
            Metrics::new(1200.0, 23.0, 50.0, 40.0),
        ]);
        let text = RuleSummarizer.summarize(&s).await.unwrap();
        assert!(text.contains("peak 1200 ppm"));
        assert!(text.contains("Particulates peaked at 40.0"));
        assert!(text.contains("Increase fresh-air ventilation"));
    }

    #[tokio::test]
    async fn empty_window_is_not_an_error() {
        let text = RuleSummarizer.summarize(&WindowStats::default()).await.unwrap();
        assert!(text.contains("No readings"));
    }
}

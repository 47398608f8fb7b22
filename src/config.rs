//! Dashboard configuration.
//!
//! Loaded from an optional TOML file plus `IAQ_`-prefixed environment
//! variables (nested keys use `__`, e.g. `IAQ_INSIGHT__TTL_SECS=60`).
//! Every field has a default, so an empty configuration is valid.
//!
//! ```toml
//! refresh_ms = 1000
//! capacity = 1440
//! rooms = ["Office A", "Office B", "Lab"]
//!
//! export_path = "iaq_export.json"
//!
//! [fault_injection]
//! enabled = true
//! skip_probability = 0.01
//!
//! [insight]
//! backend = "rules"
//! ttl_secs = 300
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Result};
use ::config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::app::DEFAULT_EXPORT_PATH;
use crate::data::{FaultInjection, DEFAULT_ROOMS};
use crate::data::session::DEFAULT_SKIP_PROBABILITY;
use crate::data::store::DEFAULT_CAPACITY;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    /// Tick interval in milliseconds.
    pub refresh_ms: u64,
    /// Number of readings kept in history.
    pub capacity: usize,
    pub rooms: Vec<String>,
    /// Seed for reproducible runs.
    pub seed: Option<u64>,
    /// A room with no reading for this long is shown offline.
    pub offline_after_secs: u64,
    /// File written by the export key in the TUI.
    pub export_path: PathBuf,
    pub fault_injection: FaultInjectionConfig,
    pub insight: InsightConfig,
    pub logging: LoggingConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_ms: 1000,
            capacity: DEFAULT_CAPACITY,
            rooms: DEFAULT_ROOMS.iter().map(|r| r.to_string()).collect(),
            seed: None,
            offline_after_secs: 30,
            export_path: PathBuf::from(DEFAULT_EXPORT_PATH),
            fault_injection: FaultInjectionConfig::default(),
            insight: InsightConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct FaultInjectionConfig {
    pub enabled: bool,
    pub skip_probability: f64,
}

impl Default for FaultInjectionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            skip_probability: DEFAULT_SKIP_PROBABILITY,
        }
    }
}

/// Which summarizer produces insight text.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InsightBackend {
    /// OpenAI chat completions; placeholder text when no key is set.
    #[default]
    Openai,
    /// Offline rule-based bullets.
    Rules,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct InsightConfig {
    pub backend: InsightBackend,
    /// Cache validity in seconds.
    pub ttl_secs: u64,
    /// Trailing window summarized, in seconds.
    pub window_secs: u64,
    pub model: String,
    pub endpoint: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            backend: InsightBackend::default(),
            ttl_secs: 300,
            window_secs: 3600,
            model: "gpt-3.5-turbo".to_string(),
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    /// Log file used while the TUI owns the terminal.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl DashboardConfig {
    /// Load from `path` (if given) layered under `IAQ_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config: DashboardConfig = builder
            .add_source(
                Environment::with_prefix("IAQ")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML string, without environment overrides.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: DashboardConfig = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.refresh_ms == 0 {
            bail!("refresh_ms must be greater than zero");
        }
        if self.capacity == 0 {
            bail!("capacity must be greater than zero");
        }
        let p = self.fault_injection.skip_probability;
        if !(0.0..=1.0).contains(&p) {
            bail!("fault_injection.skip_probability must be within [0, 1], got {}", p);
        }
        if self.export_path.as_os_str().is_empty() {
            bail!("export_path must not be empty");
        }
        if self.rooms.iter().any(|r| r.trim().is_empty()) {
            bail!("room names must not be empty");
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }

    pub fn offline_after(&self) -> Duration {
        Duration::from_secs(self.offline_after_secs)
    }

    pub fn faults(&self) -> FaultInjection {
        FaultInjection {
            enabled: self.fault_injection.enabled,
            skip_probability: self.fault_injection.skip_probability,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_config_uses_defaults() {
        let config = DashboardConfig::from_toml("").unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.capacity, 1440);
        assert_eq!(config.refresh_interval(), Duration::from_secs(1));
        assert_eq!(config.insight.ttl_secs, 300);
        assert_eq!(config.export_path, PathBuf::from("iaq_export.json"));
        assert!(!config.faults().enabled);
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let config = DashboardConfig::from_toml(
            r#"
            capacity = 60
            rooms = ["North", "South"]
            export_path = "/tmp/iaq/snapshot.json"

            [fault_injection]
            enabled = true

            [insight]
            backend = "rules"
            "#,
        )
        .unwrap();

        assert_eq!(config.capacity, 60);
        assert_eq!(config.rooms, vec!["North", "South"]);
        assert_eq!(config.export_path, PathBuf::from("/tmp/iaq/snapshot.json"));
        assert!(config.faults().enabled);
        assert_eq!(config.faults().skip_probability, 0.01);
        assert_eq!(config.insight.backend, InsightBackend::Rules);
        assert_eq!(config.insight.window_secs, 3600);
        assert_eq!(config.refresh_ms, 1000);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(DashboardConfig::from_toml("capacity = 0").is_err());
        assert!(DashboardConfig::from_toml("refresh_ms = 0").is_err());
        assert!(DashboardConfig::from_toml("[fault_injection]\nskip_probability = 1.5").is_err());
        assert!(DashboardConfig::from_toml("rooms = [\"\"]").is_err());
        assert!(DashboardConfig::from_toml("export_path = \"\"").is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "refresh_ms = 250\nseed = 7").unwrap();

        let config = DashboardConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.refresh_ms, 250);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(DashboardConfig::load(Some(Path::new("/nonexistent/iaq.toml"))).is_err());
    }
}

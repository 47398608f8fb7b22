//! Natural-language insights over recent conditions.
//!
//! A [`Summarizer`] turns [`WindowStats`] into a short text block. The
//! [`InsightService`] caches the result for a fixed interval and swaps in a
//! placeholder whenever the backend fails, so callers always get text.

mod rules;
mod service;

#[cfg(feature = "openai")]
mod openai;

pub use rules::RuleSummarizer;
pub use service::{InsightCache, InsightService, DEFAULT_TTL, NO_INSIGHTS};

#[cfg(feature = "openai")]
pub use openai::{OpenAiSummarizer, OpenAiSummarizerBuilder};

use std::fmt::Debug;

use async_trait::async_trait;
use thiserror::Error;

use crate::data::{Metric, WindowStats};

/// Errors a summarizer backend can report.
#[derive(Debug, Error)]
pub enum InsightError {
    /// No API key configured.
    #[error("{0} not set")]
    MissingCredentials(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The backend answered with an error status.
    #[error("API returned status {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The backend answered without any text.
    #[error("Empty response")]
    Empty,

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,
}

/// Produces insight text from window statistics.
#[async_trait]
pub trait Summarizer: Send + Sync + Debug {
    async fn summarize(&self, stats: &WindowStats) -> Result<String, InsightError>;

    /// Short backend name for logs and the status bar.
    fn name(&self) -> &str;
}

/// Text shown instead of a real insight when the backend is unavailable.
pub fn placeholder(stats: &WindowStats, reason: &str) -> String {
    let co2 = match stats.mean(Metric::Co2) {
        Some(avg) => format!("- Average CO₂ is {:.0} ppm", avg),
        None => "- No readings collected yet".to_string(),
    };
    format!(
        "⚠ {} – showing placeholder\n{}\n- All parameters within normal range",
        reason, co2
    )
}

/// Run `backend`, converting any failure into [`placeholder`] text.
pub async fn summarize_or_placeholder(backend: &dyn Summarizer, stats: &WindowStats) -> String {
    match backend.summarize(stats).await {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(backend = backend.name(), error = %err, "insight backend failed");
            let reason = match err {
                InsightError::MissingCredentials(_) => err.to_string(),
                other => format!("Insight backend error: {}", other),
            };
            placeholder(stats, &reason)
        }
    }
}

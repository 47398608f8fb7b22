//! OpenAI chat-completions summarizer.
//!
//! Sends the window statistics as a compact JSON prompt and returns the
//! model's bullet insights.
//!
//! ## Example
//!
//! ```rust,no_run
//! use iaq_dashboard::insight::{OpenAiSummarizer, Summarizer};
//! use iaq_dashboard::WindowStats;
//!
//! # tokio_test::block_on(async {
//! let summarizer = OpenAiSummarizer::builder()
//!     .api_key_from_env("OPENAI_API_KEY")
//!     .model("gpt-3.5-turbo")
//!     .build();
//!
//! let text = summarizer.summarize(&WindowStats::default()).await;
//! # });
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{InsightError, Summarizer};
use crate::data::WindowStats;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

const MAX_TOKENS: u32 = 120;
const TEMPERATURE: f32 = 0.3;

/// Summarizer backed by an OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiSummarizer {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    api_key_env: String,
}

impl OpenAiSummarizer {
    /// Create a new builder for configuring the summarizer.
    pub fn builder() -> OpenAiSummarizerBuilder {
        OpenAiSummarizerBuilder::default()
    }

    /// Whether an API key was found.
    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    fn prompt(stats: &WindowStats) -> String {
        format!(
            "You are a building-health analyst. Given the following 1-hour environmental \
             stats (JSON), write 2-3 concise bullet insights plus one actionable \
             recommendation:\n{}",
            stats.to_summary_json()
        )
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, stats: &WindowStats) -> Result<String, InsightError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(InsightError::MissingCredentials(self.api_key_env.clone()));
        };

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: Self::prompt(stats),
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(InsightError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse =
            response.json().await.map_err(|e| InsightError::Parse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(InsightError::Empty)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

impl From<reqwest::Error> for InsightError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            InsightError::Timeout
        } else {
            InsightError::Http(err.to_string())
        }
    }
}

/// Builder for [`OpenAiSummarizer`].
#[derive(Debug)]
pub struct OpenAiSummarizerBuilder {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    api_key_env: String,
    timeout: Duration,
}

impl Default for OpenAiSummarizerBuilder {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout: Duration::from_secs(20),
        }
    }
}

impl OpenAiSummarizerBuilder {
    /// Set the API base URL (default: `https://api.openai.com/v1`).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Read the API key from environment variable `var`. Empty values count as unset.
    pub fn api_key_from_env(mut self, var: &str) -> Self {
        self.api_key_env = var.to_string();
        self.api_key = std::env::var(var).ok().filter(|k| !k.trim().is_empty());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> OpenAiSummarizer {
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        OpenAiSummarizer {
            client,
            endpoint: self.endpoint,
            model: self.model,
            api_key: self.api_key,
            api_key_env: self.api_key_env,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Metrics, Reading};
    use chrono::Utc;

    #[tokio::test]
    async fn missing_key_is_reported_without_a_request() {
        let summarizer = OpenAiSummarizer::builder()
            .api_key_from_env("IAQ_TEST_KEY_THAT_IS_NEVER_SET")
            .endpoint("http://127.0.0.1:9")
            .build();
        assert!(!summarizer.has_credentials());

        let err = summarizer.summarize(&WindowStats::default()).await.unwrap_err();
        assert!(matches!(
            err,
            InsightError::MissingCredentials(ref var) if var == "IAQ_TEST_KEY_THAT_IS_NEVER_SET"
        ));
    }

    #[test]
    fn prompt_embeds_summary_json() {
        let readings = vec![Reading::new(Utc::now(), "Lab", Metrics::new(900.0, 22.0, 45.0, 8.0))];
        let prompt = OpenAiSummarizer::prompt(&WindowStats::from_readings(&readings));
        assert!(prompt.starts_with("You are a building-health analyst."));
        assert!(prompt.contains("\"co2_avg\":900.0"));
        assert!(prompt.contains("\"rows\":1"));
    }

    #[test]
    fn response_parsing_takes_first_choice() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"  - fine\n"}}]}"#;
        let body: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.choices[0].message.content.trim(), "- fine");
    }

    #[test]
    fn endpoint_trailing_slash_is_trimmed() {
        let s = OpenAiSummarizer::builder().endpoint("http://localhost:8080/v1/").build();
        assert_eq!(s.endpoint, "http://localhost:8080/v1");
    }
}

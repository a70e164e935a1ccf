//! Instant-answer lookup over the DuckDuckGo API.
//!
//! Privacy posture: no cookie store, `DNT: 1`, a fixed User-Agent and a
//! documentation-range `X-Forwarded-For`. Lookups never fail towards the
//! caller; every problem collapses into a fallback reply.

use crate::config::SearchConfig;
use regex::Regex;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Reply when the lookup could not be completed.
pub const UNREACHABLE: &str = "Sorry, I couldn't reach DuckDuckGo.";

/// Reply when the lookup succeeded but had nothing to say.
pub const NO_RESULTS: &str = "No results found.";

/// Reply to questions about IP addresses.
pub const IP_REFUSAL: &str = "I\u{2019}m not allowed to share IP address information.";

/// Related topics quoted when there is no direct answer.
const MAX_TOPICS: usize = 3;

static IP_QUERY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:ip|my|your|the|your own|user's?)\s*ip\s*(?:address)?\b")
        .expect("IP query pattern is valid")
});

/// True for text asking about someone's IP address.
pub fn is_ip_query(text: &str) -> bool {
    !text.is_empty() && IP_QUERY_RE.is_match(text)
}

#[derive(Debug, Error)]
enum LookupError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error("lookup budget exceeded")]
    Timeout,
}

fn is_retryable_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 500 | 502 | 503 | 504)
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Pick the reply from an instant-answer payload.
///
/// `Answer`, else `AbstractText`, else up to three related topic texts
/// joined by `" | "`.
pub fn select_answer(data: &Value) -> String {
    if let Some(answer) = non_empty_str(data.get("Answer")) {
        return answer.to_string();
    }
    if let Some(text) = non_empty_str(data.get("AbstractText")) {
        return text.to_string();
    }

    let topics: Vec<&str> = data
        .get("RelatedTopics")
        .and_then(Value::as_array)
        .map(|topics| {
            topics
                .iter()
                .filter_map(|t| non_empty_str(t.get("Text")))
                .take(MAX_TOPICS)
                .collect()
        })
        .unwrap_or_default();

    if topics.is_empty() {
        NO_RESULTS.to_string()
    } else {
        topics.join(" | ")
    }
}

/// Instant-answer lookup client.
pub struct SearchClient {
    http_client: reqwest::Client,
    api_url: String,
    budget: Duration,
    max_retries: u32,
    backoff: Duration,
}

impl SearchClient {
    /// Create a new client with the given configuration.
    pub fn new(config: &SearchConfig) -> Self {
        let budget = Duration::from_secs(config.timeout_secs.max(1));

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static("dnt"), HeaderValue::from_static("1"));
        match HeaderValue::from_str(&config.forwarded_for) {
            Ok(value) => {
                headers.insert(HeaderName::from_static("x-forwarded-for"), value);
            }
            Err(e) => warn!(error = %e, "Ignoring invalid search.forwarded_for"),
        }

        let http_client = reqwest::Client::builder()
            .timeout(budget)
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        info!(
            api_url = %config.api_url,
            timeout_secs = budget.as_secs(),
            max_retries = config.max_retries,
            "Search client initialized"
        );

        Self {
            http_client,
            api_url: config.api_url.clone(),
            budget,
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.backoff_ms),
        }
    }

    /// Look up `query` and return the reply text. Never fails.
    pub async fn query(&self, query: &str) -> String {
        let result = match tokio::time::timeout(self.budget, self.fetch(query)).await {
            Ok(result) => result,
            Err(_) => Err(LookupError::Timeout),
        };

        match result {
            Ok(data) => {
                let answer = select_answer(&data);
                let outcome = if answer == NO_RESULTS { "empty" } else { "answered" };
                crate::metrics::record_search(outcome);
                answer
            }
            Err(e) => {
                error!(error = %e, "DuckDuckGo request failed");
                crate::metrics::record_search("failed");
                UNREACHABLE.to_string()
            }
        }
    }

    async fn fetch(&self, query: &str) -> Result<Value, LookupError> {
        let mut attempt = 0;
        loop {
            let response = self
                .http_client
                .get(&self.api_url)
                .query(&[
                    ("q", query),
                    ("format", "json"),
                    ("no_redirect", "1"),
                    ("skip_disambig", "1"),
                ])
                .send()
                .await;

            let retry_reason = match response {
                Ok(resp) if resp.status().is_success() => return Ok(resp.json().await?),
                Ok(resp) if is_retryable_status(resp.status()) => {
                    LookupError::Status(resp.status())
                }
                Ok(resp) => return Err(LookupError::Status(resp.status())),
                Err(e) if e.is_builder() => return Err(e.into()),
                Err(e) => LookupError::Http(e),
            };

            if attempt >= self.max_retries {
                return Err(retry_reason);
            }
            let delay = self.backoff.saturating_mul(2u32.saturating_pow(attempt));
            debug!(attempt, delay_ms = delay.as_millis() as u64, error = %retry_reason, "Retrying lookup");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

use std::time::{Duration, Instant};

use chatlink_core::{ChatError, ChatResponse};
use serde_json::Value;

/// Longest slice of an error body kept for diagnostics.
const ERROR_BODY_SNIPPET_CHARS: usize = 200;

/// A raw answer from the backend: any status, body not yet interpreted.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub status: u16,
    pub body: String,
}

impl Exchange {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Interpret a message/test endpoint answer. Non-2xx statuses and 2xx bodies
    /// without reply text are classified as errors.
    pub fn into_chat_response(self) -> Result<ChatResponse, ChatError> {
        if !self.is_success() {
            return Err(ChatError::from_status(self.status, snippet(&self.body)));
        }
        let parsed: ChatResponse = serde_json::from_str(&self.body)
            .map_err(|e| ChatError::Unknown(format!("malformed response body: {e}")))?;
        if parsed.text().is_none() {
            return Err(ChatError::Unknown(
                "response carried no reply text".to_string(),
            ));
        }
        Ok(parsed)
    }

    /// Error for a non-2xx exchange, `None` on success.
    pub fn status_error(&self) -> Option<ChatError> {
        (!self.is_success()).then(|| ChatError::from_status(self.status, snippet(&self.body)))
    }
}

/// Result of one request plus how long it took, successful or not.
#[derive(Debug)]
pub struct Timed<T> {
    pub latency_ms: u64,
    pub result: T,
}

/// Thin wrapper over `reqwest` that never panics and classifies transport failures.
#[derive(Debug, Clone)]
pub struct Transport {
    http: reqwest::Client,
}

impl Transport {
    pub fn new() -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("chatlink/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }

    pub async fn get(&self, url: &str, timeout: Duration) -> Timed<Result<Exchange, ChatError>> {
        let started = Instant::now();
        let req = self.http.get(url).timeout(timeout);
        let result = execute(req, timeout).await;
        Timed {
            latency_ms: elapsed_ms(started),
            result,
        }
    }

    pub async fn post_json(
        &self,
        url: &str,
        body: &Value,
        token: Option<&str>,
        timeout: Duration,
    ) -> Timed<Result<Exchange, ChatError>> {
        let started = Instant::now();
        let mut req = self.http.post(url).timeout(timeout).json(body);
        if let Some(t) = token {
            req = req.header("Authorization", format!("Bearer {t}"));
        }
        let result = execute(req, timeout).await;
        Timed {
            latency_ms: elapsed_ms(started),
            result,
        }
    }
}

async fn execute(req: reqwest::RequestBuilder, timeout: Duration) -> Result<Exchange, ChatError> {
    let resp = req.send().await.map_err(|e| classify(e, timeout))?;
    let status = resp.status().as_u16();
    let body = resp.text().await.map_err(|e| classify(e, timeout))?;
    Ok(Exchange { status, body })
}

fn classify(err: reqwest::Error, timeout: Duration) -> ChatError {
    if err.is_timeout() {
        ChatError::NetworkUnavailable(format!(
            "request timed out after {}ms",
            timeout.as_millis()
        ))
    } else if err.is_connect() || err.is_request() {
        ChatError::NetworkUnavailable(err.to_string())
    } else {
        ChatError::Unknown(err.to_string())
    }
}

pub(crate) fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= ERROR_BODY_SNIPPET_CHARS {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(ERROR_BODY_SNIPPET_CHARS).collect();
    format!("{cut}…")
}

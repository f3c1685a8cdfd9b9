use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

pub const DEFAULT_LANGUAGE: &str = "en";

/// Caller-supplied context for one outbound message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageContext {
    /// BCP-47-ish language tag ("en", "de", ...). Defaults to English.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Whether the backend should stream. Only forwarded by formats that carry it.
    #[serde(default)]
    pub stream: bool,
}

impl MessageContext {
    pub fn with_language(language: impl Into<String>) -> Self {
        Self {
            language: Some(language.into()),
            ..Self::default()
        }
    }

    pub fn language(&self) -> &str {
        self.language
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LANGUAGE)
    }
}

/// What every request format is built from.
#[derive(Debug, Clone)]
pub struct PayloadInput<'a> {
    pub message: &'a str,
    pub client_id: &'a str,
    pub conversation_id: Option<&'a str>,
    pub context: &'a MessageContext,
    pub timestamp: DateTime<Utc>,
}

/// Successful response body of the test and message endpoints.
/// Older deployments answer with `message`, newer ones with `response`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub tokens_used: Option<u64>,
    #[serde(default)]
    pub processing_time_ms: Option<u64>,
    #[serde(default)]
    pub confidence_score: Option<f64>,
}

impl ChatResponse {
    /// Reply text, preferring `response` over `message`. Blank strings count as absent.
    pub fn text(&self) -> Option<&str> {
        self.response
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.message.as_deref().filter(|t| !t.trim().is_empty()))
    }
}

/// The single result type handed back to the UI layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reply {
    pub success: bool,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
    pub latency_ms: u64,
    /// True when `text` was produced locally instead of by the backend.
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Name of the request format that produced this reply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
}

impl Reply {
    /// Failure that carries no text at all (missing credential, blank input).
    pub fn hard_failure(kind: ErrorKind) -> Self {
        Self {
            success: false,
            text: String::new(),
            conversation_id: None,
            tokens_used: None,
            latency_ms: 0,
            degraded: false,
            error: Some(kind.code().to_string()),
            format: None,
            confidence_score: None,
            processing_time_ms: None,
        }
    }

    /// Failure absorbed locally: fallback text, flagged as degraded.
    pub fn degraded(text: String, code: &str, latency_ms: u64) -> Self {
        Self {
            success: false,
            text,
            conversation_id: None,
            tokens_used: None,
            latency_ms,
            degraded: true,
            error: Some(code.to_string()),
            format: None,
            confidence_score: None,
            processing_time_ms: None,
        }
    }
}

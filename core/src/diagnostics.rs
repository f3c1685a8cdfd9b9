use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which operation produced a diagnostic record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptPhase {
    Probe,
    Send,
}

/// Outcome of one probe or send attempt. Observability only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiagnosticRecord {
    pub format: String,
    pub phase: AttemptPhase,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl DiagnosticRecord {
    pub fn success(format: &str, phase: AttemptPhase, http_status: u16, latency_ms: u64) -> Self {
        Self {
            format: format.to_string(),
            phase,
            success: true,
            http_status: Some(http_status),
            latency_ms,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failure(
        format: &str,
        phase: AttemptPhase,
        http_status: Option<u16>,
        latency_ms: u64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            format: format.to_string(),
            phase,
            success: false,
            http_status,
            latency_ms,
            error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }
}

/// Aggregate view over the records currently held by a ledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LedgerSummary {
    pub total: usize,
    pub successes: usize,
    pub failures: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Mean latency of successful attempts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_success_latency_ms: Option<u64>,
}

impl LedgerSummary {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a DiagnosticRecord>) -> Self {
        let mut summary = LedgerSummary::default();
        let mut latency_sum: u64 = 0;

        for record in records {
            summary.total += 1;
            if record.success {
                summary.successes += 1;
                latency_sum = latency_sum.saturating_add(record.latency_ms);
            } else {
                summary.failures += 1;
                if record.error.is_some() {
                    summary.last_error = record.error.clone();
                }
            }
        }

        if summary.successes > 0 {
            summary.avg_success_latency_ms = Some(latency_sum / summary.successes as u64);
        }
        summary
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tri-state backend health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthTier {
    Healthy,
    Degraded,
    Down,
}

impl HealthTier {
    pub fn as_str(self) -> &'static str {
        match self {
            HealthTier::Healthy => "healthy",
            HealthTier::Degraded => "degraded",
            HealthTier::Down => "down",
        }
    }
}

/// Current connection state. A single value, overwritten on every check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionStatus {
    pub is_connected: bool,
    pub tier: HealthTier,
    /// Absent until the first check or send outcome.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConnectionStatus {
    pub fn unknown() -> Self {
        Self {
            is_connected: false,
            tier: HealthTier::Down,
            last_checked: None,
            latency_ms: None,
            error: None,
        }
    }

    /// Status for a reachable backend; `tier` decides healthy vs. slow.
    pub fn reachable(tier: HealthTier, latency_ms: u64) -> Self {
        Self {
            is_connected: true,
            tier,
            last_checked: Some(Utc::now()),
            latency_ms: Some(latency_ms),
            error: None,
        }
    }

    pub fn failed(is_connected: bool, tier: HealthTier, latency_ms: Option<u64>, error: String) -> Self {
        Self {
            is_connected,
            tier,
            last_checked: Some(Utc::now()),
            latency_ms,
            error: Some(error),
        }
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self::unknown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_status_is_down_and_unchecked() {
        let status = ConnectionStatus::unknown();
        assert!(!status.is_connected);
        assert_eq!(status.tier, HealthTier::Down);
        assert!(status.last_checked.is_none());
    }

    #[test]
    fn tier_serializes_snake_case() {
        assert_eq!(serde_json::to_value(HealthTier::Degraded).unwrap(), "degraded");
        assert_eq!(HealthTier::Healthy.as_str(), "healthy");
    }
}

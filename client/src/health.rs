use std::time::{Duration, Instant};

use chatlink_core::{ChatError, ConnectionStatus, ErrorKind, HealthTier};

use crate::config::ClientConfig;
use crate::transport::Transport;

/// Owns the single current `ConnectionStatus`.
///
/// A Healthy result younger than `min_interval` is served from cache unless the
/// caller forces a check. Degraded and Down results are always re-checked.
pub struct HealthMonitor {
    url: String,
    timeout: Duration,
    min_interval: Duration,
    degraded_threshold: Duration,
    status: ConnectionStatus,
    checked_at: Option<Instant>,
}

impl HealthMonitor {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            url: config.health_url(),
            timeout: config.health_timeout,
            min_interval: config.health_min_interval,
            degraded_threshold: config.degraded_threshold,
            status: ConnectionStatus::unknown(),
            checked_at: None,
        }
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    fn cache_is_fresh(&self) -> bool {
        self.status.tier == HealthTier::Healthy
            && self
                .checked_at
                .is_some_and(|at| at.elapsed() < self.min_interval)
    }

    fn tier_for_latency(&self, latency_ms: u64) -> HealthTier {
        if u128::from(latency_ms) >= self.degraded_threshold.as_millis() {
            HealthTier::Degraded
        } else {
            HealthTier::Healthy
        }
    }

    pub async fn check_health(&mut self, transport: &Transport, force: bool) -> ConnectionStatus {
        if !force && self.cache_is_fresh() {
            tracing::debug!("serving cached health status");
            return self.status.clone();
        }

        let timed = transport.get(&self.url, self.timeout).await;
        let status = match timed.result {
            Ok(exchange) if exchange.is_success() => {
                let tier = self.tier_for_latency(timed.latency_ms);
                if tier == HealthTier::Degraded {
                    tracing::warn!(latency_ms = timed.latency_ms, "health check slow");
                }
                ConnectionStatus::reachable(tier, timed.latency_ms)
            }
            Ok(exchange) => {
                tracing::warn!(status = exchange.status, "health check failed");
                ConnectionStatus::failed(
                    false,
                    HealthTier::Down,
                    Some(timed.latency_ms),
                    format!("health endpoint returned HTTP {}", exchange.status),
                )
            }
            Err(e) => {
                tracing::warn!(error = %e, "health check unreachable");
                ConnectionStatus::failed(false, HealthTier::Down, None, e.to_string())
            }
        };

        self.store(status.clone());
        status
    }

    /// A send went through; the backend is evidently up.
    pub fn record_success(&mut self, latency_ms: u64) {
        let tier = self.tier_for_latency(latency_ms);
        self.store(ConnectionStatus::reachable(tier, latency_ms));
    }

    /// A send failed. An answering backend is Degraded, a silent one is Down.
    pub fn record_failure(&mut self, error: &ChatError, latency_ms: u64) {
        let status = match error.kind() {
            ErrorKind::ValidationRejected | ErrorKind::ServerError => ConnectionStatus::failed(
                true,
                HealthTier::Degraded,
                Some(latency_ms),
                error.to_string(),
            ),
            _ => ConnectionStatus::failed(false, HealthTier::Down, None, error.to_string()),
        };
        self.store(status);
    }

    fn store(&mut self, status: ConnectionStatus) {
        if status.tier != self.status.tier {
            tracing::info!(
                from = self.status.tier.as_str(),
                to = status.tier.as_str(),
                "connection tier changed"
            );
        }
        self.status = status;
        self.checked_at = Some(Instant::now());
    }
}

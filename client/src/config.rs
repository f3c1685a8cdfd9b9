use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_API_VERSION: &str = "v1";
pub const DEFAULT_LEDGER_CAPACITY: usize = 50;
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 8_000;
pub const DEFAULT_HEALTH_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_SEND_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_HEALTH_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_DEGRADED_THRESHOLD_MS: u64 = 2_000;

const LEDGER_CAPACITY_MIN: u64 = 1;
const LEDGER_CAPACITY_MAX: u64 = 10_000;
const TIMEOUT_MS_MIN: u64 = 100;
const TIMEOUT_MS_MAX: u64 = 120_000;
const HEALTH_INTERVAL_SECS_MAX: u64 = 3_600;

pub const API_URL_ENV: &str = "CHATLINK_API_URL";
pub const API_VERSION_ENV: &str = "CHATLINK_API_VERSION";
pub const LEDGER_CAPACITY_ENV: &str = "CHATLINK_LEDGER_CAPACITY";
pub const PROBE_TIMEOUT_ENV: &str = "CHATLINK_PROBE_TIMEOUT_MS";
pub const HEALTH_TIMEOUT_ENV: &str = "CHATLINK_HEALTH_TIMEOUT_MS";
pub const SEND_TIMEOUT_ENV: &str = "CHATLINK_SEND_TIMEOUT_MS";
pub const HEALTH_INTERVAL_ENV: &str = "CHATLINK_HEALTH_INTERVAL_SECS";
pub const DEGRADED_THRESHOLD_ENV: &str = "CHATLINK_DEGRADED_THRESHOLD_MS";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("invalid API version '{0}'")]
    InvalidApiVersion(String),
}

/// Everything a `ChatClient` needs to know about the backend it talks to.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Origin of the chat backend, without trailing slash.
    pub base_url: String,
    /// Path segment in front of `/chat/...`, e.g. `v1`.
    pub api_version: String,
    pub ledger_capacity: usize,
    pub probe_timeout: Duration,
    pub health_timeout: Duration,
    pub send_timeout: Duration,
    /// A Healthy status younger than this is served from cache.
    pub health_min_interval: Duration,
    /// Successful health checks slower than this count as Degraded.
    pub degraded_threshold: Duration,
    /// Starting index into the fallback templates.
    pub fallback_seed: usize,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim().trim_end_matches('/').to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            ledger_capacity: DEFAULT_LEDGER_CAPACITY,
            probe_timeout: Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS),
            health_timeout: Duration::from_millis(DEFAULT_HEALTH_TIMEOUT_MS),
            send_timeout: Duration::from_millis(DEFAULT_SEND_TIMEOUT_MS),
            health_min_interval: Duration::from_secs(DEFAULT_HEALTH_INTERVAL_SECS),
            degraded_threshold: Duration::from_millis(DEFAULT_DEGRADED_THRESHOLD_MS),
            fallback_seed: 0,
        }
    }

    /// Build from `CHATLINK_*` environment variables. Unparseable numbers fall back
    /// to defaults; out-of-range numbers are clamped.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let mut config = Self::new(base_url).with_env_overrides();
        if let Ok(version) = std::env::var(API_VERSION_ENV) {
            config.api_version = version;
        }
        config.validate()?;
        Ok(config)
    }

    /// Apply the numeric `CHATLINK_*` tunables on top of an existing config.
    /// The base URL and API version are left alone.
    pub fn with_env_overrides(mut self) -> Self {
        let config = &mut self;
        config.ledger_capacity = parse_env_u64_with_bounds(
            std::env::var(LEDGER_CAPACITY_ENV).ok(),
            LEDGER_CAPACITY_MIN,
            LEDGER_CAPACITY_MAX,
            DEFAULT_LEDGER_CAPACITY as u64,
        ) as usize;
        config.probe_timeout = Duration::from_millis(parse_env_u64_with_bounds(
            std::env::var(PROBE_TIMEOUT_ENV).ok(),
            TIMEOUT_MS_MIN,
            TIMEOUT_MS_MAX,
            DEFAULT_PROBE_TIMEOUT_MS,
        ));
        config.health_timeout = Duration::from_millis(parse_env_u64_with_bounds(
            std::env::var(HEALTH_TIMEOUT_ENV).ok(),
            TIMEOUT_MS_MIN,
            TIMEOUT_MS_MAX,
            DEFAULT_HEALTH_TIMEOUT_MS,
        ));
        config.send_timeout = Duration::from_millis(parse_env_u64_with_bounds(
            std::env::var(SEND_TIMEOUT_ENV).ok(),
            TIMEOUT_MS_MIN,
            TIMEOUT_MS_MAX,
            DEFAULT_SEND_TIMEOUT_MS,
        ));
        config.health_min_interval = Duration::from_secs(parse_env_u64_with_bounds(
            std::env::var(HEALTH_INTERVAL_ENV).ok(),
            0,
            HEALTH_INTERVAL_SECS_MAX,
            DEFAULT_HEALTH_INTERVAL_SECS,
        ));
        config.degraded_threshold = Duration::from_millis(parse_env_u64_with_bounds(
            std::env::var(DEGRADED_THRESHOLD_ENV).ok(),
            TIMEOUT_MS_MIN,
            TIMEOUT_MS_MAX,
            DEFAULT_DEGRADED_THRESHOLD_MS,
        ));
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_ledger_capacity(mut self, capacity: usize) -> Self {
        self.ledger_capacity = capacity.max(1);
        self
    }

    pub fn with_timeouts(mut self, probe: Duration, health: Duration, send: Duration) -> Self {
        self.probe_timeout = probe;
        self.health_timeout = health;
        self.send_timeout = send;
        self
    }

    pub fn with_health_policy(mut self, min_interval: Duration, degraded_threshold: Duration) -> Self {
        self.health_min_interval = min_interval;
        self.degraded_threshold = degraded_threshold;
        self
    }

    pub fn with_fallback_seed(mut self, seed: usize) -> Self {
        self.fallback_seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let parsed = url::Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }
        if parsed.query().is_some() {
            return Err(ConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: "base URL must not carry a query string".to_string(),
            });
        }

        let version = self.api_version.trim_matches('/');
        if version.is_empty() || version.contains(['/', '?', '#', ' ']) {
            return Err(ConfigError::InvalidApiVersion(self.api_version.clone()));
        }
        Ok(())
    }

    pub fn health_url(&self) -> String {
        format!("{}/health", self.base_url)
    }

    /// Probe-only endpoint, before any format suffix.
    pub fn test_endpoint(&self) -> String {
        format!("{}/{}/chat/test", self.base_url, self.api_version.trim_matches('/'))
    }

    /// Production message endpoint, before any format suffix.
    pub fn message_endpoint(&self) -> String {
        format!("{}/{}/chat/message", self.base_url, self.api_version.trim_matches('/'))
    }
}

fn parse_env_u64_with_bounds(raw: Option<String>, min: u64, max: u64, default: u64) -> u64 {
    match raw.and_then(|value| value.trim().parse::<u64>().ok()) {
        Some(parsed) => parsed.clamp(min, max),
        None => default,
    }
}

//! Adaptive client for a chat backend with an unstable request contract.
//!
//! A [`ChatClient`] owns every piece of mutable state (client identity,
//! conversation id, negotiated request format, connection status and the
//! diagnostic ledger), so independent clients never share caches. All
//! operations take `&mut self`: one client has at most one request in flight.

use std::sync::Arc;

use chatlink_core::{ConnectionStatus, DiagnosticRecord, LedgerSummary};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub mod config;
mod dispatch;
pub mod fallback;
pub mod health;
pub mod identity;
pub mod ledger;
pub mod preference;
pub mod probe;
pub mod session;
pub mod store;
pub mod token;
pub mod transport;

pub use config::{ClientConfig, ConfigError};
pub use dispatch::MAX_SEND_ATTEMPTS;
pub use fallback::FallbackResponder;
pub use health::HealthMonitor;
pub use identity::ClientIdentity;
pub use ledger::DiagnosticLedger;
pub use preference::FormatPreference;
pub use probe::SchemaProbe;
pub use session::ConversationSession;
pub use store::{FileStore, MemoryStore, StateStore, StoreError};
pub use token::{EnvToken, StaticToken, TokenProvider};
pub use transport::Transport;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Everything a status feed needs in one value.
#[derive(Debug, Clone, Serialize)]
pub struct ClientSnapshot {
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_format: Option<String>,
    pub connection: ConnectionStatus,
    pub diagnostics: LedgerSummary,
}

pub struct ChatClient {
    config: ClientConfig,
    transport: Transport,
    tokens: Arc<dyn TokenProvider>,
    identity: ClientIdentity,
    session: ConversationSession,
    preference: FormatPreference,
    probe: SchemaProbe,
    health: HealthMonitor,
    ledger: DiagnosticLedger,
    fallback: FallbackResponder,
}

impl ChatClient {
    pub fn new(
        config: ClientConfig,
        store: Arc<dyn StateStore>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self, ClientError> {
        config.validate()?;
        let transport = Transport::new()?;
        Ok(Self::with_transport(config, store, tokens, transport))
    }

    /// Like [`ChatClient::new`] but with a caller-built transport (custom TLS,
    /// proxies). The config is assumed valid.
    pub fn with_transport(
        config: ClientConfig,
        store: Arc<dyn StateStore>,
        tokens: Arc<dyn TokenProvider>,
        transport: Transport,
    ) -> Self {
        let identity = ClientIdentity::load_or_create(&store);
        let session = ConversationSession::load(store.clone());
        let preference = FormatPreference::load(store);

        tracing::debug!(
            client_id = %identity.client_id(),
            conversation_id = session.current().unwrap_or("-"),
            cached_format = preference.name().unwrap_or("-"),
            base_url = %config.base_url,
            "chat client ready"
        );

        Self {
            probe: SchemaProbe::new(&config),
            health: HealthMonitor::new(&config),
            ledger: DiagnosticLedger::new(config.ledger_capacity),
            fallback: FallbackResponder::new(config.fallback_seed),
            config,
            transport,
            tokens,
            identity,
            session,
            preference,
        }
    }

    /// Replace the fallback generator, e.g. with a fixed selector.
    pub fn set_fallback(&mut self, fallback: FallbackResponder) {
        self.fallback = fallback;
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn client_id(&self) -> &str {
        self.identity.client_id()
    }

    /// Current credential from the configured provider, if any.
    pub fn bearer_token(&self) -> Option<String> {
        self.tokens.bearer_token()
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.session.current()
    }

    pub fn cached_format(&self) -> Option<&str> {
        self.preference.name()
    }

    pub fn connection_status(&self) -> &ConnectionStatus {
        self.health.status()
    }

    pub fn ledger(&self) -> &DiagnosticLedger {
        &self.ledger
    }

    pub fn diagnostics(&self) -> Vec<DiagnosticRecord> {
        self.ledger.recent()
    }

    pub fn clear_diagnostics(&mut self) {
        self.ledger.clear();
    }

    /// Sweep all candidate formats against the test endpoint, log every attempt,
    /// and cache the first format that succeeded. With no success the cached
    /// preference is left as it was.
    pub async fn probe_all(&mut self, auth_token: Option<&str>) -> Vec<DiagnosticRecord> {
        let records = self
            .probe
            .probe_all(&self.transport, self.identity.client_id(), auth_token)
            .await;

        for record in &records {
            self.ledger.append(record.clone());
        }

        match SchemaProbe::select(&records) {
            Some(winner) => self.preference.set(winner.name),
            None => tracing::warn!(
                attempts = records.len(),
                "no request format accepted by the test endpoint"
            ),
        }
        records
    }

    /// Current connection status, re-checked unless a fresh Healthy result is cached.
    pub async fn check_health(&mut self, force: bool) -> ConnectionStatus {
        self.health.check_health(&self.transport, force).await
    }

    /// Start over: forget the conversation and the negotiated format.
    pub fn reset(&mut self) {
        tracing::info!("resetting conversation and cached format");
        self.session.reset();
        self.preference.clear();
    }

    /// Forget the negotiated format but keep the conversation.
    pub fn clear_format_cache(&mut self) {
        self.preference.clear();
    }

    pub fn snapshot(&self) -> ClientSnapshot {
        ClientSnapshot {
            client_id: self.identity.client_id().to_string(),
            conversation_id: self.session.current().map(str::to_string),
            conversation_started_at: self.session.created_at(),
            cached_format: self.preference.name().map(str::to_string),
            connection: self.health.status().clone(),
            diagnostics: self.ledger.summary(),
        }
    }
}

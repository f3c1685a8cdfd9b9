use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::store::{StateStore, keys};

/// Server-issued conversation id, persisted so a conversation survives restarts.
///
/// The id stays unset until the backend hands one out. Once set it is echoed on
/// every send until `reset`.
pub struct ConversationSession {
    store: Arc<dyn StateStore>,
    id: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl ConversationSession {
    pub fn load(store: Arc<dyn StateStore>) -> Self {
        let id = store
            .get(keys::CONVERSATION_ID)
            .filter(|id| !id.trim().is_empty());
        let created_at = id.as_ref().and_then(|_| {
            store
                .get(keys::CONVERSATION_STARTED_AT)
                .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
                .map(|ts| ts.with_timezone(&Utc))
        });
        Self {
            store,
            id,
            created_at,
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Take over the id the server returned. The server is authoritative, so a
    /// different id replaces the current one.
    pub fn adopt(&mut self, id: &str) {
        let id = id.trim();
        if id.is_empty() || self.id.as_deref() == Some(id) {
            return;
        }

        let now = Utc::now();
        tracing::info!(
            conversation_id = %id,
            previous = self.id.as_deref().unwrap_or("-"),
            "adopting conversation id"
        );
        self.id = Some(id.to_string());
        self.created_at = Some(now);

        if let Err(e) = self.store.set(keys::CONVERSATION_ID, id) {
            tracing::warn!(error = %e, "failed to persist conversation id");
        }
        if let Err(e) = self.store.set(keys::CONVERSATION_STARTED_AT, &now.to_rfc3339()) {
            tracing::warn!(error = %e, "failed to persist conversation start time");
        }
    }

    /// Forget the conversation. The next send starts a new one.
    pub fn reset(&mut self) {
        self.id = None;
        self.created_at = None;
        if let Err(e) = self.store.remove(keys::CONVERSATION_ID) {
            tracing::warn!(error = %e, "failed to clear persisted conversation id");
        }
        if let Err(e) = self.store.remove(keys::CONVERSATION_STARTED_AT) {
            tracing::warn!(error = %e, "failed to clear persisted conversation start time");
        }
    }
}

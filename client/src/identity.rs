use std::sync::Arc;

use chatlink_core::identity::{generate_client_id, is_valid_client_id};

use crate::store::{StateStore, keys};

/// Stable per-installation client id. Generated once, never rotated here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    client_id: String,
}

impl ClientIdentity {
    /// Load the persisted id, generating and persisting one on first use.
    /// A failed write still yields a usable id for this process.
    pub fn load_or_create(store: &Arc<dyn StateStore>) -> Self {
        if let Some(existing) = store.get(keys::CLIENT_ID).filter(|id| is_valid_client_id(id)) {
            return Self {
                client_id: existing.trim().to_string(),
            };
        }

        let client_id = generate_client_id();
        tracing::info!(client_id = %client_id, "generated new client id");
        if let Err(e) = store.set(keys::CLIENT_ID, &client_id) {
            tracing::warn!(error = %e, "failed to persist client id; it will change on restart");
        }
        Self { client_id }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

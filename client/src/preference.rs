use std::sync::Arc;

use chatlink_core::{CandidateSchema, formats};

use crate::store::{StateStore, keys};

/// The request format last known to work. At most one at a time.
///
/// "Unset" means no format has ever been confirmed; callers then send the
/// catalog default without treating it as verified.
pub struct FormatPreference {
    store: Arc<dyn StateStore>,
    name: Option<String>,
}

impl FormatPreference {
    pub fn load(store: Arc<dyn StateStore>) -> Self {
        let name = store
            .get(keys::SUCCESSFUL_FORMAT)
            .filter(|n| !n.trim().is_empty());
        Self { store, name }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The cached format, if it still exists in the catalog.
    pub fn resolved(&self) -> Option<&'static CandidateSchema> {
        let name = self.name.as_deref()?;
        let found = formats::find(name);
        if found.is_none() {
            tracing::warn!(format = %name, "cached format no longer in catalog; ignoring");
        }
        found
    }

    pub fn set(&mut self, name: &str) {
        if self.name.as_deref() == Some(name) {
            return;
        }
        tracing::info!(format = %name, "caching successful request format");
        self.name = Some(name.to_string());
        if let Err(e) = self.store.set(keys::SUCCESSFUL_FORMAT, name) {
            tracing::warn!(error = %e, "failed to persist request format");
        }
    }

    pub fn clear(&mut self) {
        self.name = None;
        if let Err(e) = self.store.remove(keys::SUCCESSFUL_FORMAT) {
            tracing::warn!(error = %e, "failed to clear persisted request format");
        }
    }
}

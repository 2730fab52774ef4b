//! The explicitly constructed context every relay component is built from.

use std::path::PathBuf;
use std::sync::Arc;

use kbrelay_core::Provider;
use kbrelay_store::DocumentStore;

/// Everything a request needs: where the documents live and how to reach
/// the model. Cheap to clone; holds no per-request state.
#[derive(Clone)]
pub struct RelayContext {
    pub store: DocumentStore,
    pub provider: Arc<dyn Provider>,
    pub model: String,
    pub max_tokens: Option<u32>,
}

impl RelayContext {
    pub fn new(
        knowledge_root: impl Into<PathBuf>,
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            store: DocumentStore::new(knowledge_root),
            provider,
            model: model.into(),
            max_tokens: None,
        }
    }

    /// Cap generated tokens per model call.
    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

impl std::fmt::Debug for RelayContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayContext")
            .field("root", &self.store.root())
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

//! Shared test helpers for relay tests.

use std::sync::{Arc, Mutex};

use kbrelay_core::error::ProviderError;
use kbrelay_core::message::Message;
use kbrelay_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use kbrelay_core::{CompanyId, DocumentKind};
use kbrelay_store::DocumentStore;
use tempfile::TempDir;

use crate::context::RelayContext;

/// A provider that replays scripted results and records every request.
///
/// Panics if more calls are made than results provided.
pub struct ScriptedProvider {
    results: Mutex<Vec<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(results: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            results: Mutex::new(results),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };

        let mut results = self.results.lock().unwrap();
        if results.is_empty() {
            panic!("ScriptedProvider: no more results (call #{call})");
        }

        results.remove(0).map(|text| ProviderResponse {
            message: Message::assistant(text),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: "mock-model".into(),
        })
    }
}

/// A temporary knowledge base plus a context wired to `provider`.
pub fn fixture(provider: Arc<ScriptedProvider>) -> (TempDir, RelayContext) {
    let dir = TempDir::new().unwrap();
    let context = RelayContext::new(dir.path(), provider, "mock-model");
    (dir, context)
}

pub async fn put(store: &DocumentStore, company: &str, kind: DocumentKind, text: &str) {
    let id = CompanyId::parse(company).unwrap();
    store.write(&id, kind, text).await.unwrap();
}

//! Provider construction from configuration.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kbrelay_core::error::ProviderError;
use kbrelay_core::provider::{Provider, ProviderRequest, ProviderResponse};

use crate::openai_compat::OpenAiCompatProvider;

/// Build the chat-completion provider described by `config`.
///
/// Fails with `NotConfigured` when no API key is available from the config
/// file or the environment.
pub fn build_from_config(
    config: &kbrelay_config::AppConfig,
) -> Result<Arc<dyn Provider>, ProviderError> {
    let api_key = config
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| ProviderError::NotConfigured(MISSING_KEY.into()))?;

    let name = provider_name(&config.api_url);
    tracing::debug!(provider = name, url = %config.api_url, "Building provider");

    let provider = OpenAiCompatProvider::new(name, &config.api_url, api_key)
        .with_timeout(Duration::from_secs(config.request_timeout_secs));

    Ok(Arc::new(provider))
}

/// Like `build_from_config`, but a missing API key yields an
/// `UnconfiguredProvider` instead of an error, so document-only features
/// keep working.
pub fn build_or_unconfigured(config: &kbrelay_config::AppConfig) -> Arc<dyn Provider> {
    match build_from_config(config) {
        Ok(provider) => provider,
        Err(e) => {
            tracing::warn!(error = %e, "No model provider; questions will get a configuration error");
            Arc::new(UnconfiguredProvider)
        }
    }
}

const MISSING_KEY: &str =
    "no API key: set KBRELAY_API_KEY or OPENAI_API_KEY, or api_key in config.toml";

/// Stands in for the model when no API key is set. Every call fails with
/// `NotConfigured` without touching the network.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredProvider;

#[async_trait]
impl Provider for UnconfiguredProvider {
    fn name(&self) -> &str {
        "unconfigured"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::NotConfigured(MISSING_KEY.into()))
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        Ok(false)
    }
}

/// Derive a display name from the endpoint URL.
fn provider_name(api_url: &str) -> &'static str {
    if api_url.contains("api.openai.com") {
        "openai"
    } else if api_url.contains("openrouter.ai") {
        "openrouter"
    } else if api_url.contains("localhost:11434") {
        "ollama"
    } else {
        "custom"
    }
}

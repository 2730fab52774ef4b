pub mod ask;
pub mod companies;
pub mod doctor;
pub mod onboard;
pub mod policy;
pub mod resolve;
pub mod serve;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use kbrelay_config::AppConfig;
use kbrelay_core::Provider;
use kbrelay_providers::UnconfiguredProvider;
use kbrelay_relay::{RelayContext, RequestFacade};

/// The config file in effect: `--config` if given, else the default path.
pub fn config_path(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path)
}

pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    AppConfig::load_with_overrides(&config_path(path))
        .map_err(|e| format!("Failed to load config: {e}").into())
}

fn facade_with(config: &AppConfig, provider: Arc<dyn Provider>) -> RequestFacade {
    let context = RelayContext::new(config.knowledge_root.clone(), provider, config.model.clone())
        .with_max_tokens(config.max_tokens);
    RequestFacade::new(context)
}

/// A façade that can reach the model. Fails early without an API key.
pub fn online_facade(config: &AppConfig) -> Result<RequestFacade, Box<dyn std::error::Error>> {
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    KBRELAY_API_KEY=sk-...");
        eprintln!("    OPENAI_API_KEY=sk-...");
        eprintln!();
        eprintln!("  Or add api_key to your config file:");
        eprintln!("    {}", AppConfig::config_path().display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }
    let provider = kbrelay_providers::build_from_config(config)?;
    Ok(facade_with(config, provider))
}

/// A façade for commands that only touch the document store.
pub fn offline_facade(config: &AppConfig) -> RequestFacade {
    let provider: Arc<dyn Provider> = match kbrelay_providers::build_from_config(config) {
        Ok(provider) => provider,
        Err(_) => Arc::new(UnconfiguredProvider),
    };
    facade_with(config, provider)
}

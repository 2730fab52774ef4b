//! `kbrelay serve` — Start the HTTP gateway.

use std::path::Path;

use super::load_config;

pub async fn run(
    config_path: Option<&Path>,
    host_override: Option<String>,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(config_path)?;

    if let Some(host) = host_override {
        config.gateway.host = host;
    }
    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("kbrelay gateway");
    println!("   Listening:      http://{}:{}", config.gateway.host, config.gateway.port);
    println!("   Knowledge root: {}", config.knowledge_root.display());
    println!("   Model:          {}", config.model);

    kbrelay_gateway::start(config).await?;

    Ok(())
}

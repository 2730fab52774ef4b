//! `kbrelay companies` — List companies and their documents.

use std::path::Path;

use super::{load_config, offline_facade};

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let companies = offline_facade(&config).companies().await?;

    println!("Knowledge root: {}", config.knowledge_root.display());
    if companies.is_empty() {
        println!("  (no companies — create a folder per company with a `companyinfo` file)");
        return Ok(());
    }

    println!("  {:<32} {:<10} POLICY", "COMPANY", "KNOWLEDGE");
    for c in &companies {
        println!(
            "  {:<32} {:<10} {}",
            c.name,
            if c.has_knowledge { "yes" } else { "missing" },
            if c.has_policy { "yes" } else { "-" }
        );
    }
    println!("\n  {} compan{}", companies.len(), if companies.len() == 1 { "y" } else { "ies" });

    Ok(())
}

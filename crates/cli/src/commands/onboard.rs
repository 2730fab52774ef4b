//! `kbrelay onboard` — First-time setup.

use std::path::Path;

use kbrelay_config::AppConfig;

use super::{config_path, load_config};

pub async fn run(config_override: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path(config_override);

    println!("kbrelay — First-Time Setup");
    println!("==========================\n");

    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
        && !dir.exists()
    {
        std::fs::create_dir_all(dir)?;
        println!("  Created config directory: {}", dir.display());
    }

    let created = if path.exists() {
        println!("  Config already exists at: {}", path.display());
        println!("  Edit it manually or delete it and re-run onboard.");
        false
    } else {
        std::fs::write(&path, AppConfig::default_toml())?;
        println!("  Created config: {}", path.display());
        true
    };

    let config = load_config(Some(&path))?;
    let root = &config.knowledge_root;
    if root.exists() {
        println!("  Knowledge root exists: {}", root.display());
    } else {
        std::fs::create_dir_all(root)?;
        println!("  Created knowledge root: {}", root.display());
    }

    println!("\nKnowledge base layout:");
    println!("   {}/<Company>/companyinfo   facts answers are drawn from (required)", root.display());
    println!("   {}/<Company>/policy        what must be redacted (optional)", root.display());

    println!("\nNext steps:");
    let mut step = 1;
    if created || !config.has_api_key() {
        println!("   {step}. Set KBRELAY_API_KEY, or add api_key to {}", path.display());
        step += 1;
    }
    println!("   {step}. Add a company folder with a companyinfo file");
    println!("   {}. Run: kbrelay ask \"What is <Company>'s refund policy?\"", step + 1);
    println!();

    Ok(())
}

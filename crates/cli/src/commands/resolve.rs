//! `kbrelay resolve` — Show the company a question resolves to.

use std::path::Path;

use kbrelay_relay::resolver::MATCH_THRESHOLD;

use super::{load_config, offline_facade};

pub async fn run(config_path: Option<&Path>, question: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let resolution = offline_facade(&config).resolve(question).await?;

    let Some(matched) = resolution.matched else {
        println!("No companies in {}", config.knowledge_root.display());
        return Ok(());
    };

    println!(
        "  {:<28} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "COMPANY", "PARTIAL", "TOKENS", "KEYWORD", "BONUS", "TOTAL"
    );
    for s in &resolution.scores {
        println!(
            "  {:<28} {:>8.1} {:>8.1} {:>8.1} {:>8.1} {:>8.1}",
            s.company, s.partial, s.token_sort, s.keyword, s.bonus, s.total
        );
    }
    println!();

    if matched.is_forced_default() {
        println!(
            "  No company reached {MATCH_THRESHOLD:.0}; defaulting to '{}' (0% confidence)",
            matched.company
        );
    } else {
        println!(
            "  Resolved to '{}' ({:.0}% confidence)",
            matched.company, matched.confidence
        );
    }

    Ok(())
}

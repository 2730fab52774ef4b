//! `kbrelay doctor` — Diagnose configuration and connectivity.

use std::path::Path;

use kbrelay_config::AppConfig;
use kbrelay_core::Provider;

use super::{config_path, offline_facade};

pub async fn run(config_override: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("kbrelay doctor");
    println!("==============\n");

    let mut issues = 0;

    // Config
    let path = config_path(config_override);
    if !path.exists() {
        println!("  ⚠️  No config file at {} — using defaults (run `kbrelay onboard`)", path.display());
    }
    let config = match AppConfig::load_with_overrides(&path) {
        Ok(config) => {
            println!("  ✅ Config valid (model: {}, endpoint: {})", config.model, config.api_url);
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  1 issue found. Fix the config and re-run.");
            return Ok(());
        }
    };

    // API key
    let provider = match kbrelay_providers::build_from_config(&config) {
        Ok(provider) => {
            println!("  ✅ API key configured");
            Some(provider)
        }
        Err(e) => {
            println!("  ❌ {e}");
            issues += 1;
            None
        }
    };

    // Knowledge base
    let root = &config.knowledge_root;
    if root.is_dir() {
        println!("  ✅ Knowledge root exists: {}", root.display());
        match offline_facade(&config).companies().await {
            Ok(companies) if companies.is_empty() => {
                println!("  ⚠️  No companies yet — add a folder per company");
                issues += 1;
            }
            Ok(companies) => {
                let missing: Vec<&str> = companies
                    .iter()
                    .filter(|c| !c.has_knowledge)
                    .map(|c| c.name.as_str())
                    .collect();
                let with_policy = companies.iter().filter(|c| c.has_policy).count();
                println!(
                    "  ✅ {} companies ({with_policy} with a policy)",
                    companies.len()
                );
                if !missing.is_empty() {
                    println!("  ⚠️  Missing companyinfo: {}", missing.join(", "));
                    issues += 1;
                }
            }
            Err(e) => {
                println!("  ❌ Cannot list companies: {e}");
                issues += 1;
            }
        }
    } else {
        println!("  ❌ Knowledge root missing: {} (run `kbrelay onboard`)", root.display());
        issues += 1;
    }

    // Provider reachability
    if let Some(provider) = provider {
        match provider.health_check().await {
            Ok(true) => {
                println!("  ✅ Provider '{}' reachable", provider.name());
                match provider.list_models().await {
                    Ok(models) => match model_listing(&config.model, &models) {
                        ModelListing::Listed => println!("  ✅ Model '{}' available", config.model),
                        ModelListing::Unlisted => {
                            println!(
                                "  ⚠️  Model '{}' not in the provider's {} listed models",
                                config.model,
                                models.len()
                            );
                            issues += 1;
                        }
                        ModelListing::Unknown => {
                            println!("  ⚠️  Provider did not list any models; skipping model check")
                        }
                    },
                    Err(e) => println!("  ⚠️  Could not list models: {e}"),
                }
            }
            Ok(false) => {
                println!("  ⚠️  Provider '{}' responded but reported unhealthy", provider.name());
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Provider '{}' unreachable: {e}", provider.name());
                issues += 1;
            }
        }
    }

    println!();
    if issues == 0 {
        println!("  All checks passed!");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum ModelListing {
    Listed,
    Unlisted,
    /// Some OpenAI-compatible servers return an empty list.
    Unknown,
}

fn model_listing(model: &str, models: &[String]) -> ModelListing {
    if models.is_empty() {
        ModelListing::Unknown
    } else if models.iter().any(|m| m == model) {
        ModelListing::Listed
    } else {
        ModelListing::Unlisted
    }
}

//! `kbrelay policy` — Show or replace a company's policy.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use kbrelay_relay::Reply;

use super::{load_config, offline_facade};

#[derive(Subcommand)]
pub enum PolicyAction {
    /// Print the current policy (empty when none exists)
    Show {
        /// Company folder name
        company: String,
    },

    /// Overwrite the policy
    Set {
        /// Company folder name
        company: String,

        /// Read the new policy from a file
        #[arg(short, long, conflicts_with = "content")]
        file: Option<PathBuf>,

        /// The new policy text
        #[arg(short, long)]
        content: Option<String>,
    },
}

pub async fn run(config_path: Option<&Path>, action: PolicyAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let facade = offline_facade(&config);

    let reply = match action {
        PolicyAction::Show { company } => facade.load_policy(Some(&company)).await,
        PolicyAction::Set {
            company,
            file,
            content,
        } => {
            let content = match (file, content) {
                (Some(path), _) => std::fs::read_to_string(&path)
                    .map_err(|e| format!("Failed to read {}: {e}", path.display()))?,
                (None, Some(content)) => content,
                (None, None) => return Err("Provide the policy with --file or --content".into()),
            };
            facade.save_policy(Some(&company), &content).await
        }
    };

    match reply {
        Reply::Ok { text, .. } => {
            println!("{text}");
            Ok(())
        }
        Reply::Failed { error, .. } => Err(error.into()),
    }
}

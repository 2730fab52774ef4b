//! kbrelay CLI — the main entry point.
//!
//! Commands:
//! - `onboard`   — Write the default config and create the knowledge root
//! - `ask`       — Answer a question, in-process or through a running gateway
//! - `resolve`   — Show which company a question resolves to
//! - `companies` — List companies and their documents
//! - `policy`    — Show or replace a company's policy
//! - `serve`     — Start the HTTP gateway and policy editor
//! - `doctor`    — Diagnose configuration and connectivity

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "kbrelay",
    about = "kbrelay — company knowledge relay with policy-based redaction",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.kbrelay/config.toml
    #[arg(short, long, global = true, env = "KBRELAY_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default config and create the knowledge root
    Onboard,

    /// Answer a question from the knowledge base
    Ask {
        /// The question
        question: String,

        /// Send the question to a running gateway instead (e.g. http://127.0.0.1:8000)
        #[arg(short, long)]
        server: Option<String>,
    },

    /// Show which company a question resolves to, without calling the model
    Resolve {
        /// The question
        question: String,
    },

    /// List companies and the documents they hold
    Companies,

    /// Show or replace a company's policy
    Policy {
        #[command(subcommand)]
        action: commands::policy::PolicyAction,
    },

    /// Start the HTTP gateway and policy editor
    Serve {
        /// Override the bind address
        #[arg(long)]
        host: Option<String>,

        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Diagnose configuration and connectivity
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing. Logs go to stderr so answers on stdout stay clean.
    let filter = match (&cli.command, cli.verbose) {
        (_, true) => "debug",
        (Commands::Serve { .. }, false) => "info",
        _ => "warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Onboard => commands::onboard::run(config).await?,
        Commands::Ask { question, server } => commands::ask::run(config, &question, server).await?,
        Commands::Resolve { question } => commands::resolve::run(config, &question).await?,
        Commands::Companies => commands::companies::run(config).await?,
        Commands::Policy { action } => commands::policy::run(config, action).await?,
        Commands::Serve { host, port } => commands::serve::run(config, host, port).await?,
        Commands::Doctor => commands::doctor::run(config).await?,
    }

    Ok(())
}

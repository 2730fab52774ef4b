//! `kbrelay ask` — Answer a question in-process or through a gateway.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{load_config, online_facade};

#[derive(Serialize)]
struct AskRequest<'a> {
    question: &'a str,
}

#[derive(Deserialize)]
struct AskResponse {
    answer: String,
}

pub async fn run(
    config_path: Option<&Path>,
    question: &str,
    server: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;

    let answer = match server {
        Some(server) => {
            ask_remote(&server, question, Duration::from_secs(config.request_timeout_secs * 2))
                .await?
        }
        None => online_facade(&config)?.ask(question).await,
    };

    println!("{answer}");
    Ok(())
}

/// Relay the question to a running gateway's `/ask` route.
async fn ask_remote(
    server: &str,
    question: &str,
    timeout: Duration,
) -> Result<String, Box<dyn std::error::Error>> {
    let url = format!("{}/ask", server.trim_end_matches('/'));
    tracing::debug!(url = %url, "Relaying question to gateway");

    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let response = client
        .post(&url)
        .json(&AskRequest { question })
        .send()
        .await
        .map_err(|e| format!("Could not reach gateway at {server}: {e}"))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(format!("Gateway returned {status}: {body}").into());
    }

    let body: AskResponse = response.json().await?;
    Ok(body.answer)
}

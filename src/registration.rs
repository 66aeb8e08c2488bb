/// Registration with the parent orchestrator
///
/// On startup the node announces itself to Proxeus so it can be used in
/// workflows. The announcement is retried until the orchestrator accepts it.

use anyhow::{bail, Result};
use serde::Serialize;
use std::time::Duration;

const REGISTER_PATH: &str = "api/admin/external/register";
pub const NODE_DETAIL: &str = "Send Emails";

/// What the orchestrator needs to call this node back
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub id: String,
    pub name: String,
    pub detail: String,
    pub url: String,
    pub secret: String,
}

impl Registration {
    pub fn new(service_name: &str, service_url: &str, jwt_secret: &str) -> Self {
        Self {
            id: service_name.to_string(),
            name: service_name.to_string(),
            detail: NODE_DETAIL.to_string(),
            url: service_url.to_string(),
            secret: jwt_secret.to_string(),
        }
    }
}

/// Single registration attempt
pub async fn register(client: &reqwest::Client, proxeus_url: &str, node: &Registration) -> Result<()> {
    let url = format!("{}/{}", proxeus_url.trim_end_matches('/'), REGISTER_PATH);
    let response = client.post(&url).json(node).send().await?;

    let status = response.status();
    if !status.is_success() {
        bail!("orchestrator rejected registration with {}", status);
    }
    Ok(())
}

/// Register, retrying every `interval` until the orchestrator accepts
///
/// Returns the number of attempts it took.
pub async fn register_with_retry(proxeus_url: String, node: Registration, interval: Duration) -> u32 {
    let client = reqwest::Client::new();
    let mut attempts = 0;

    loop {
        attempts += 1;
        match register(&client, &proxeus_url, &node).await {
            Ok(()) => {
                tracing::info!("✅ Registered node '{}' with {}", node.name, proxeus_url);
                return attempts;
            }
            Err(e) => {
                tracing::warn!(
                    "🔁 Registration attempt {} with {} failed: {} (retrying in {:?})",
                    attempts,
                    proxeus_url,
                    e,
                    interval
                );
                tokio::time::sleep(interval).await;
            }
        }
    }
}

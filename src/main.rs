/// node-mail-sender entry point
///
/// Loads configuration from the environment (and an optional `.env` file) and
/// starts the node. The server provides:
/// - Health check at /health
/// - Workflow step at /node/{id}/next
/// - Settings form at /node/{id}/config

use node_mail_sender::{config::Config, server::start_server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    start_server(config).await?;

    Ok(())
}

use anyhow::{Context, Result};
use sandbox_server::config::ServerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up a local .env file when present
    dotenvy::dotenv().ok();

    // Load configuration from environment variables
    let config = ServerConfig::load().context("Failed to load configuration")?;

    // Run the server using the library's run function
    sandbox_server::run(config).await.context("Server error")?;

    Ok(())
}

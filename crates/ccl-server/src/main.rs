use anyhow::Context;

use ccl_server::{AppState, CclServer, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = match std::env::var("CCL_CONFIG") {
        Ok(path) => ServerConfig::load(&path).with_context(|| format!("loading {path}"))?,
        Err(_) => ServerConfig::default(),
    };

    let parts = AppState::in_memory(&config)?;
    CclServer::new(config, parts.state).serve().await?;
    Ok(())
}

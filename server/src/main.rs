use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tts_cache_server::{build_router, AppState, ServerConfig};
use tts_client::GoogleTtsClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    async_main().await
}

async fn async_main() -> anyhow::Result<()> {
    info!("Starting TTS cache server...");

    let config = ServerConfig::from_env().context("Failed to load configuration")?;

    let client = GoogleTtsClient::with_endpoint(
        config.api_key.clone(),
        config.api_url.clone(),
        config.synthesis_timeout(),
    )
    .context("Failed to build synthesis client")?;
    info!("Synthesis endpoint: {}", client.endpoint());

    let port = config.port;
    let state = AppState::new(config, Arc::new(client));
    state.cache.ensure_dir().await.with_context(|| {
        format!("Failed to create output dir {}", state.cache.dir().display())
    })?;

    info!(
        "Server configuration loaded: port={}, output_dir={}, voice={}, rate_limit={}/min",
        port,
        state.cache.dir().display(),
        state.config.voice.voice,
        state.config.rate_limit_per_minute
    );

    let app = build_router(state)?;

    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        anyhow::anyhow!("Failed to bind {addr}: {e}. Try a different PORT.")
    })?;

    info!("Server running at http://localhost:{}/tts?text=你好世界", port);
    axum::serve(listener, app).await?;
    Ok(())
}

// Set up an OAuth client in Google Cloud console
// - Authorized redirect URI: http://localhost:8080/api/oauth/callback
// - Enable Site Verification, Search Console and Indexing APIs
// Set .env file
// ```.env
// GOOGLE_CLIENT_ID="your_client_id"
// GOOGLE_CLIENT_SECRET="your_client_secret"
// REDIRECT_URI="http://localhost:8080/api/oauth/callback"
// BIND_ADDR="0.0.0.0:8080"
// ```
// finally ```cargo run```
use std::sync::Arc;

use anyhow::Context;
use tiny_search_console::{
    config::Config,
    executer::GoogleClient,
    routes::{AppState, router},
    session::Authenticator,
    store::{MemoryStore, StateStore, TokenStore},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log settings
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Read environment
    let config = Arc::new(Config::from_env().context("Failed to read config")?);
    let bind_addr = dotenvy::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    // One store backs both credentials and pending OAuth states
    let kv = Arc::new(MemoryStore::new());
    let tokens = TokenStore::new(kv.clone(), config.token_ttl());
    let states = StateStore::new(kv, config.state_ttl());

    let api = Arc::new(GoogleClient::new(config.clone()).context("Failed to build http client")?);
    let auth = Authenticator::new(config.clone(), api.clone(), tokens, states);
    let app = router(AppState::new(auth, api));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!("Listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;
    info!("Server stopped");
    anyhow::Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

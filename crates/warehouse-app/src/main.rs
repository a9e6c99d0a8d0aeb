use std::sync::Arc;
use std::time::Duration;

use warehouse_hex::application::AppState;
use warehouse_hex::auth::tokens::TokenService;
use warehouse_hex::config::Config;
use warehouse_hex::inbound::http::{HttpServer, HttpServerConfig};
use warehouse_hex::inbound::rpc::{RpcServer, RpcServerConfig};
use warehouse_repo::build_store;
use warehouse_types::ports::clock::SystemClock;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for DATABASE_URL / ports / TOKEN_SECRET when present.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string()))
        .init();

    let config = Config::from_env()?;
    let store = build_store(config.database_url.as_deref()).await?;
    let tokens = Arc::new(TokenService::new(
        config.token_secret.as_bytes(),
        config.token_ttl_secs,
    ));
    let state = Arc::new(
        AppState::new(store, SystemClock, tokens)
            .with_store_deadline(Duration::from_millis(config.store_deadline_ms)),
    );

    let http = HttpServer::new(
        state.clone(),
        HttpServerConfig {
            port: config.http_port.clone(),
        },
    );
    let rpc = RpcServer::new(
        state,
        RpcServerConfig {
            port: config.rpc_port.clone(),
        },
    );

    tokio::try_join!(http.run(), rpc.run())?;
    Ok(())
}

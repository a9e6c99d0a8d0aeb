use serde::Deserialize;
use std::env;

use crate::auth::tokens::DEFAULT_TTL_SECS;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub http_port: String,
    pub rpc_port: String,
    pub database_url: Option<String>,
    pub token_secret: String,
    pub token_ttl_secs: i64,
    pub store_deadline_ms: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let http_port = env::var("HTTP_PORT").unwrap_or_else(|_| "3000".into());
        let rpc_port = env::var("RPC_PORT").unwrap_or_else(|_| "3100".into());
        let database_url = env::var("DATABASE_URL").ok();
        let token_secret = env::var("TOKEN_SECRET").unwrap_or_else(|_| {
            tracing::warn!("TOKEN_SECRET not set, using an insecure development secret");
            "insecure-dev-secret".into()
        });
        let token_ttl_secs = env::var("TOKEN_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TTL_SECS);
        let store_deadline_ms = env::var("STORE_DEADLINE_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5000);
        Ok(Self {
            http_port,
            rpc_port,
            database_url,
            token_secret,
            token_ttl_secs,
            store_deadline_ms,
        })
    }
}

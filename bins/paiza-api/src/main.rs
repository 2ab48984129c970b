mod handlers;
mod routes;

use anyhow::{Context, Result};
use axum::Router;
use paiza_common::config::{ClientConfig, RunOptions};
use paiza_runner::{PaizaClient, RunnerApi, TestSession};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

pub struct AppState {
    pub api: Arc<dyn RunnerApi>,
    pub options: RunOptions,
    pub session: TestSession,
}

impl AppState {
    pub fn new(api: Arc<dyn RunnerApi>, options: RunOptions) -> Self {
        Self {
            session: TestSession::new(api.clone(), options),
            api,
            options,
        }
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new().merge(routes::routes()).with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Paiza API booting...");

    let config = ClientConfig::from_env();
    info!(api_base = %config.api_base, "Using runner service");

    let options = config.run;
    let client = PaizaClient::new(config).context("Failed to create runner client")?;
    let state = Arc::new(AppState::new(Arc::new(client), options));

    let addr = std::env::var("PAIZA_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app(state))
        .await
        .context("Server error")?;

    Ok(())
}

use std::time::Duration;

use pain_or_gains::api::router::create_router;
use pain_or_gains::config::AppConfig;
use pain_or_gains::{db, init_tracing, metrics, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);

    tracing::info!("Connecting to database...");
    let pool = db::init_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    tracing::info!("Database connected");

    let metrics_handle = metrics::init_metrics();
    let upkeep_handle = metrics_handle.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(5));
        loop {
            tick.tick().await;
            upkeep_handle.run_upkeep();
        }
    });

    if config.demo_mode {
        tracing::warn!("DEMO_MODE is on: known demo wallets fall back to sample trades");
    }
    tracing::info!(
        solana_rpc = %redact(&config.solana_rpc_url()),
        base_rpc = %redact(&config.base_rpc_url()),
        alchemy = config.alchemy_api_key.is_some(),
        "Chain endpoints configured"
    );

    let state = AppState::new(pool, config, metrics_handle)?;
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Keep scheme and host only; keys live in paths and query strings.
fn redact(url: &str) -> String {
    match reqwest::Url::parse(url) {
        Ok(u) => format!("{}://{}", u.scheme(), u.host_str().unwrap_or_default()),
        Err(_) => "<invalid url>".into(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}

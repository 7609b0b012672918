pub mod analysis;
pub mod api;
pub mod chains;
pub mod config;
pub mod db;
pub mod errors;
pub mod indexer;
pub mod metrics;
pub mod models;
pub mod tokens;

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::indexer::TransactionIndexer;
use crate::models::Transaction;
use crate::tokens::TtlCache;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: AppConfig,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
    pub indexer: Arc<TransactionIndexer>,
    pub tx_cache: Arc<TtlCache<Vec<Transaction>>>,
}

impl AppState {
    /// Wire the outbound clients and caches from configuration.
    pub fn new(
        db: sqlx::PgPool,
        config: AppConfig,
        metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
    ) -> anyhow::Result<Self> {
        let http = build_http_client(&config)?;
        let indexer = Arc::new(TransactionIndexer::from_config(http, &config));
        let tx_cache = Arc::new(TtlCache::new(Duration::from_secs(config.cache_ttl_secs)));

        Ok(Self {
            db,
            config,
            metrics_handle,
            indexer,
            tx_cache,
        })
    }
}

pub fn build_http_client(config: &AppConfig) -> anyhow::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .user_agent(concat!("pain-or-gains/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Install the global tracing subscriber. `RUST_LOG` filters; set
/// `LOG_FORMAT=json` for JSON lines.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(EnvFilter::from_default_env());

    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

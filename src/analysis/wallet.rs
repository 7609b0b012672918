use std::time::Instant;

use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use serde::Serialize;

use super::fifo::match_trades;
use super::validation::normalize_address;
use crate::db::{stats_repo, transaction_repo};
use crate::errors::AppError;
use crate::indexer::demo::demo_transactions;
use crate::models::{Blockchain, PnlStats, TokenHolding, TokenPosition, TradeStats, Transaction};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct WalletOverview {
    pub wallet_address: String,
    pub blockchain: Blockchain,
    pub stats: PnlStats,
    pub last_analyzed: Option<DateTime<Utc>>,
    pub positions: Vec<TokenPosition>,
    pub transaction_count: usize,
}

fn cache_key(wallet: &str, chain: Blockchain) -> String {
    format!("{chain}:{wallet}")
}

/// Stored transactions for the wallet, through the response cache. Demo data
/// stands in for an empty history only when demo mode is on.
async fn load_transactions(state: &AppState, wallet: &str, chain: Blockchain) -> anyhow::Result<Vec<Transaction>> {
    let key = cache_key(wallet, chain);
    if let Some(txs) = state.tx_cache.get(&key).await {
        return Ok(txs);
    }

    let mut txs = transaction_repo::get_transactions(&state.db, wallet, chain).await?;

    if txs.is_empty() && state.config.demo_mode {
        if let Some(demo) = demo_transactions(wallet, chain, Utc::now().timestamp()) {
            tracing::info!(wallet = %wallet, chain = %chain, "Serving demo transactions");
            counter!("demo_data_served_total").increment(1);
            txs = demo;
        }
    }

    state.tx_cache.insert(key, txs.clone()).await;
    Ok(txs)
}

/// Index, match and persist stats for one wallet.
pub async fn analyze_wallet(state: &AppState, wallet: &str, chain: Blockchain) -> Result<TradeStats, AppError> {
    let wallet = normalize_address(wallet, chain)?;
    let started = Instant::now();

    // Indexing may refresh existing rows without adding any.
    let indexed = state.indexer.index_wallet(&state.db, &wallet, chain, false).await?;
    if !indexed.skipped {
        state.tx_cache.invalidate(&cache_key(&wallet, chain)).await;
    }

    let txs = load_transactions(state, &wallet, chain).await?;
    let outcome = match_trades(&txs);
    let stats = stats_repo::upsert_stats(&state.db, &wallet, chain, &outcome.stats).await?;

    counter!("wallet_analyses_total").increment(1);
    histogram!("analysis_latency_seconds").record(started.elapsed().as_secs_f64());
    tracing::info!(
        wallet = %wallet,
        chain = %chain,
        transactions = txs.len(),
        all_time_pnl = %stats.all_time_pnl,
        "Wallet analyzed"
    );

    Ok(stats)
}

/// Per-token positions plus stats, from what is already stored. Does not
/// call out to any chain.
pub async fn wallet_overview(state: &AppState, wallet: &str, chain: Blockchain) -> Result<WalletOverview, AppError> {
    let wallet = normalize_address(wallet, chain)?;

    let txs = load_transactions(state, &wallet, chain).await?;
    let stored = stats_repo::get_stats(&state.db, &wallet, chain).await?;

    if txs.is_empty() && stored.is_none() {
        return Err(AppError::NotFound(format!(
            "No data for {wallet} on {chain}; analyze the wallet first"
        )));
    }

    let outcome = match_trades(&txs);
    let (stats, last_analyzed) = match &stored {
        Some(row) => (PnlStats::from(row), Some(row.updated_at)),
        None => (outcome.stats, None),
    };

    Ok(WalletOverview {
        wallet_address: wallet,
        blockchain: chain,
        stats,
        last_analyzed,
        positions: outcome.positions,
        transaction_count: txs.len(),
    })
}

/// Live token balances held by the wallet.
pub async fn wallet_balances(state: &AppState, wallet: &str, chain: Blockchain) -> Result<Vec<TokenHolding>, AppError> {
    let wallet = normalize_address(wallet, chain)?;
    state
        .indexer
        .current_holdings(&wallet, chain)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))
}

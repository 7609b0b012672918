use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Blockchain;

/// Per-wallet indexing bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IndexerState {
    pub wallet_address: String,
    pub blockchain: String,
    /// Newest Solana signature already processed; incremental runs stop here.
    pub last_signature: Option<String>,
    /// Highest Base block already processed.
    pub last_block: Option<i64>,
    /// Oldest Solana signature reached by a run cut short by the cap; the
    /// next run continues below it.
    pub resume_before: Option<String>,
    /// Newest signature of the capped run, adopted as `last_signature` once
    /// the gap is filled.
    pub pending_signature: Option<String>,
    pub last_updated: DateTime<Utc>,
    pub is_fully_indexed: bool,
}

impl IndexerState {
    pub fn new(wallet_address: &str, chain: Blockchain) -> Self {
        Self {
            wallet_address: wallet_address.to_string(),
            blockchain: chain.as_str().to_string(),
            last_signature: None,
            last_block: None,
            resume_before: None,
            pending_signature: None,
            last_updated: Utc::now(),
            is_fully_indexed: false,
        }
    }

    /// True when the wallet was fully indexed less than `max_age` ago.
    pub fn is_fresh(&self, max_age: chrono::Duration) -> bool {
        self.is_fully_indexed && Utc::now() - self.last_updated < max_age
    }
}

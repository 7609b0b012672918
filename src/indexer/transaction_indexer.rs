use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use metrics::counter;
use reqwest::Client;
use sqlx::PgPool;

use super::rate_limit::RateLimiter;
use crate::chains::alchemy::AlchemyClient;
use crate::chains::base_parser::{highest_block, process_transfers, scale_amount};
use crate::chains::basescan::{BasescanClient, TokenTransfer};
use crate::chains::solana::{SolanaClient, TOKEN_2022_PROGRAM_ID, TOKEN_PROGRAM_ID};
use crate::chains::solana_parser::extract_legs;
use crate::chains::solscan::SolscanClient;
use crate::chains::TransferLeg;
use crate::config::AppConfig;
use crate::db::{indexer_state_repo, transaction_repo};
use crate::models::{Blockchain, IndexerState, TokenHolding, TokenInfo, Transaction};
use crate::tokens::TokenResolver;

/// Signatures requested per `getSignaturesForAddress` page.
pub const SIGNATURE_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone)]
pub struct IndexerSettings {
    pub max_signatures: usize,
    pub page_size: usize,
    pub page_delay: Duration,
    pub reindex_after: chrono::Duration,
}

impl IndexerSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_signatures: config.max_signatures_per_wallet,
            page_size: SIGNATURE_PAGE_SIZE.min(config.max_signatures_per_wallet.max(1)),
            page_delay: Duration::from_millis(config.page_delay_ms),
            reindex_after: chrono::Duration::seconds(config.reindex_after_secs),
        }
    }
}

/// What one `index_wallet` call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexOutcome {
    /// Transactions stored for the first time.
    pub stored: usize,
    /// The wallet was fresh and nothing was fetched.
    pub skipped: bool,
    /// History is covered up to the newest item seen, with no gaps left.
    pub complete: bool,
}

fn record_failure(chain: Blockchain, call: &str, wallet: &str, error: &dyn std::fmt::Display) {
    counter!("external_call_failures_total").increment(1);
    tracing::warn!(chain = %chain, call = call, wallet = %wallet, error = %error, "External call failed");
}

/// Pulls wallet history from chain RPCs and explorers into the
/// `transactions` table, tracking progress in `indexer_state`.
pub struct TransactionIndexer {
    solana: SolanaClient,
    basescan: BasescanClient,
    alchemy: Option<AlchemyClient>,
    resolver: Arc<TokenResolver>,
    limiter: Arc<RateLimiter>,
    settings: IndexerSettings,
}

impl TransactionIndexer {
    pub fn new(
        solana: SolanaClient,
        basescan: BasescanClient,
        alchemy: Option<AlchemyClient>,
        resolver: Arc<TokenResolver>,
        limiter: Arc<RateLimiter>,
        settings: IndexerSettings,
    ) -> Self {
        Self {
            solana,
            basescan,
            alchemy,
            resolver,
            limiter,
            settings,
        }
    }

    /// One limiter covers Alchemy and every Basescan API and Solana RPC call,
    /// including the Metaplex and `tokeninfo` lookups made during token
    /// resolution.
    pub fn from_config(http: Client, config: &AppConfig) -> Self {
        let limiter = Arc::new(RateLimiter::new(config.max_requests_per_minute as usize));
        let solana = SolanaClient::new(http.clone(), config.solana_rpc_url()).with_limiter(limiter.clone());
        let basescan = BasescanClient::new(
            http.clone(),
            config.basescan_api_url.clone(),
            config.basescan_api_key.clone(),
        )
        .with_limiter(limiter.clone());
        let solscan = SolscanClient::new(http.clone(), config.solscan_api_url.clone());
        let alchemy = config.alchemy_url().map(|url| AlchemyClient::new(http, url));

        let resolver = Arc::new(TokenResolver::from_clients(
            solana.clone(),
            solscan,
            basescan.clone(),
            Duration::from_secs(config.cache_ttl_secs),
        ));

        Self::new(
            solana,
            basescan,
            alchemy,
            resolver,
            limiter,
            IndexerSettings::from_config(config),
        )
    }

    /// Index new history for a wallet. Recently and completely indexed
    /// wallets are skipped unless `full_sync` is set. A pass that hits the
    /// per-wallet cap stores a resume point and is not complete, so the next
    /// call continues where it stopped. External failures are logged and
    /// never returned; only storage errors propagate.
    pub async fn index_wallet(
        &self,
        pool: &PgPool,
        wallet: &str,
        chain: Blockchain,
        full_sync: bool,
    ) -> anyhow::Result<IndexOutcome> {
        let mut state = indexer_state_repo::get_state(pool, wallet, chain)
            .await?
            .unwrap_or_else(|| IndexerState::new(wallet, chain));

        if !full_sync && state.is_fresh(self.settings.reindex_after) {
            tracing::debug!(wallet = %wallet, chain = %chain, "Wallet recently indexed, skipping");
            return Ok(IndexOutcome {
                skipped: true,
                complete: true,
                ..Default::default()
            });
        }

        let (stored, complete) = match chain {
            Blockchain::Solana => self.index_solana(pool, &mut state, full_sync).await?,
            Blockchain::Base => self.index_base(pool, &mut state, full_sync).await?,
        };

        state.is_fully_indexed = complete;
        state.last_updated = Utc::now();
        indexer_state_repo::save_state(pool, &state).await?;

        counter!("indexed_transactions_total").increment(stored as u64);
        tracing::info!(
            wallet = %wallet,
            chain = %chain,
            stored = stored,
            complete = complete,
            "Wallet indexing finished"
        );
        Ok(IndexOutcome {
            stored,
            skipped: false,
            complete,
        })
    }

    /// Page backwards from the newest signature. Incremental runs stop at the
    /// newest signature seen last time (`until`). A run cut short by the
    /// signature cap records where it stopped (`resume_before`) and the newest
    /// signature it saw (`pending_signature`); the next run fills the gap
    /// down to the old cursor before the cursor moves.
    async fn index_solana(
        &self,
        pool: &PgPool,
        state: &mut IndexerState,
        full_sync: bool,
    ) -> anyhow::Result<(usize, bool)> {
        let wallet = state.wallet_address.clone();

        let (mut before, until, mut newest) = match (&state.resume_before, full_sync) {
            (Some(resume), false) => (
                Some(resume.clone()),
                state.last_signature.clone(),
                state.pending_signature.clone(),
            ),
            (_, true) => (None, None, None),
            (None, false) => (None, state.last_signature.clone(), None),
        };

        let mut seen = 0usize;
        let mut stored = 0usize;
        let mut clean = true;
        let mut capped = false;

        loop {
            let page = match self
                .solana
                .get_signatures_for_address(&wallet, before.as_deref(), until.as_deref(), self.settings.page_size)
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    record_failure(Blockchain::Solana, "getSignaturesForAddress", &wallet, &e);
                    clean = false;
                    break;
                }
            };

            let Some(last) = page.last() else {
                break;
            };
            if newest.is_none() {
                newest = page.first().map(|s| s.signature.clone());
            }
            seen += page.len();

            tracing::debug!(wallet = %wallet, page = page.len(), seen = seen, "Fetched signature page");

            let mut legs: Vec<TransferLeg> = Vec::new();
            for sig in page.iter().filter(|s| s.err.is_none()) {
                match self.solana.get_transaction(&sig.signature).await {
                    Ok(Some(tx)) => {
                        let fallback_ts = sig.block_time.unwrap_or_else(|| Utc::now().timestamp());
                        legs.extend(extract_legs(&tx, &wallet, fallback_ts));
                    }
                    Ok(None) => {
                        tracing::debug!(signature = %sig.signature, "Transaction not available from node");
                    }
                    Err(e) => {
                        record_failure(Blockchain::Solana, "getTransaction", &wallet, &e);
                        clean = false;
                    }
                }
            }

            let txs = self.legs_to_transactions(legs, &wallet, Blockchain::Solana).await;
            stored += transaction_repo::upsert_transactions(pool, &txs).await?;

            if !clean {
                break;
            }
            before = Some(last.signature.clone());

            if page.len() < self.settings.page_size {
                break;
            }
            if seen >= self.settings.max_signatures {
                capped = true;
                tracing::info!(
                    wallet = %wallet,
                    limit = self.settings.max_signatures,
                    "Signature limit reached, resuming next run"
                );
                break;
            }
            tokio::time::sleep(self.settings.page_delay).await;
        }

        // The cursor only moves once everything down to it has been seen.
        if !clean {
            return Ok((stored, false));
        }
        if capped {
            state.resume_before = before;
            state.pending_signature = newest;
            return Ok((stored, false));
        }
        if newest.is_some() {
            state.last_signature = newest;
        }
        state.resume_before = None;
        state.pending_signature = None;
        Ok((stored, true))
    }

    /// One Basescan (or Alchemy) sweep above `last_block`. Only whole blocks
    /// are stored, so `last_block` is always fully covered. Over the cap, the
    /// oldest whole blocks that fit are kept and the rest comes in the next
    /// run; a single block larger than the cap is taken whole.
    async fn index_base(
        &self,
        pool: &PgPool,
        state: &mut IndexerState,
        full_sync: bool,
    ) -> anyhow::Result<(usize, bool)> {
        let wallet = state.wallet_address.clone();
        let start_block = if full_sync { None } else { state.last_block.map(|b| b + 1) };

        let Some(mut transfers) = self.fetch_base_transfers(&wallet, start_block).await else {
            return Ok((0, false));
        };

        let cap = self.settings.max_signatures.max(1);
        let capped = transfers.len() > cap;
        if capped {
            let block_of = |t: &TokenTransfer| t.block_number.trim().parse::<i64>().unwrap_or(i64::MAX);
            transfers.sort_by_key(block_of);
            let boundary = block_of(&transfers[cap]);
            if boundary > block_of(&transfers[0]) {
                transfers.retain(|t| block_of(t) < boundary);
            } else {
                transfers.retain(|t| block_of(t) == boundary);
            }
            tracing::info!(
                wallet = %wallet,
                limit = cap,
                kept = transfers.len(),
                "Transfer limit reached, resuming next run"
            );
        }

        let legs = process_transfers(&transfers, &wallet);
        let txs = self.legs_to_transactions(legs, &wallet, Blockchain::Base).await;
        let stored = transaction_repo::upsert_transactions(pool, &txs).await?;

        if let Some(block) = highest_block(&transfers) {
            state.last_block = Some(state.last_block.map_or(block, |prev| prev.max(block)));
        }
        Ok((stored, !capped))
    }

    /// Basescan first, Alchemy when Basescan fails and a key is configured.
    async fn fetch_base_transfers(&self, wallet: &str, start_block: Option<i64>) -> Option<Vec<TokenTransfer>> {
        let basescan_err = match self.basescan.token_transfers(wallet, start_block).await {
            Ok(transfers) => return Some(transfers),
            Err(e) => e,
        };
        record_failure(Blockchain::Base, "tokentx", wallet, &basescan_err);

        let alchemy = self.alchemy.as_ref()?;
        self.limiter.acquire().await;
        match alchemy.token_transfers(wallet, start_block).await {
            Ok(transfers) => {
                tracing::info!(wallet = %wallet, count = transfers.len(), "Fetched Base transfers from Alchemy");
                Some(transfers)
            }
            Err(e) => {
                record_failure(Blockchain::Base, "alchemy_getAssetTransfers", wallet, &e);
                None
            }
        }
    }

    /// Attach token names and symbols, resolving each distinct token once.
    async fn legs_to_transactions(&self, legs: Vec<TransferLeg>, wallet: &str, chain: Blockchain) -> Vec<Transaction> {
        let mut known: HashMap<String, TokenInfo> = HashMap::new();
        let mut out = Vec::with_capacity(legs.len());

        for leg in legs {
            let (name, symbol) = match (&leg.token_name, &leg.token_symbol) {
                (Some(name), Some(symbol)) => (name.clone(), symbol.clone()),
                _ => {
                    if !known.contains_key(&leg.token_address) {
                        let info = self.resolver.resolve(&leg.token_address, chain).await;
                        known.insert(leg.token_address.clone(), info);
                    }
                    let info = &known[&leg.token_address];
                    (
                        leg.token_name.clone().unwrap_or_else(|| info.name.clone()),
                        leg.token_symbol.clone().unwrap_or_else(|| info.symbol.clone()),
                    )
                }
            };

            out.push(Transaction {
                tx_hash: leg.tx_hash,
                wallet_address: wallet.to_string(),
                blockchain: chain,
                token_address: leg.token_address,
                token_name: name,
                token_symbol: symbol,
                amount: leg.amount,
                price: leg.price,
                timestamp: leg.timestamp,
                tx_type: leg.tx_type,
                dex: leg.dex,
            });
        }
        out
    }

    /// Current non-zero token balances held by the wallet.
    pub async fn current_holdings(&self, wallet: &str, chain: Blockchain) -> anyhow::Result<Vec<TokenHolding>> {
        match chain {
            Blockchain::Solana => self.solana_holdings(wallet).await,
            Blockchain::Base => self.base_holdings(wallet).await,
        }
    }

    async fn solana_holdings(&self, wallet: &str) -> anyhow::Result<Vec<TokenHolding>> {
        let mut accounts = Vec::new();
        let mut last_err = None;

        for program in [TOKEN_PROGRAM_ID, TOKEN_2022_PROGRAM_ID] {
            match self.solana.get_token_accounts_by_owner(wallet, program).await {
                Ok(found) => accounts.extend(found),
                Err(e) => {
                    record_failure(Blockchain::Solana, "getTokenAccountsByOwner", wallet, &e);
                    last_err = Some(e);
                }
            }
        }
        if accounts.is_empty() {
            if let Some(e) = last_err {
                return Err(e.into());
            }
        }

        let mut holdings = Vec::new();
        for account in accounts.into_iter().filter(|a| a.amount.amount != "0") {
            let info = self.resolver.resolve(&account.mint, Blockchain::Solana).await;
            holdings.push(TokenHolding {
                token_address: account.mint,
                token_symbol: info.symbol,
                token_name: info.name,
                amount: account.amount.to_decimal(),
                decimals: Some(account.amount.decimals),
                raw_balance: account.amount.amount,
            });
        }
        Ok(holdings)
    }

    async fn base_holdings(&self, wallet: &str) -> anyhow::Result<Vec<TokenHolding>> {
        let Some(alchemy) = &self.alchemy else {
            tracing::info!(wallet = %wallet, "Base balances need ALCHEMY_API_KEY, returning none");
            return Ok(Vec::new());
        };

        self.limiter.acquire().await;
        let balances = alchemy.token_balances(wallet).await.inspect_err(|e| {
            record_failure(Blockchain::Base, "alchemy_getTokenBalances", wallet, e);
        })?;

        let mut holdings = Vec::with_capacity(balances.len());
        for (contract, raw) in balances {
            let info = self.resolver.resolve(&contract, Blockchain::Base).await;
            holdings.push(TokenHolding {
                amount: info.decimals.and_then(|d| scale_amount(&raw, d)),
                decimals: info.decimals,
                token_address: contract,
                token_symbol: info.symbol,
                token_name: info.name,
                raw_balance: raw,
            });
        }
        Ok(holdings)
    }
}

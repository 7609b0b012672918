use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;

use super::cache::TtlCache;
use super::fallback::{lookup_fallback, placeholder};
use crate::chains::basescan::BasescanClient;
use crate::chains::metaplex::decode_metadata;
use crate::chains::solana::SolanaClient;
use crate::chains::solscan::SolscanClient;
use crate::models::{Blockchain, TokenInfo, TokenInfoSource};

/// One place token metadata can come from. Implementations log and swallow
/// their own failures; `None` means "try the next source".
#[async_trait]
pub trait TokenSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn lookup(&self, address: &str) -> Option<TokenInfo>;
}

fn record_failure(source: &str, address: &str, error: &dyn std::fmt::Display) {
    counter!("external_call_failures_total").increment(1);
    tracing::warn!(source = source, token = %address, error = %error, "Token metadata lookup failed");
}

// ---------------------------------------------------------------------------
// Solana sources
// ---------------------------------------------------------------------------

pub struct MetaplexSource {
    solana: SolanaClient,
}

impl MetaplexSource {
    pub fn new(solana: SolanaClient) -> Self {
        Self { solana }
    }
}

#[async_trait]
impl TokenSource for MetaplexSource {
    fn name(&self) -> &'static str {
        "metaplex"
    }

    async fn lookup(&self, address: &str) -> Option<TokenInfo> {
        let data = match self.solana.get_metadata_account(address).await {
            Ok(Some(data)) => data,
            Ok(None) => return None,
            Err(e) => {
                record_failure(self.name(), address, &e);
                return None;
            }
        };

        let meta = match decode_metadata(&data) {
            Ok(meta) => meta,
            Err(e) => {
                record_failure(self.name(), address, &e);
                return None;
            }
        };

        let decimals = match self.solana.get_mint_decimals(address).await {
            Ok(d) => d,
            Err(e) => {
                tracing::debug!(token = %address, error = %e, "Mint decimals unavailable");
                None
            }
        };

        TokenInfo::new(address, &meta.name, &meta.symbol, decimals, TokenInfoSource::Metaplex)
    }
}

pub struct SolscanApiSource {
    solscan: SolscanClient,
}

impl SolscanApiSource {
    pub fn new(solscan: SolscanClient) -> Self {
        Self { solscan }
    }
}

#[async_trait]
impl TokenSource for SolscanApiSource {
    fn name(&self) -> &'static str {
        "solscan_api"
    }

    async fn lookup(&self, address: &str) -> Option<TokenInfo> {
        match self.solscan.token_meta(address).await {
            Ok(meta) => TokenInfo::new(
                address,
                meta.name.as_deref().unwrap_or_default(),
                meta.symbol.as_deref().unwrap_or_default(),
                meta.decimals,
                TokenInfoSource::SolscanApi,
            ),
            Err(e) => {
                record_failure(self.name(), address, &e);
                None
            }
        }
    }
}

pub struct SolscanHtmlSource {
    solscan: SolscanClient,
}

impl SolscanHtmlSource {
    pub fn new(solscan: SolscanClient) -> Self {
        Self { solscan }
    }
}

#[async_trait]
impl TokenSource for SolscanHtmlSource {
    fn name(&self) -> &'static str {
        "solscan_html"
    }

    async fn lookup(&self, address: &str) -> Option<TokenInfo> {
        match self.solscan.scrape_token_page(address).await {
            Ok(Some((name, symbol))) => {
                TokenInfo::new(address, &name, &symbol, None, TokenInfoSource::SolscanHtml)
            }
            Ok(None) => None,
            Err(e) => {
                record_failure(self.name(), address, &e);
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Base sources
// ---------------------------------------------------------------------------

pub struct BasescanApiSource {
    basescan: BasescanClient,
}

impl BasescanApiSource {
    pub fn new(basescan: BasescanClient) -> Self {
        Self { basescan }
    }
}

#[async_trait]
impl TokenSource for BasescanApiSource {
    fn name(&self) -> &'static str {
        "basescan_api"
    }

    async fn lookup(&self, address: &str) -> Option<TokenInfo> {
        match self.basescan.token_info(address).await {
            Ok(Some(info)) => {
                let decimals = info.decimals.as_deref().and_then(|d| d.trim().parse().ok());
                TokenInfo::new(address, &info.name, &info.symbol, decimals, TokenInfoSource::BasescanApi)
            }
            Ok(None) => None,
            Err(e) => {
                record_failure(self.name(), address, &e);
                None
            }
        }
    }
}

pub struct BasescanHtmlSource {
    basescan: BasescanClient,
}

impl BasescanHtmlSource {
    pub fn new(basescan: BasescanClient) -> Self {
        Self { basescan }
    }
}

#[async_trait]
impl TokenSource for BasescanHtmlSource {
    fn name(&self) -> &'static str {
        "basescan_html"
    }

    async fn lookup(&self, address: &str) -> Option<TokenInfo> {
        match self.basescan.scrape_token_page(address).await {
            Ok(Some((name, symbol))) => {
                TokenInfo::new(address, &name, &symbol, None, TokenInfoSource::BasescanHtml)
            }
            Ok(None) => None,
            Err(e) => {
                record_failure(self.name(), address, &e);
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Static table
// ---------------------------------------------------------------------------

pub struct FallbackTableSource {
    chain: Blockchain,
}

impl FallbackTableSource {
    pub fn new(chain: Blockchain) -> Self {
        Self { chain }
    }
}

#[async_trait]
impl TokenSource for FallbackTableSource {
    fn name(&self) -> &'static str {
        "fallback_table"
    }

    async fn lookup(&self, address: &str) -> Option<TokenInfo> {
        lookup_fallback(address, self.chain)
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Resolves token name and symbol through a per-chain priority list of
/// sources, caching successful answers.
pub struct TokenResolver {
    solana_sources: Vec<Arc<dyn TokenSource>>,
    base_sources: Vec<Arc<dyn TokenSource>>,
    cache: TtlCache<TokenInfo>,
}

impl TokenResolver {
    pub fn new(
        solana_sources: Vec<Arc<dyn TokenSource>>,
        base_sources: Vec<Arc<dyn TokenSource>>,
        ttl: Duration,
    ) -> Self {
        Self {
            solana_sources,
            base_sources,
            cache: TtlCache::new(ttl),
        }
    }

    /// Standard source chains: Metaplex, Solscan API, Solscan page, table for
    /// Solana; Basescan API, Basescan page, table for Base.
    pub fn from_clients(
        solana: SolanaClient,
        solscan: SolscanClient,
        basescan: BasescanClient,
        ttl: Duration,
    ) -> Self {
        let solana_sources: Vec<Arc<dyn TokenSource>> = vec![
            Arc::new(MetaplexSource::new(solana)),
            Arc::new(SolscanApiSource::new(solscan.clone())),
            Arc::new(SolscanHtmlSource::new(solscan)),
            Arc::new(FallbackTableSource::new(Blockchain::Solana)),
        ];
        let base_sources: Vec<Arc<dyn TokenSource>> = vec![
            Arc::new(BasescanApiSource::new(basescan.clone())),
            Arc::new(BasescanHtmlSource::new(basescan)),
            Arc::new(FallbackTableSource::new(Blockchain::Base)),
        ];
        Self::new(solana_sources, base_sources, ttl)
    }

    fn cache_key(address: &str, chain: Blockchain) -> String {
        match chain {
            Blockchain::Solana => format!("solana:{address}"),
            Blockchain::Base => format!("base:{}", address.to_lowercase()),
        }
    }

    /// Always returns something: a placeholder derived from the address when
    /// every source comes up empty. Placeholders are not cached.
    pub async fn resolve(&self, address: &str, chain: Blockchain) -> TokenInfo {
        let key = Self::cache_key(address, chain);
        if let Some(info) = self.cache.get(&key).await {
            counter!("token_cache_hits_total").increment(1);
            return info;
        }

        let sources = match chain {
            Blockchain::Solana => &self.solana_sources,
            Blockchain::Base => &self.base_sources,
        };

        for source in sources {
            if let Some(info) = source.lookup(address).await {
                tracing::debug!(
                    token = %address,
                    source = source.name(),
                    symbol = %info.symbol,
                    "Resolved token metadata"
                );
                self.cache.insert(key, info.clone()).await;
                return info;
            }
        }

        tracing::info!(token = %address, chain = %chain, "No metadata source knew token, using placeholder");
        placeholder(address, chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubSource {
        answer: Option<(&'static str, &'static str)>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TokenSource for StubSource {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn lookup(&self, address: &str) -> Option<TokenInfo> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let (name, symbol) = self.answer?;
            TokenInfo::new(address, name, symbol, None, TokenInfoSource::SolscanApi)
        }
    }

    fn stub(answer: Option<(&'static str, &'static str)>) -> (Arc<dyn TokenSource>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = Arc::new(StubSource {
            answer,
            calls: calls.clone(),
        });
        (source, calls)
    }

    #[tokio::test]
    async fn test_first_answer_wins_and_is_cached() {
        let (empty, empty_calls) = stub(None);
        let (hit, hit_calls) = stub(Some(("Bonk", "BONK")));
        let (never, never_calls) = stub(Some(("Other", "OTHER")));
        let resolver = TokenResolver::new(vec![empty, hit, never], vec![], Duration::from_secs(60));

        let info = resolver.resolve("mint", Blockchain::Solana).await;
        assert_eq!(info.symbol, "BONK");
        assert_eq!(never_calls.load(Ordering::SeqCst), 0);

        let again = resolver.resolve("mint", Blockchain::Solana).await;
        assert_eq!(again, info);
        assert_eq!(empty_calls.load(Ordering::SeqCst), 1);
        assert_eq!(hit_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_placeholder_is_not_cached() {
        let (empty, calls) = stub(None);
        let resolver = TokenResolver::new(vec![], vec![empty], Duration::from_secs(60));

        let info = resolver.resolve("0x1234567890abcdef", Blockchain::Base).await;
        assert!(info.is_placeholder());
        assert_eq!(info.symbol, "123456");

        resolver.resolve("0x1234567890abcdef", Blockchain::Base).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_base_cache_key_ignores_case() {
        let (hit, calls) = stub(Some(("Degen", "DEGEN")));
        let resolver = TokenResolver::new(vec![], vec![hit], Duration::from_secs(60));

        resolver.resolve("0xABC", Blockchain::Base).await;
        resolver.resolve("0xabc", Blockchain::Base).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_metaplex_lookups_share_the_rate_limit() {
        let limiter = Arc::new(crate::indexer::RateLimiter::with_window(1, Duration::from_millis(100)));
        let solana = SolanaClient::new(reqwest::Client::new(), "http://127.0.0.1:9").with_limiter(limiter);
        let source = MetaplexSource::new(solana);

        let start = std::time::Instant::now();
        for mint in ["MintA", "MintB", "MintC"] {
            assert!(source.lookup(mint).await.is_none());
        }
        // One call per window: the third lookup waits out two windows.
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_basescan_lookups_share_the_rate_limit() {
        let limiter = Arc::new(crate::indexer::RateLimiter::with_window(1, Duration::from_millis(100)));
        let basescan =
            BasescanClient::new(reqwest::Client::new(), "http://127.0.0.1:9/api", None).with_limiter(limiter);
        let source = BasescanApiSource::new(basescan);

        let start = std::time::Instant::now();
        for token in ["0xaaa", "0xbbb", "0xccc"] {
            assert!(source.lookup(token).await.is_none());
        }
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_fallback_table_source() {
        let resolver = TokenResolver::new(
            vec![Arc::new(FallbackTableSource::new(Blockchain::Solana))],
            vec![Arc::new(FallbackTableSource::new(Blockchain::Base))],
            Duration::from_secs(60),
        );
        let info = resolver
            .resolve("0xcaa6d4049e667ffd88457a1733d255eed02996bb", Blockchain::Base)
            .await;
        assert_eq!(info.name, "Memecoin");
        assert_eq!(info.source, TokenInfoSource::Fallback);
    }
}

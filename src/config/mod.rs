use std::env;

const DEFAULT_SOLANA_RPC: &str = "https://api.mainnet-beta.solana.com";
const DEFAULT_BASE_RPC: &str = "https://mainnet.base.org";
const DEFAULT_BASESCAN_API: &str = "https://api.basescan.org/api";
const DEFAULT_SOLSCAN_API: &str = "https://public-api.solscan.io";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,

    // RPC / explorer credentials (all optional, public endpoints otherwise)
    pub solana_api_key: Option<String>,
    pub helius_api_key: Option<String>,
    pub alchemy_api_key: Option<String>,
    pub infura_api_key: Option<String>,
    pub basescan_api_key: Option<String>,

    // Explicit endpoint overrides
    pub solana_rpc_url_override: Option<String>,
    pub base_rpc_url_override: Option<String>,
    pub basescan_api_url: String,
    pub solscan_api_url: String,

    // Retrieval tuning
    pub http_timeout_secs: u64,
    pub cache_ttl_secs: u64,
    pub max_requests_per_minute: u32,
    pub max_signatures_per_wallet: usize,
    pub reindex_after_secs: i64,
    pub page_delay_ms: u64,

    /// Serve the built-in demo transactions for known demo wallets when
    /// nothing real could be retrieved.
    pub demo_mode: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Ok(Self {
            database_url: get("DATABASE_URL")
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?,
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: get("PORT").unwrap_or_else(|| "8001".into()).parse()?,

            solana_api_key: get("SOLANA_API_KEY"),
            helius_api_key: get("HELIUS_API_KEY"),
            alchemy_api_key: get("ALCHEMY_API_KEY"),
            infura_api_key: get("INFURA_API_KEY"),
            basescan_api_key: get("BASESCAN_API_KEY"),

            solana_rpc_url_override: get("SOLANA_RPC_URL"),
            base_rpc_url_override: get("BASE_RPC_URL"),
            basescan_api_url: get("BASESCAN_API_URL").unwrap_or_else(|| DEFAULT_BASESCAN_API.into()),
            solscan_api_url: get("SOLSCAN_API_URL").unwrap_or_else(|| DEFAULT_SOLSCAN_API.into()),

            http_timeout_secs: get("HTTP_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(15),
            cache_ttl_secs: get("CACHE_TTL_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
            max_requests_per_minute: get("MAX_REQUESTS_PER_MINUTE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            max_signatures_per_wallet: get("MAX_SIGNATURES_PER_WALLET")
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),
            reindex_after_secs: get("REINDEX_AFTER_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
            page_delay_ms: get("PAGE_DELAY_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),
            demo_mode: get("DEMO_MODE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        })
    }

    /// Solana RPC endpoint: explicit override, then Syndica, then Helius, then public mainnet.
    pub fn solana_rpc_url(&self) -> String {
        if let Some(url) = &self.solana_rpc_url_override {
            return url.clone();
        }
        if let Some(key) = &self.solana_api_key {
            return format!("https://solana-mainnet.api.syndica.io/api-key/{key}");
        }
        if let Some(key) = &self.helius_api_key {
            return format!("https://mainnet.helius-rpc.com/?api-key={key}");
        }
        DEFAULT_SOLANA_RPC.into()
    }

    /// Base RPC endpoint: explicit override, then Alchemy, then Infura, then public mainnet.
    pub fn base_rpc_url(&self) -> String {
        if let Some(url) = &self.base_rpc_url_override {
            return url.clone();
        }
        if let Some(url) = self.alchemy_url() {
            return url;
        }
        if let Some(key) = &self.infura_api_key {
            return format!("https://base-mainnet.infura.io/v3/{key}");
        }
        DEFAULT_BASE_RPC.into()
    }

    /// Alchemy's enhanced API is only reachable with a key.
    pub fn alchemy_url(&self) -> Option<String> {
        self.alchemy_api_key
            .as_ref()
            .map(|key| format!("https://base-mainnet.g.alchemy.com/v2/{key}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_database_url_required() {
        assert!(config_from(&[]).is_err());
    }

    #[test]
    fn test_defaults() {
        let cfg = config_from(&[("DATABASE_URL", "postgres://localhost/pog")]).unwrap();
        assert_eq!(cfg.port, 8001);
        assert_eq!(cfg.cache_ttl_secs, 3600);
        assert_eq!(cfg.max_requests_per_minute, 10);
        assert_eq!(cfg.max_signatures_per_wallet, 1000);
        assert!(!cfg.demo_mode);
        assert_eq!(cfg.solana_rpc_url(), DEFAULT_SOLANA_RPC);
        assert_eq!(cfg.base_rpc_url(), DEFAULT_BASE_RPC);
        assert!(cfg.alchemy_url().is_none());
    }

    #[test]
    fn test_syndica_preferred_over_helius() {
        let cfg = config_from(&[
            ("DATABASE_URL", "postgres://localhost/pog"),
            ("SOLANA_API_KEY", "syn"),
            ("HELIUS_API_KEY", "hel"),
        ])
        .unwrap();
        assert_eq!(
            cfg.solana_rpc_url(),
            "https://solana-mainnet.api.syndica.io/api-key/syn"
        );
    }

    #[test]
    fn test_helius_when_no_syndica_key() {
        let cfg = config_from(&[
            ("DATABASE_URL", "postgres://localhost/pog"),
            ("SOLANA_API_KEY", "  "),
            ("HELIUS_API_KEY", "hel"),
        ])
        .unwrap();
        assert_eq!(cfg.solana_rpc_url(), "https://mainnet.helius-rpc.com/?api-key=hel");
    }

    #[test]
    fn test_base_endpoint_order() {
        let cfg = config_from(&[
            ("DATABASE_URL", "postgres://localhost/pog"),
            ("INFURA_API_KEY", "inf"),
        ])
        .unwrap();
        assert_eq!(cfg.base_rpc_url(), "https://base-mainnet.infura.io/v3/inf");

        let cfg = config_from(&[
            ("DATABASE_URL", "postgres://localhost/pog"),
            ("INFURA_API_KEY", "inf"),
            ("ALCHEMY_API_KEY", "alc"),
        ])
        .unwrap();
        assert_eq!(cfg.base_rpc_url(), "https://base-mainnet.g.alchemy.com/v2/alc");
    }

    #[test]
    fn test_override_wins() {
        let cfg = config_from(&[
            ("DATABASE_URL", "postgres://localhost/pog"),
            ("SOLANA_API_KEY", "syn"),
            ("SOLANA_RPC_URL", "http://127.0.0.1:8899"),
        ])
        .unwrap();
        assert_eq!(cfg.solana_rpc_url(), "http://127.0.0.1:8899");
    }

    #[test]
    fn test_invalid_port_is_error() {
        assert!(config_from(&[
            ("DATABASE_URL", "postgres://localhost/pog"),
            ("PORT", "not-a-port"),
        ])
        .is_err());
    }
}

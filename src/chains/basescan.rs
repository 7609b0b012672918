use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::indexer::RateLimiter;

const BASESCAN_WEB: &str = "https://basescan.org";

static SMALL_SPAN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<span class="text-secondary small">([^<]+)</span>"#).expect("valid regex"));
static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<title>([^<]*?) \((\w+)\) Token").expect("valid regex"));

#[derive(Debug, Error)]
pub enum BasescanError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Basescan returned an error: {0}")]
    Api(String),

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

/// Etherscan-style envelope. `result` is an array on success and an error
/// string on failure.
#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: Value,
}

/// One row of `module=account&action=tokentx`. Numeric fields arrive as strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransfer {
    pub block_number: String,
    pub time_stamp: String,
    pub hash: String,
    pub from: String,
    pub to: String,
    pub contract_address: String,
    pub value: String,
    #[serde(default)]
    pub token_name: String,
    #[serde(default)]
    pub token_symbol: String,
    #[serde(default)]
    pub token_decimal: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTokenInfo {
    #[serde(default, alias = "tokenName")]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default, alias = "divisor")]
    pub decimals: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BasescanClient {
    http: Client,
    api_url: String,
    web_url: String,
    api_key: Option<String>,
    limiter: Option<Arc<RateLimiter>>,
}

impl BasescanClient {
    pub fn new(http: Client, api_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            api_url: api_url.into(),
            web_url: BASESCAN_WEB.into(),
            api_key,
            limiter: None,
        }
    }

    /// Gate every API call (not page scrapes) on a shared limiter.
    pub fn with_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    async fn call(&self, params: &[(&str, &str)]) -> Result<Value, BasescanError> {
        if let Some(limiter) = &self.limiter {
            limiter.acquire().await;
        }
        let mut params: Vec<(&str, &str)> = params.to_vec();
        if let Some(key) = &self.api_key {
            params.push(("apikey", key.as_str()));
        }
        let url = Url::parse_with_params(&self.api_url, &params)
            .map_err(|e| BasescanError::Unexpected(format!("bad Basescan URL: {e}")))?;

        let envelope: Envelope = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if envelope.status == "1" {
            return Ok(envelope.result);
        }
        // "No transactions found" is a successful empty answer.
        if envelope.result.as_array().is_some_and(|a| a.is_empty()) {
            return Ok(Value::Array(Vec::new()));
        }
        let detail = envelope
            .result
            .as_str()
            .map(str::to_string)
            .unwrap_or(envelope.message);
        Err(BasescanError::Api(detail))
    }

    /// ERC-20 transfers touching `address`, newest first.
    pub async fn token_transfers(
        &self,
        address: &str,
        start_block: Option<i64>,
    ) -> Result<Vec<TokenTransfer>, BasescanError> {
        let start = start_block.map(|b| b.to_string());
        let mut params = vec![
            ("module", "account"),
            ("action", "tokentx"),
            ("address", address),
            ("sort", "desc"),
        ];
        if let Some(start) = start.as_deref() {
            params.push(("startblock", start));
        }

        let result = self.call(&params).await?;
        serde_json::from_value(result).map_err(|e| BasescanError::Unexpected(e.to_string()))
    }

    pub async fn token_info(&self, contract: &str) -> Result<Option<ApiTokenInfo>, BasescanError> {
        let result = self
            .call(&[
                ("module", "token"),
                ("action", "tokeninfo"),
                ("contractaddress", contract),
            ])
            .await?;

        let info = match result {
            Value::Array(items) => items.into_iter().next(),
            Value::Object(_) => Some(result),
            _ => None,
        };
        match info {
            Some(v) => serde_json::from_value(v)
                .map(Some)
                .map_err(|e| BasescanError::Unexpected(e.to_string())),
            None => Ok(None),
        }
    }

    /// Scrape the token page for "Name (SYMBOL)".
    pub async fn scrape_token_page(&self, contract: &str) -> Result<Option<(String, String)>, BasescanError> {
        let url = format!("{}/token/{}", self.web_url.trim_end_matches('/'), contract);
        let html = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(parse_basescan_html(&html))
    }
}

/// Extract `(name, symbol)` from a Basescan token page.
pub fn parse_basescan_html(html: &str) -> Option<(String, String)> {
    if let Some(caps) = SMALL_SPAN_RE.captures(html) {
        let text = caps[1].trim();
        if let Some((name, rest)) = text.split_once('(') {
            let symbol = rest.replace(')', "");
            let (name, symbol) = (name.trim(), symbol.trim());
            if !name.is_empty() || !symbol.is_empty() {
                return Some((name.to_string(), symbol.to_string()));
            }
        }
    }

    TITLE_RE
        .captures(html)
        .map(|caps| (caps[1].trim().to_string(), caps[2].to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_small_span() {
        let html = r#"<div><span class="text-secondary small">Degen (DEGEN)</span></div>"#;
        assert_eq!(
            parse_basescan_html(html),
            Some(("Degen".to_string(), "DEGEN".to_string()))
        );
    }

    #[test]
    fn test_parse_title_fallback() {
        let html = "<html><head><title>Based (BASED) Token Tracker | BaseScan</title></head></html>";
        assert_eq!(
            parse_basescan_html(html),
            Some(("Based".to_string(), "BASED".to_string()))
        );
    }

    #[test]
    fn test_span_without_symbol_falls_through() {
        let html = r#"<span class="text-secondary small">Contract</span><title>Roost (ROOST) Token</title>"#;
        assert_eq!(
            parse_basescan_html(html),
            Some(("Roost".to_string(), "ROOST".to_string()))
        );
    }

    #[test]
    fn test_title_capture_stays_inside_title() {
        let html = "<title>BaseScan</title><p>Roost (ROOST) Token</p>";
        assert_eq!(parse_basescan_html(html), None);
    }

    #[test]
    fn test_parse_nothing() {
        assert_eq!(parse_basescan_html("<html></html>"), None);
    }

    #[test]
    fn test_token_transfer_deserializes() {
        let raw = serde_json::json!({
            "blockNumber": "12345",
            "timeStamp": "1700000000",
            "hash": "0xabc",
            "from": "0x1",
            "to": "0x2",
            "contractAddress": "0xtoken",
            "value": "1000000000000000000",
            "tokenName": "Roost",
            "tokenSymbol": "ROOST",
            "tokenDecimal": "18",
            "gasUsed": "21000"
        });
        let t: TokenTransfer = serde_json::from_value(raw).unwrap();
        assert_eq!(t.token_symbol, "ROOST");
        assert_eq!(t.block_number, "12345");
    }

    #[test]
    fn test_api_token_info_aliases() {
        let raw = serde_json::json!({ "tokenName": "Memecoin", "symbol": "MEME", "divisor": "18" });
        let info: ApiTokenInfo = serde_json::from_value(raw).unwrap();
        assert_eq!(info.name, "Memecoin");
        assert_eq!(info.decimals.as_deref(), Some("18"));
    }
}

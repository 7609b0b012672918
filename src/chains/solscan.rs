use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;

const SOLSCAN_WEB: &str = "https://solscan.io";

static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<title>([^<]*?) \((\w+)\)").expect("valid regex"));
static META_DESCRIPTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<meta name="description" content="([^"]+)\s+\(([^)]+)\)"#).expect("valid regex")
});
static HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<h1[^>]*>([^<]*)<small[^>]*>\s*\(\s*(\w+)\s*\)").expect("valid regex")
});

#[derive(Debug, Error)]
pub enum SolscanError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolscanTokenMeta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub decimals: Option<u8>,
}

#[derive(Debug, Clone)]
pub struct SolscanClient {
    http: Client,
    api_url: String,
    web_url: String,
}

impl SolscanClient {
    pub fn new(http: Client, api_url: impl Into<String>) -> Self {
        Self {
            http,
            api_url: api_url.into(),
            web_url: SOLSCAN_WEB.into(),
        }
    }

    /// Public token metadata endpoint.
    pub async fn token_meta(&self, mint: &str) -> Result<SolscanTokenMeta, SolscanError> {
        let base = format!("{}/token/meta", self.api_url.trim_end_matches('/'));
        let url = Url::parse_with_params(&base, &[("tokenAddress", mint)])
            .map_err(|e| SolscanError::Unexpected(format!("bad Solscan URL: {e}")))?;

        let meta: SolscanTokenMeta = self
            .http
            .get(url)
            .header("accept", "application/json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(meta)
    }

    /// Scrape the token page for "Name (SYMBOL)".
    pub async fn scrape_token_page(&self, mint: &str) -> Result<Option<(String, String)>, SolscanError> {
        let url = format!("{}/token/{}", self.web_url.trim_end_matches('/'), mint);
        let html = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(parse_solscan_html(&html))
    }
}

/// Extract `(name, symbol)` from a Solscan token page: the title first, then
/// the meta description, then the page header.
pub fn parse_solscan_html(html: &str) -> Option<(String, String)> {
    [&*TITLE_RE, &*META_DESCRIPTION_RE, &*HEADER_RE]
        .into_iter()
        .find_map(|re| {
            let caps = re.captures(html)?;
            let name = caps[1].trim().to_string();
            let symbol = caps[2].trim().to_string();
            (!name.is_empty() && !symbol.is_empty()).then_some((name, symbol))
        })
}

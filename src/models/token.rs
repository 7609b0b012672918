use serde::{Deserialize, Serialize};

/// Where a token's name and symbol came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenInfoSource {
    Metaplex,
    SolscanApi,
    SolscanHtml,
    BasescanApi,
    BasescanHtml,
    Fallback,
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: Option<u8>,
    pub source: TokenInfoSource,
}

impl TokenInfo {
    /// Fill an empty name from the symbol and vice versa.
    pub fn new(address: &str, name: &str, symbol: &str, decimals: Option<u8>, source: TokenInfoSource) -> Option<Self> {
        let name = name.trim();
        let symbol = symbol.trim();
        if name.is_empty() && symbol.is_empty() {
            return None;
        }
        Some(Self {
            address: address.to_string(),
            name: if name.is_empty() { symbol } else { name }.to_string(),
            symbol: if symbol.is_empty() { name } else { symbol }.to_string(),
            decimals,
            source,
        })
    }

    pub fn is_placeholder(&self) -> bool {
        self.source == TokenInfoSource::Placeholder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_half_is_filled() {
        let info = TokenInfo::new("mint", "", "BONK", None, TokenInfoSource::SolscanApi).unwrap();
        assert_eq!(info.name, "BONK");
        assert_eq!(info.symbol, "BONK");
    }

    #[test]
    fn test_blank_is_rejected() {
        assert!(TokenInfo::new("mint", " ", "", None, TokenInfoSource::SolscanApi).is_none());
    }
}

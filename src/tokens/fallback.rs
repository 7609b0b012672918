use crate::models::{Blockchain, TokenInfo, TokenInfoSource};

/// Known Base tokens, keyed by lowercased contract address.
const BASE_TOKENS: &[(&str, &str, &str)] = &[
    ("0xe1abd004250ac8d1f199421d647e01d094faa180", "Roost", "ROOST"),
    ("0xcaa6d4049e667ffd88457a1733d255eed02996bb", "Memecoin", "MEME"),
    ("0x692c1564c82e6a3509ee189d1b666df9a309b420", "Based", "BASED"),
    ("0xc53fc22033a4bcb15b5405c38e67e378c960ee6b", "Degen", "DEGEN"),
];

/// Known Solana mints.
const SOLANA_TOKENS: &[(&str, &str, &str)] = &[
    ("FHRQk2cYczCo4t6GhEHaKS6WSHXYcAhs7i4V6yWppump", "JewCoin", "JEWCOIN"),
    ("3yCDp1E5yzA1qoNQuDjNr5iXyj1CSHjf3dktHpnypump", "PumpCoin", "PUMP"),
    ("56UtHy4oBGeLNEenvvXJhhAwDwhNc2bbZgAPUZaFpump", "Punk Floor", "PUNKFLOOR"),
    ("5HyZiyaSsQt8VZBAJcULZhtykiVmkAkWLiQJCER9pump", "Crypto Pump", "CPUMP"),
];

pub fn lookup_fallback(address: &str, chain: Blockchain) -> Option<TokenInfo> {
    let (table, key, decimals) = match chain {
        Blockchain::Base => (BASE_TOKENS, address.to_lowercase(), 18),
        Blockchain::Solana => (SOLANA_TOKENS, address.to_string(), 9),
    };
    table
        .iter()
        .find(|(addr, _, _)| *addr == key)
        .and_then(|(addr, name, symbol)| {
            TokenInfo::new(addr, name, symbol, Some(decimals), TokenInfoSource::Fallback)
        })
}

/// Address-derived name and symbol for tokens no source could identify.
pub fn placeholder(address: &str, chain: Blockchain) -> TokenInfo {
    let name = format!("{}...", take_chars(address, 0, 10));
    let symbol = match chain {
        Blockchain::Solana => take_chars(address, 0, 6),
        Blockchain::Base => take_chars(address, 2, 8),
    };
    TokenInfo {
        address: address.to_string(),
        name,
        symbol,
        decimals: None,
        source: TokenInfoSource::Placeholder,
    }
}

fn take_chars(s: &str, start: usize, end: usize) -> String {
    s.chars().skip(start).take(end.saturating_sub(start)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_lookup_is_case_insensitive() {
        let info = lookup_fallback("0xE1ABD004250AC8D1F199421D647E01D094FAA180", Blockchain::Base).unwrap();
        assert_eq!(info.symbol, "ROOST");
        assert_eq!(info.source, TokenInfoSource::Fallback);
    }

    #[test]
    fn test_solana_lookup_is_exact() {
        let info = lookup_fallback("56UtHy4oBGeLNEenvvXJhhAwDwhNc2bbZgAPUZaFpump", Blockchain::Solana).unwrap();
        assert_eq!(info.name, "Punk Floor");
        assert!(lookup_fallback("56uthy4obgelneenvvxjhhawdwhnc2bbzgapuzafpump", Blockchain::Solana).is_none());
    }

    #[test]
    fn test_placeholders() {
        let sol = placeholder("So11111111111111111111111111111111111111112", Blockchain::Solana);
        assert_eq!(sol.name, "So11111111...");
        assert_eq!(sol.symbol, "So1111");
        assert!(sol.is_placeholder());

        let base = placeholder("0xabcdef0123456789", Blockchain::Base);
        assert_eq!(base.name, "0xabcdef01...");
        assert_eq!(base.symbol, "abcdef");
    }
}

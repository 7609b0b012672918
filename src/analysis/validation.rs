use std::str::FromStr;

use alloy::primitives::Address;
use thiserror::Error;

use crate::models::Blockchain;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("Wallet address is required")]
    Empty,

    #[error("Invalid Solana address: {0}")]
    InvalidSolana(String),

    #[error("Invalid Base address: {0}")]
    InvalidBase(String),
}

/// Validate a wallet address for the given chain and return its canonical form.
///
/// Solana addresses must decode from base58 to exactly 32 bytes and are kept
/// as given. Base addresses must be `0x`-prefixed 20-byte hex and are
/// lowercased so the same wallet always maps to one stats row.
pub fn normalize_address(wallet: &str, chain: Blockchain) -> Result<String, AddressError> {
    let wallet = wallet.trim();
    if wallet.is_empty() {
        return Err(AddressError::Empty);
    }

    match chain {
        Blockchain::Solana => {
            let bytes = bs58::decode(wallet)
                .into_vec()
                .map_err(|_| AddressError::InvalidSolana(wallet.to_string()))?;
            if bytes.len() != 32 {
                return Err(AddressError::InvalidSolana(wallet.to_string()));
            }
            Ok(wallet.to_string())
        }
        Blockchain::Base => {
            if !wallet.starts_with("0x") && !wallet.starts_with("0X") {
                return Err(AddressError::InvalidBase(wallet.to_string()));
            }
            let addr = Address::from_str(wallet)
                .map_err(|_| AddressError::InvalidBase(wallet.to_string()))?;
            Ok(format!("{addr:#x}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solana_address_accepted() {
        let addr = "GPT8wwUbnYgxckmFmV2Pj1MYucodd9R4P8xNqv9WEwrr";
        assert_eq!(normalize_address(addr, Blockchain::Solana).unwrap(), addr);
    }

    #[test]
    fn test_solana_rejects_bad_alphabet_and_length() {
        // '0' and 'O' are not in the base58 alphabet
        assert!(matches!(
            normalize_address("0OIl", Blockchain::Solana),
            Err(AddressError::InvalidSolana(_))
        ));
        assert!(matches!(
            normalize_address("abc", Blockchain::Solana),
            Err(AddressError::InvalidSolana(_))
        ));
    }

    #[test]
    fn test_base_address_lowercased() {
        let out = normalize_address(
            "0x2D1C5E86eF58644b2B2B09921AFE9ddf4E99eF28",
            Blockchain::Base,
        )
        .unwrap();
        assert_eq!(out, "0x2d1c5e86ef58644b2b2b09921afe9ddf4e99ef28");
    }

    #[test]
    fn test_base_rejects_missing_prefix_and_short_hex() {
        assert!(normalize_address("2D1C5E86eF58644b2B2B09921AFE9ddf4E99eF28", Blockchain::Base).is_err());
        assert!(normalize_address("0x1234", Blockchain::Base).is_err());
        assert!(normalize_address(
            "GPT8wwUbnYgxckmFmV2Pj1MYucodd9R4P8xNqv9WEwrr",
            Blockchain::Base
        )
        .is_err());
    }

    #[test]
    fn test_empty_address() {
        assert_eq!(normalize_address("  ", Blockchain::Solana), Err(AddressError::Empty));
    }
}

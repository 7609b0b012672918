pub mod indexer_state;
pub mod leaderboard;
pub mod position;
pub mod stats;
pub mod token;
pub mod transaction;

pub use indexer_state::IndexerState;
pub use leaderboard::{LeaderboardEntry, StatType};
pub use position::{TokenHolding, TokenPosition};
pub use stats::{PnlStats, TradeStats};
pub use token::{TokenInfo, TokenInfoSource};
pub use transaction::Transaction;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Blockchain
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Blockchain {
    Solana,
    Base,
}

impl Blockchain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Blockchain::Solana => "solana",
            Blockchain::Base => "base",
        }
    }

    pub fn from_api_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "solana" | "sol" => Some(Blockchain::Solana),
            "base" => Some(Blockchain::Base),
            _ => None,
        }
    }
}

impl fmt::Display for Blockchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Blockchain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Blockchain::from_api_str(s).ok_or_else(|| "Blockchain must be 'solana' or 'base'".to_string())
    }
}

// ---------------------------------------------------------------------------
// TxType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxType {
    Buy,
    Sell,
}

impl TxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::Buy => "buy",
            TxType::Sell => "sell",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "buy" => Some(TxType::Buy),
            "sell" => Some(TxType::Sell),
            _ => None,
        }
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blockchain_parsing_is_case_insensitive() {
        assert_eq!(Blockchain::from_api_str("Solana"), Some(Blockchain::Solana));
        assert_eq!(Blockchain::from_api_str(" BASE "), Some(Blockchain::Base));
        assert_eq!(Blockchain::from_api_str("ethereum"), None);
        assert!("polygon".parse::<Blockchain>().is_err());
    }

    #[test]
    fn test_tx_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TxType::Sell).unwrap(), "\"sell\"");
        assert_eq!(TxType::from_db_str("buy"), Some(TxType::Buy));
        assert_eq!(TxType::from_db_str("BUY"), None);
    }
}

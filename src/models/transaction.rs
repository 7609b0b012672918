use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Blockchain, TxType};

/// A single token movement into or out of a wallet, normalized across chains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub tx_hash: String,
    pub wallet_address: String,
    pub blockchain: Blockchain,
    pub token_address: String,
    pub token_name: String,
    pub token_symbol: String,
    /// Token units (already scaled by the mint's decimals).
    pub amount: Decimal,
    /// Quote-currency units per token; zero when no counterparty leg was found.
    pub price: Decimal,
    /// Unix seconds.
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub tx_type: TxType,
    #[serde(default)]
    pub dex: Option<String>,
}

impl Transaction {
    pub fn is_buy(&self) -> bool {
        self.tx_type == TxType::Buy
    }

    pub fn is_sell(&self) -> bool {
        self.tx_type == TxType::Sell
    }
}

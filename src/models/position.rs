use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-token summary of a wallet's trading, derived by the FIFO matcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPosition {
    pub token_address: String,
    pub token_symbol: String,
    pub token_name: String,
    pub buy_count: usize,
    pub sell_count: usize,
    pub bought_amount: Decimal,
    pub sold_amount: Decimal,
    /// Units still held in unmatched lots.
    pub open_amount: Decimal,
    pub realized_pnl: Decimal,
}

/// A token balance currently held by a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHolding {
    pub token_address: String,
    pub token_symbol: String,
    pub token_name: String,
    /// Raw base-unit balance as reported by the chain.
    pub raw_balance: String,
    /// Scaled balance when the token's decimals are known.
    pub amount: Option<Decimal>,
    pub decimals: Option<u8>,
}

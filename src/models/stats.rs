use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for the trade_stats table (one per wallet and chain).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TradeStats {
    pub id: Uuid,
    pub wallet_address: String,
    pub blockchain: String,
    pub best_trade_profit: Decimal,
    pub best_trade_token: String,
    pub best_multiplier: Decimal,
    pub best_multiplier_token: String,
    pub all_time_pnl: Decimal,
    pub worst_trade_loss: Decimal,
    pub worst_trade_token: String,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate statistics produced by the FIFO matcher.
///
/// Token fields are empty when no token qualified for the slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PnlStats {
    pub best_trade_profit: Decimal,
    pub best_trade_token: String,
    pub best_multiplier: Decimal,
    pub best_multiplier_token: String,
    pub all_time_pnl: Decimal,
    pub worst_trade_loss: Decimal,
    pub worst_trade_token: String,
}

impl From<&TradeStats> for PnlStats {
    fn from(row: &TradeStats) -> Self {
        Self {
            best_trade_profit: row.best_trade_profit,
            best_trade_token: row.best_trade_token.clone(),
            best_multiplier: row.best_multiplier,
            best_multiplier_token: row.best_multiplier_token.clone(),
            all_time_pnl: row.all_time_pnl,
            worst_trade_loss: row.worst_trade_loss,
            worst_trade_token: row.worst_trade_token.clone(),
        }
    }
}

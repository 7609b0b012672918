use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Statistic a leaderboard can be ranked by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatType {
    BestTrade,
    BestMultiplier,
    AllTimePnl,
    WorstTrade,
}

impl StatType {
    pub fn from_path(s: &str) -> Option<Self> {
        match s {
            "best_trade" => Some(StatType::BestTrade),
            "best_multiplier" => Some(StatType::BestMultiplier),
            "all_time_pnl" => Some(StatType::AllTimePnl),
            "worst_trade" => Some(StatType::WorstTrade),
            _ => None,
        }
    }

    /// trade_stats column holding the ranked value.
    pub fn column(&self) -> &'static str {
        match self {
            StatType::BestTrade => "best_trade_profit",
            StatType::BestMultiplier => "best_multiplier",
            StatType::AllTimePnl => "all_time_pnl",
            StatType::WorstTrade => "worst_trade_loss",
        }
    }

    /// trade_stats column naming the token behind the value, if any.
    pub fn token_column(&self) -> Option<&'static str> {
        match self {
            StatType::BestTrade => Some("best_trade_token"),
            StatType::BestMultiplier => Some("best_multiplier_token"),
            StatType::AllTimePnl => None,
            StatType::WorstTrade => Some("worst_trade_token"),
        }
    }

    /// Worst trade ranks the most negative loss first.
    pub fn ascending(&self) -> bool {
        matches!(self, StatType::WorstTrade)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub wallet_address: String,
    pub value: Decimal,
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_mapping() {
        let worst = StatType::from_path("worst_trade").unwrap();
        assert_eq!(worst.column(), "worst_trade_loss");
        assert_eq!(worst.token_column(), Some("worst_trade_token"));
        assert!(worst.ascending());

        let pnl = StatType::from_path("all_time_pnl").unwrap();
        assert_eq!(pnl.token_column(), None);
        assert!(!pnl.ascending());
    }

    #[test]
    fn test_unknown_stat() {
        assert!(StatType::from_path("sharpe").is_none());
        assert!(StatType::from_path("BEST_TRADE").is_none());
    }
}

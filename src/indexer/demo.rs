use rust_decimal::Decimal;

use crate::models::{Blockchain, Transaction, TxType};

const DAY: i64 = 86_400;

pub const DEMO_SOLANA_WALLET: &str = "GPT8wwUbnYgxckmFmV2Pj1MYucodd9R4P8xNqv9WEwrr";
pub const DEMO_BASE_WALLET: &str = "0x2d1c5e86ef58644b2b2b09921afe9ddf4e99ef28";

struct DemoTrade {
    token_address: &'static str,
    token_name: &'static str,
    token_symbol: &'static str,
    tx_type: TxType,
    amount: i64,
    // price as (mantissa, scale)
    price: (i64, u32),
    days_ago: i64,
}

const SOLANA_TRADES: &[DemoTrade] = &[
    DemoTrade {
        token_address: "FHRQk2cYczCo4t6GhEHaKS6WSHXYcAhs7i4V6yWppump",
        token_name: "PUMP Token",
        token_symbol: "PUMP",
        tx_type: TxType::Buy,
        amount: 1000,
        price: (1, 4),
        days_ago: 7,
    },
    DemoTrade {
        token_address: "FHRQk2cYczCo4t6GhEHaKS6WSHXYcAhs7i4V6yWppump",
        token_name: "PUMP Token",
        token_symbol: "PUMP",
        tx_type: TxType::Sell,
        amount: 500,
        price: (5, 4),
        days_ago: 3,
    },
    DemoTrade {
        token_address: "5HyZiyaSsQt8VZBAJcULZhtykiVmkAkWLiQJCER9pump",
        token_name: "THE PENGU KILLER",
        token_symbol: "ORCA",
        tx_type: TxType::Buy,
        amount: 2000,
        price: (2, 4),
        days_ago: 5,
    },
    DemoTrade {
        token_address: "5HyZiyaSsQt8VZBAJcULZhtykiVmkAkWLiQJCER9pump",
        token_name: "THE PENGU KILLER",
        token_symbol: "ORCA",
        tx_type: TxType::Sell,
        amount: 1000,
        price: (6, 4),
        days_ago: 2,
    },
];

const BASE_TRADES: &[DemoTrade] = &[
    DemoTrade {
        token_address: "0xe1abd004250ac8d1f199421d647e01d094faa180",
        token_name: "Roost",
        token_symbol: "ROOST",
        tx_type: TxType::Buy,
        amount: 500,
        price: (1, 3),
        days_ago: 10,
    },
    DemoTrade {
        token_address: "0xe1abd004250ac8d1f199421d647e01d094faa180",
        token_name: "Roost",
        token_symbol: "ROOST",
        tx_type: TxType::Sell,
        amount: 300,
        price: (3, 3),
        days_ago: 5,
    },
];

/// Fixed sample history for the known demo wallets, timestamped relative to
/// `now`. `None` for any other wallet.
pub fn demo_transactions(wallet: &str, chain: Blockchain, now: i64) -> Option<Vec<Transaction>> {
    let trades = match chain {
        Blockchain::Solana if wallet == DEMO_SOLANA_WALLET => SOLANA_TRADES,
        Blockchain::Base if wallet.eq_ignore_ascii_case(DEMO_BASE_WALLET) => BASE_TRADES,
        _ => return None,
    };

    Some(
        trades
            .iter()
            .map(|t| {
                let timestamp = now - t.days_ago * DAY;
                Transaction {
                    tx_hash: format!("demo-{}-{}-{}", t.tx_type, t.token_symbol.to_lowercase(), t.days_ago),
                    wallet_address: wallet.to_string(),
                    blockchain: chain,
                    token_address: t.token_address.to_string(),
                    token_name: t.token_name.to_string(),
                    token_symbol: t.token_symbol.to_string(),
                    amount: Decimal::from(t.amount),
                    price: Decimal::new(t.price.0, t.price.1),
                    timestamp,
                    tx_type: t.tx_type,
                    dex: None,
                }
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fifo::compute_stats;
    use std::str::FromStr;

    #[test]
    fn test_unknown_wallet_has_no_demo() {
        assert!(demo_transactions("SomeoneElse", Blockchain::Solana, 0).is_none());
        assert!(demo_transactions(DEMO_SOLANA_WALLET, Blockchain::Base, 0).is_none());
    }

    #[test]
    fn test_solana_demo_stats() {
        let txs = demo_transactions(DEMO_SOLANA_WALLET, Blockchain::Solana, 1_700_000_000).unwrap();
        assert_eq!(txs.len(), 4);

        let stats = compute_stats(&txs);
        assert_eq!(stats.best_trade_profit, Decimal::from_str("0.4").unwrap());
        assert_eq!(stats.best_trade_token, "ORCA");
        assert_eq!(stats.best_multiplier, Decimal::from(5));
        assert_eq!(stats.best_multiplier_token, "PUMP");
        assert_eq!(stats.all_time_pnl, Decimal::from_str("0.6").unwrap());
        assert_eq!(stats.worst_trade_loss, Decimal::ZERO);
        assert_eq!(stats.worst_trade_token, "");
    }

    #[test]
    fn test_base_demo_matches_any_case() {
        let txs = demo_transactions(
            "0x2D1C5E86eF58644b2B2B09921AFE9ddf4E99eF28",
            Blockchain::Base,
            1_700_000_000,
        )
        .unwrap();
        let stats = compute_stats(&txs);
        // 300 @ (0.003 - 0.001)
        assert_eq!(stats.all_time_pnl, Decimal::from_str("0.6").unwrap());
        assert_eq!(stats.best_multiplier, Decimal::from(3));
        assert_eq!(txs[0].timestamp, 1_700_000_000 - 10 * DAY);
    }
}

use std::collections::{HashMap, VecDeque};

use rust_decimal::Decimal;

use crate::models::{PnlStats, TokenPosition, Transaction};

/// An open buy awaiting matching against later sells.
#[derive(Debug, Clone)]
struct Lot {
    price: Decimal,
    amount: Decimal,
}

/// Running extremes for one token while its sells are matched.
#[derive(Debug, Default)]
struct TokenLedger {
    pnl: Decimal,
    best_trade: Decimal,
    worst_trade: Decimal,
    best_multiplier: Decimal,
}

impl TokenLedger {
    fn record_fill(&mut self, matched: Decimal, lot_price: Decimal, sell_price: Decimal) {
        let trade_pnl = matched * (sell_price - lot_price);
        self.pnl += trade_pnl;

        if trade_pnl > self.best_trade {
            self.best_trade = trade_pnl;
        }
        if trade_pnl < self.worst_trade {
            self.worst_trade = trade_pnl;
        }

        // Zero-cost lots have no meaningful multiplier.
        if lot_price > Decimal::ZERO {
            if let Some(multiplier) = sell_price.checked_div(lot_price) {
                if multiplier > self.best_multiplier {
                    self.best_multiplier = multiplier;
                }
            }
        }
    }
}

/// Result of matching a wallet's full transaction list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    pub stats: PnlStats,
    /// One entry per token, in first-seen order.
    pub positions: Vec<TokenPosition>,
}

/// Pair buys and sells per token with strict FIFO lot consumption.
///
/// Transactions are grouped by token symbol. Within a group buys and sells are
/// each ordered by timestamp (stable for ties). Every sell consumes the oldest
/// open lot first; each partial fill is one trade. Tokens that have only buys
/// or only sells are reported as positions but never contribute to the stats.
/// The input is not mutated, so repeated runs give identical results.
pub fn match_trades(transactions: &[Transaction]) -> MatchOutcome {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&Transaction>> = HashMap::new();
    for tx in transactions {
        let symbol = tx.token_symbol.as_str();
        groups
            .entry(symbol)
            .or_insert_with(|| {
                order.push(symbol);
                Vec::new()
            })
            .push(tx);
    }

    let mut stats = PnlStats::default();
    let mut positions = Vec::with_capacity(order.len());

    for symbol in order {
        let group = &groups[symbol];

        let mut buys: Vec<&Transaction> = group.iter().copied().filter(|t| t.is_buy()).collect();
        let mut sells: Vec<&Transaction> = group.iter().copied().filter(|t| t.is_sell()).collect();
        buys.sort_by_key(|t| t.timestamp);
        sells.sort_by_key(|t| t.timestamp);

        let bought_amount: Decimal = buys.iter().map(|t| t.amount).sum();
        let sold_amount: Decimal = sells.iter().map(|t| t.amount).sum();

        let mut lots: VecDeque<Lot> = buys
            .iter()
            .filter(|b| b.amount > Decimal::ZERO)
            .map(|b| Lot {
                price: b.price,
                amount: b.amount,
            })
            .collect();

        let mut ledger = TokenLedger::default();
        let matchable = !buys.is_empty() && !sells.is_empty();

        if matchable {
            for sell in &sells {
                let mut remaining = sell.amount;

                while remaining > Decimal::ZERO {
                    let Some(lot) = lots.front_mut() else {
                        break;
                    };

                    let matched = lot.amount.min(remaining);
                    ledger.record_fill(matched, lot.price, sell.price);

                    lot.amount -= matched;
                    remaining -= matched;

                    if lot.amount <= Decimal::ZERO {
                        lots.pop_front();
                    }
                }

                if remaining > Decimal::ZERO {
                    tracing::debug!(
                        token = %symbol,
                        unmatched = %remaining,
                        "Sell exceeds open lots, excess ignored"
                    );
                }
            }

            if ledger.best_trade > stats.best_trade_profit {
                stats.best_trade_profit = ledger.best_trade;
                stats.best_trade_token = symbol.to_string();
            }
            if ledger.worst_trade < stats.worst_trade_loss {
                stats.worst_trade_loss = ledger.worst_trade;
                stats.worst_trade_token = symbol.to_string();
            }
            if ledger.best_multiplier > stats.best_multiplier {
                stats.best_multiplier = ledger.best_multiplier;
                stats.best_multiplier_token = symbol.to_string();
            }
            stats.all_time_pnl += ledger.pnl;
        }

        let first = group[0];
        positions.push(TokenPosition {
            token_address: first.token_address.clone(),
            token_symbol: symbol.to_string(),
            token_name: first.token_name.clone(),
            buy_count: buys.len(),
            sell_count: sells.len(),
            bought_amount: bought_amount.normalize(),
            sold_amount: sold_amount.normalize(),
            open_amount: lots.iter().map(|l| l.amount).sum::<Decimal>().normalize(),
            realized_pnl: ledger.pnl.normalize(),
        });
    }

    stats.best_trade_profit = stats.best_trade_profit.normalize();
    stats.best_multiplier = stats.best_multiplier.normalize();
    stats.all_time_pnl = stats.all_time_pnl.normalize();
    stats.worst_trade_loss = stats.worst_trade_loss.normalize();

    MatchOutcome { stats, positions }
}

/// Convenience wrapper returning only the aggregate statistics.
pub fn compute_stats(transactions: &[Transaction]) -> PnlStats {
    match_trades(transactions).stats
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

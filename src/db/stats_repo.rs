use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::models::{Blockchain, LeaderboardEntry, PnlStats, StatType, TradeStats};

pub const DEFAULT_LEADERBOARD_LIMIT: i64 = 10;
pub const MAX_LEADERBOARD_LIMIT: i64 = 100;

/// Replace the stats row for (wallet, chain) with freshly computed values.
pub async fn upsert_stats(
    pool: &PgPool,
    wallet_address: &str,
    chain: Blockchain,
    stats: &PnlStats,
) -> anyhow::Result<TradeStats> {
    let row = sqlx::query_as::<_, TradeStats>(
        r#"
        INSERT INTO trade_stats
            (wallet_address, blockchain, best_trade_profit, best_trade_token,
             best_multiplier, best_multiplier_token, all_time_pnl,
             worst_trade_loss, worst_trade_token, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
        ON CONFLICT (wallet_address, blockchain) DO UPDATE SET
            best_trade_profit = EXCLUDED.best_trade_profit,
            best_trade_token = EXCLUDED.best_trade_token,
            best_multiplier = EXCLUDED.best_multiplier,
            best_multiplier_token = EXCLUDED.best_multiplier_token,
            all_time_pnl = EXCLUDED.all_time_pnl,
            worst_trade_loss = EXCLUDED.worst_trade_loss,
            worst_trade_token = EXCLUDED.worst_trade_token,
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(wallet_address)
    .bind(chain.as_str())
    .bind(stats.best_trade_profit)
    .bind(&stats.best_trade_token)
    .bind(stats.best_multiplier)
    .bind(&stats.best_multiplier_token)
    .bind(stats.all_time_pnl)
    .bind(stats.worst_trade_loss)
    .bind(&stats.worst_trade_token)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn get_stats(
    pool: &PgPool,
    wallet_address: &str,
    chain: Blockchain,
) -> anyhow::Result<Option<TradeStats>> {
    let row = sqlx::query_as::<_, TradeStats>(
        "SELECT * FROM trade_stats WHERE wallet_address = $1 AND blockchain = $2",
    )
    .bind(wallet_address)
    .bind(chain.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Clamp a requested leaderboard size into `1..=MAX_LEADERBOARD_LIMIT`.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
        .clamp(1, MAX_LEADERBOARD_LIMIT)
}

#[derive(Debug, sqlx::FromRow)]
struct LeaderboardRow {
    wallet_address: String,
    value: Decimal,
    token: String,
}

/// Top wallets on one chain for a stat. Column names come from `StatType`,
/// never from user input.
pub async fn leaderboard(
    pool: &PgPool,
    chain: Blockchain,
    stat: StatType,
    limit: i64,
) -> anyhow::Result<Vec<LeaderboardEntry>> {
    let token_expr = stat.token_column().unwrap_or("''::text");
    let direction = if stat.ascending() { "ASC" } else { "DESC" };
    let sql = format!(
        "SELECT wallet_address, {value} AS value, {token} AS token \
         FROM trade_stats WHERE blockchain = $1 \
         ORDER BY {value} {direction}, updated_at DESC, wallet_address ASC \
         LIMIT $2",
        value = stat.column(),
        token = token_expr,
    );

    let rows = sqlx::query_as::<_, LeaderboardRow>(&sql)
        .bind(chain.as_str())
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| LeaderboardEntry {
            rank: i + 1,
            wallet_address: row.wallet_address,
            value: row.value,
            token: row.token,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), 10);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(25)), 25);
        assert_eq!(clamp_limit(Some(10_000)), 100);
    }
}

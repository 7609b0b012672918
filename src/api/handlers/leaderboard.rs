use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use super::parse_chain;
use crate::db::stats_repo;
use crate::errors::AppError;
use crate::models::{Blockchain, LeaderboardEntry, StatType};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub blockchain: Option<String>,
    pub limit: Option<i64>,
}

pub async fn leaderboard(
    State(state): State<AppState>,
    Path(stat_type): Path<String>,
    query: Result<Query<LeaderboardQuery>, QueryRejection>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    let stat = StatType::from_path(&stat_type).ok_or_else(|| {
        AppError::BadRequest(format!(
            "Unknown stat type '{stat_type}'; expected best_trade, best_multiplier, all_time_pnl or worst_trade"
        ))
    })?;
    let Query(q) = query?;
    let chain = parse_chain(q.blockchain.as_deref(), Blockchain::Solana)?;
    let limit = stats_repo::clamp_limit(q.limit);

    let entries = stats_repo::leaderboard(&state.db, chain, stat, limit).await?;
    Ok(Json(entries))
}

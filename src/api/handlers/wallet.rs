use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use super::parse_chain;
use crate::analysis::{self, WalletOverview};
use crate::errors::AppError;
use crate::models::{Blockchain, TokenHolding};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct WalletQuery {
    pub blockchain: Option<String>,
}

/// `0x` addresses default to Base, everything else to Solana.
fn default_chain(address: &str) -> Blockchain {
    if address.trim_start().starts_with("0x") {
        Blockchain::Base
    } else {
        Blockchain::Solana
    }
}

pub async fn overview(
    State(state): State<AppState>,
    Path(address): Path<String>,
    query: Result<Query<WalletQuery>, QueryRejection>,
) -> Result<Json<WalletOverview>, AppError> {
    let Query(q) = query?;
    let chain = parse_chain(q.blockchain.as_deref(), default_chain(&address))?;
    let overview = analysis::wallet_overview(&state, &address, chain).await?;
    Ok(Json(overview))
}

pub async fn balances(
    State(state): State<AppState>,
    Path(address): Path<String>,
    query: Result<Query<WalletQuery>, QueryRejection>,
) -> Result<Json<Vec<TokenHolding>>, AppError> {
    let Query(q) = query?;
    let chain = parse_chain(q.blockchain.as_deref(), default_chain(&address))?;
    let holdings = analysis::wallet_balances(&state, &address, chain).await?;
    Ok(Json(holdings))
}

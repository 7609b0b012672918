use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::analysis;
use crate::errors::AppError;
use crate::models::{Blockchain, TradeStats};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub wallet_address: String,
    pub blockchain: String,
}

pub async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<TradeStats>, AppError> {
    let Json(req) = payload?;
    let chain: Blockchain = req.blockchain.parse().map_err(AppError::BadRequest)?;
    tracing::info!(wallet = %req.wallet_address, chain = %chain, "Analyze request");

    let stats = analysis::analyze_wallet(&state, &req.wallet_address, chain).await?;
    Ok(Json(stats))
}

use axum::{
    extract::{Path, Query, State},
    Json,
};
use ethers::types::H256;
use serde::Deserialize;
use std::str::FromStr;

use crate::{
    constants::HISTORY_PAGE_MAX,
    error::{AppError, Result},
    models::ApiResponse,
    services::tx_coordinator::TxRecord,
};

use super::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

// Internal helper that parses a 0x-prefixed 32-byte transaction hash.
fn parse_tx_hash(raw: &str) -> Result<H256> {
    let trimmed = raw.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .ok_or_else(|| AppError::BadRequest("invalid transaction hash".to_string()))?;
    if hex.len() != 64 {
        return Err(AppError::BadRequest("invalid transaction hash".to_string()));
    }
    H256::from_str(hex).map_err(|_| AppError::BadRequest("invalid transaction hash".to_string()))
}

/// GET /tx/{hash}
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Json<ApiResponse<TxRecord>>> {
    let tx_hash = parse_tx_hash(&hash)?;
    let record = state
        .coordinator
        .get(&tx_hash)
        .await
        .ok_or_else(|| AppError::NotFound(format!("transaction {} not tracked", hash)))?;
    Ok(Json(ApiResponse::success(record)))
}

/// GET /tx
pub async fn list_recent(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Json<ApiResponse<Vec<TxRecord>>> {
    let limit = query.limit.unwrap_or(20).clamp(1, HISTORY_PAGE_MAX);
    Json(ApiResponse::success(state.coordinator.recent(limit).await))
}

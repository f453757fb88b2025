use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::{AppError, Result},
    models::{ApiResponse, BalanceResponse, TokenInfoResponse},
};

use super::AppState;

/// GET /balance/{address}
pub async fn get_balance(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<ApiResponse<BalanceResponse>>> {
    let response = state.games.balance(&address).await?;
    Ok(Json(ApiResponse::success(response)))
}

/// GET /token
pub async fn get_token_info(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<TokenInfoResponse>>> {
    let metadata = state.chain.token_metadata().await.map_err(|e| {
        tracing::warn!("Token metadata lookup failed: {}", e);
        AppError::step("token lookup failed", e)
    })?;

    Ok(Json(ApiResponse::success(TokenInfoResponse {
        name: metadata.name,
        symbol: metadata.symbol,
        decimals: metadata.decimals,
        token_address: format!("{:#x}", state.chain.token_address()),
        game_address: format!("{:#x}", state.chain.game_address()),
        operator: format!("{:#x}", state.chain.operator()),
        chain_id: state.config.chain_id,
    })))
}

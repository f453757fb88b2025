use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};

use crate::{
    error::{AppError, Result},
    models::{ApiResponse, MintQuery, MintResponse, PlayRequest, PlayResponse},
};

use super::AppState;

/// POST /play
pub async fn play(
    State(state): State<AppState>,
    payload: std::result::Result<Json<PlayRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<PlayResponse>>> {
    let Json(req) = payload.map_err(|rejection| {
        tracing::debug!("Rejected play body: {}", rejection);
        AppError::BadRequest("invalid input".to_string())
    })?;

    let response = state.games.play(&req.address, req.guess).await?;
    Ok(Json(ApiResponse::success(response)))
}

/// GET /mint
/// Mints to the operator unless `?to=` names another address.
pub async fn mint(
    State(state): State<AppState>,
    Query(query): Query<MintQuery>,
) -> Result<Json<ApiResponse<MintResponse>>> {
    let response = state.games.mint(query.to.as_deref()).await?;
    Ok(Json(ApiResponse::success(response)))
}

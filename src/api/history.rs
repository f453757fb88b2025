use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    constants::{HISTORY_PAGE_DEFAULT, HISTORY_PAGE_MAX},
    error::Result,
    models::{ApiResponse, HistoryEntry, StreakStats},
    utils::parse_address,
};

use super::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub address: String,
    pub items: Vec<HistoryEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakResponse {
    pub address: String,
    pub target: u32,
    #[serde(flatten)]
    pub stats: StreakStats,
}

// Internal helper that clamps the requested page size.
fn page_limit(requested: Option<usize>) -> usize {
    requested
        .unwrap_or(HISTORY_PAGE_DEFAULT)
        .clamp(1, HISTORY_PAGE_MAX)
}

/// GET /history/{address}
pub async fn get_history(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<HistoryResponse>>> {
    let player = parse_address(&address)?;
    let items = state.history.list(&player, page_limit(query.limit)).await;

    Ok(Json(ApiResponse::success(HistoryResponse {
        address: format!("{:#x}", player),
        items,
    })))
}

/// GET /streak/{address}
pub async fn get_streak(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<ApiResponse<StreakResponse>>> {
    let player = parse_address(&address)?;
    let stats = state.streaks.get(&player).await;

    Ok(Json(ApiResponse::success(StreakResponse {
        address: format!("{:#x}", player),
        target: state.streaks.target(),
        stats,
    })))
}

use axum::{extract::State, Json};
use serde::Serialize;
use super::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub chain_id: u64,
    pub operator: String,
    pub rpc: String,
    pub latest_block: Option<u64>,
    pub pending_txs: usize,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    // A failing RPC does not fail the health check, it is reported instead
    let latest_block = state.chain.block_number().await.ok();
    let rpc_status = if latest_block.is_some() {
        "connected".to_string()
    } else {
        "unreachable".to_string()
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        chain_id: state.config.chain_id,
        operator: format!("{:#x}", state.chain.operator()),
        rpc: rpc_status,
        latest_block,
        pending_txs: state.coordinator.pending().await.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_state;

    #[tokio::test]
    async fn health_reports_head_and_operator() {
        let (state, chain) = test_state();
        *chain.head.lock().unwrap() = 77;

        let Json(health) = health_check(State(state)).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.rpc, "connected");
        assert_eq!(health.latest_block, Some(77));
        assert_eq!(health.chain_id, 11155111);
        assert_eq!(health.pending_txs, 0);
    }
}

// All service modules
pub mod chain;
pub mod event_watcher;
pub mod game_service;
pub mod history;
pub mod outcome;
pub mod streak;
pub mod tx_coordinator;

// Re-export for convenience
pub use chain::{EthersGameChain, GameChain};
pub use event_watcher::EventWatcher;
pub use game_service::GameService;
pub use history::GameHistory;
pub use streak::StreakTracker;
pub use tx_coordinator::TxCoordinator;

use crate::api::AppState;
use std::sync::Arc;

/// Start all background services
pub async fn start_background_services(state: AppState) {
    tracing::info!("Starting background services...");

    state.coordinator.clone().start().await;

    if state.config.enable_event_watcher {
        let watcher = Arc::new(EventWatcher::new(
            state.chain.clone(),
            state.coordinator.clone(),
            state.history.clone(),
            state.streaks.clone(),
            state.config.streak_bonus_tokens,
            state.config.event_poll_interval_secs,
            state.config.event_max_blocks_per_tick,
        ));
        watcher.start().await;
    } else {
        tracing::warn!("Event watcher disabled via ENABLE_EVENT_WATCHER");
    }

    tracing::info!("All background services started successfully");
}

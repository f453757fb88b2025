// src/api/mod.rs

pub mod balance;
pub mod game;
pub mod health;
pub mod history;
pub mod transactions;

use std::sync::Arc;

use crate::config::Config;
use crate::services::{GameChain, GameHistory, GameService, StreakTracker, TxCoordinator};

// AppState definition
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub chain: Arc<dyn GameChain>,
    pub coordinator: Arc<TxCoordinator>,
    pub history: Arc<GameHistory>,
    pub streaks: Arc<StreakTracker>,
    pub games: Arc<GameService>,
}

impl AppState {
    pub fn new(config: Config, chain: Arc<dyn GameChain>) -> Self {
        let coordinator = Arc::new(TxCoordinator::new(chain.clone()));
        let history = Arc::new(GameHistory::new(config.history_max_entries));
        let streaks = Arc::new(StreakTracker::new(config.streak_target));
        let games = Arc::new(GameService::new(
            chain.clone(),
            coordinator.clone(),
            history.clone(),
            &config,
        ));
        Self {
            config,
            chain,
            coordinator,
            history,
            streaks,
            games,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_state() -> (AppState, Arc<crate::services::chain::mock::MockChain>) {
    let chain = Arc::new(crate::services::chain::mock::MockChain::default());
    let state = AppState::new(crate::config::test_config(), chain.clone());
    (state, chain)
}

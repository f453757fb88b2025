use ethers::types::Address;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{interval, sleep, Duration};

use crate::{
    constants::{EVENT_BACKOFF_MAX_SECS, EVENT_INITIAL_BACKFILL_BLOCKS},
    error::{AppError, Result},
    models::{GameEvent, GameEventKind},
    services::{
        chain::GameChain,
        history::GameHistory,
        streak::{StreakOutcome, StreakTracker},
        tx_coordinator::{TxCoordinator, TxKind},
    },
    utils::tokens_to_base_units,
};

// Internal helper that checks conditions for `is_transient_rpc_error`.
fn is_transient_rpc_error(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("too many requests")
        || lower.contains("429")
        || lower.contains("timeout")
        || lower.contains("timed out")
        || lower.contains("gateway")
        || lower.contains("temporarily unavailable")
        || lower.contains("connection reset")
        || lower.contains("error decoding response body")
}

// Internal helper that supports `backoff_secs` operations.
fn backoff_secs(base: u64, failures: u32) -> u64 {
    let exponent = failures.saturating_sub(1).min(5);
    let candidate = base.max(1).saturating_mul(1_u64 << exponent);
    candidate.clamp(base.max(1), EVENT_BACKOFF_MAX_SECS)
}

/// Block range for the next scan, or `None` when caught up.
fn next_range(last_block: Option<u64>, head: u64, max_blocks: u64) -> Option<(u64, u64)> {
    let start = match last_block {
        Some(last) if head <= last => return None,
        Some(last) => last + 1,
        None => head.saturating_sub(EVENT_INITIAL_BACKFILL_BLOCKS.saturating_sub(1)),
    };
    let end = start
        .saturating_add(max_blocks.max(1).saturating_sub(1))
        .min(head);
    Some((start, end))
}

/// Follows the game contract's events: feeds history, tracks win streaks and
/// mints the streak bonus.
pub struct EventWatcher {
    chain: Arc<dyn GameChain>,
    coordinator: Arc<TxCoordinator>,
    history: Arc<GameHistory>,
    streaks: Arc<StreakTracker>,
    bonus_tokens: u64,
    poll_interval_secs: u64,
    max_blocks_per_tick: u64,
    last_block: RwLock<Option<u64>>,
}

impl EventWatcher {
    pub fn new(
        chain: Arc<dyn GameChain>,
        coordinator: Arc<TxCoordinator>,
        history: Arc<GameHistory>,
        streaks: Arc<StreakTracker>,
        bonus_tokens: u64,
        poll_interval_secs: u64,
        max_blocks_per_tick: u64,
    ) -> Self {
        Self {
            chain,
            coordinator,
            history,
            streaks,
            bonus_tokens,
            poll_interval_secs: poll_interval_secs.max(1),
            max_blocks_per_tick: max_blocks_per_tick.max(1),
            last_block: RwLock::new(None),
        }
    }

    /// Start the watcher loop
    pub async fn start(self: Arc<Self>) {
        tokio::spawn(async move {
            tracing::info!(
                "Listening for game events on {:#x}...",
                self.chain.game_address()
            );
            let mut ticker = interval(Duration::from_secs(self.poll_interval_secs));
            let mut transient_failures: u32 = 0;

            loop {
                ticker.tick().await;

                match self.poll_once().await {
                    Ok(_) => transient_failures = 0,
                    Err(e) => {
                        let err_text = e.to_string();
                        if is_transient_rpc_error(&err_text) {
                            transient_failures = transient_failures.saturating_add(1);
                            let wait = backoff_secs(self.poll_interval_secs, transient_failures);
                            tracing::warn!(
                                "Event watcher transient error: {} (backoff={}s, failures={})",
                                err_text,
                                wait,
                                transient_failures
                            );
                            sleep(Duration::from_secs(wait)).await;
                        } else {
                            transient_failures = 0;
                            tracing::error!("Subscription error: {}", err_text);
                        }
                    }
                }
            }
        });
    }

    /// Scans the next block range. Returns the number of events handled.
    pub async fn poll_once(&self) -> Result<usize> {
        let previous = *self.last_block.read().await;
        let head = self.chain.block_number().await?;
        let Some((start, end)) = next_range(previous, head, self.max_blocks_per_tick) else {
            return Ok(0);
        };

        tracing::debug!("Scanning game events in blocks {}..={}", start, end);
        let events = self.chain.game_events(start, end).await?;
        let count = events.len();
        for event in events {
            self.handle_event(&event).await;
        }

        *self.last_block.write().await = Some(end);
        Ok(count)
    }

    pub async fn handle_event(&self, event: &GameEvent) {
        tracing::info!(
            "New event log received: {} tx={:#x} block={} player={:#x}",
            event.kind.name(),
            event.tx_hash,
            event.block_number,
            event.kind.player()
        );

        // A play holds the submission lock until its history entry exists.
        let owner = {
            let _guard = self.coordinator.lock().await;
            self.history.apply_event(event).await
        };

        match &event.kind {
            GameEventKind::Win { .. } => match self.streaks.record_win(&owner).await {
                StreakOutcome::BonusDue => match self.mint_bonus(owner).await {
                    Ok(()) => self.streaks.confirm_bonus(&owner).await,
                    Err(e) => {
                        tracing::error!("Streak bonus mint for {:#x} failed: {}", owner, e);
                        self.streaks.bonus_failed(&owner).await;
                    }
                },
                StreakOutcome::Continues(n) => {
                    tracing::debug!("{:#x} is on a {}-win streak", owner, n);
                }
            },
            GameEventKind::Loss { .. } => self.streaks.record_loss(&owner).await,
            GameEventKind::BetPlaced { .. } => {}
        }
    }

    async fn mint_bonus(&self, to: Address) -> Result<()> {
        let amount = tokens_to_base_units(self.bonus_tokens);
        let _guard = self.coordinator.lock().await;
        let tx = self
            .chain
            .mint(to, amount)
            .await
            .map_err(|e| AppError::step("bonus mint failed", e))?;
        self.coordinator
            .record(tx, TxKind::StreakBonus, Some(format!("{:#x}", to)))
            .await;
        tracing::info!(
            "Streak bonus of {} tokens minted to {:#x}: {:#x}",
            self.bonus_tokens,
            to,
            tx
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::chain::mock::{MockChain, Submitted};
    use ethers::types::{H256, U256};

    fn watcher(chain: Arc<MockChain>, history: Arc<GameHistory>) -> EventWatcher {
        let coordinator = Arc::new(TxCoordinator::new(chain.clone()));
        EventWatcher::new(
            chain,
            coordinator,
            history,
            Arc::new(StreakTracker::new(3)),
            100,
            1,
            50,
        )
    }

    fn win(player: Address, tx: u64, block: u64) -> GameEvent {
        GameEvent {
            kind: GameEventKind::Win {
                player,
                prize: U256::from(20u64),
            },
            tx_hash: H256::from_low_u64_be(tx),
            block_number: block,
            log_index: 0,
        }
    }

    fn loss(player: Address, tx: u64, block: u64) -> GameEvent {
        GameEvent {
            kind: GameEventKind::Loss { player },
            tx_hash: H256::from_low_u64_be(tx),
            block_number: block,
            log_index: 0,
        }
    }

    #[test]
    fn next_range_backfills_then_follows_head() {
        assert_eq!(next_range(None, 100, 500), Some((85, 100)));
        assert_eq!(next_range(None, 3, 500), Some((0, 3)));
        assert_eq!(next_range(Some(100), 100, 500), None);
        assert_eq!(next_range(Some(100), 2_000, 500), Some((101, 600)));
    }

    #[test]
    fn backoff_grows_and_caps() {
        assert_eq!(backoff_secs(5, 1), 5);
        assert_eq!(backoff_secs(5, 2), 10);
        assert_eq!(backoff_secs(5, 3), 20);
        assert_eq!(backoff_secs(5, 20), EVENT_BACKOFF_MAX_SECS);
    }

    #[test]
    fn transient_errors_are_recognized() {
        assert!(is_transient_rpc_error("HTTP 429 Too Many Requests"));
        assert!(is_transient_rpc_error("request timed out"));
        assert!(!is_transient_rpc_error("execution reverted"));
    }

    #[tokio::test]
    async fn three_wins_mint_a_bonus_once() {
        let chain = Arc::new(MockChain::default());
        let player = Address::repeat_byte(0x33);
        let watcher = watcher(chain.clone(), Arc::new(GameHistory::new(10)));

        for n in 1..=3 {
            watcher.handle_event(&win(player, n, n)).await;
        }
        assert_eq!(
            chain.submitted(),
            vec![Submitted::Mint(player, tokens_to_base_units(100))]
        );
        let recent = watcher.coordinator.recent(5).await;
        assert_eq!(recent[0].kind, TxKind::StreakBonus);

        assert_eq!(watcher.streaks.get(&player).await.bonuses_awarded, 1);

        watcher.handle_event(&win(player, 4, 4)).await;
        assert_eq!(chain.submitted().len(), 1);
    }

    #[tokio::test]
    async fn rejected_bonus_mint_is_reported_as_failed() {
        let chain = Arc::new(MockChain::default());
        *chain.fail_mint.lock().unwrap() = true;
        let player = Address::repeat_byte(0x36);
        let watcher = watcher(chain.clone(), Arc::new(GameHistory::new(10)));

        for n in 1..=3 {
            watcher.handle_event(&win(player, n, n)).await;
        }

        assert!(chain.submitted().is_empty());
        assert!(watcher.coordinator.recent(5).await.is_empty());
        let stats = watcher.streaks.get(&player).await;
        assert_eq!(stats.bonuses_awarded, 0);
        assert_eq!(stats.bonuses_failed, 1);
        assert_eq!(stats.current, 0);
    }

    #[tokio::test]
    async fn loss_in_between_prevents_bonus() {
        let chain = Arc::new(MockChain::default());
        let player = Address::repeat_byte(0x34);
        let watcher = watcher(chain.clone(), Arc::new(GameHistory::new(10)));

        watcher.handle_event(&win(player, 1, 1)).await;
        watcher.handle_event(&win(player, 2, 2)).await;
        watcher.handle_event(&loss(player, 3, 3)).await;
        watcher.handle_event(&win(player, 4, 4)).await;
        assert!(chain.submitted().is_empty());
    }

    #[tokio::test]
    async fn streak_follows_the_requester_of_gateway_plays() {
        let chain = Arc::new(MockChain::default());
        let history = Arc::new(GameHistory::new(10));
        let requester = Address::repeat_byte(0x0f);
        let operator = MockChain::operator_address();
        let watcher = watcher(chain.clone(), history.clone());

        for n in 1..=3u64 {
            history
                .record_submission(requester, H256::from_low_u64_be(n), 5, None)
                .await;
            watcher.handle_event(&win(operator, n, n)).await;
        }
        assert_eq!(
            chain.submitted(),
            vec![Submitted::Mint(requester, tokens_to_base_units(100))]
        );
    }

    #[tokio::test]
    async fn events_wait_for_an_in_flight_play_to_be_recorded() {
        let chain = Arc::new(MockChain::default());
        let history = Arc::new(GameHistory::new(10));
        let requester = Address::repeat_byte(0x1f);
        let operator = MockChain::operator_address();
        let watcher = Arc::new(watcher(chain.clone(), history.clone()));

        let guard = watcher.coordinator.lock().await;
        let handle = {
            let watcher = watcher.clone();
            tokio::spawn(async move { watcher.handle_event(&loss(operator, 9, 1)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        history
            .record_submission(requester, H256::from_low_u64_be(9), 4, None)
            .await;
        drop(guard);
        handle.await.unwrap();

        let entries = history.list(&requester, 10).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, crate::models::HistoryStatus::Lost);
        assert!(history.list(&operator, 10).await.is_empty());
    }

    #[tokio::test]
    async fn poll_advances_cursor_only_on_success() {
        let chain = Arc::new(MockChain::default());
        let player = Address::repeat_byte(0x35);
        *chain.head.lock().unwrap() = 10;
        chain.events.lock().unwrap().push(win(player, 1, 9));
        let watcher = watcher(chain.clone(), Arc::new(GameHistory::new(10)));

        assert_eq!(watcher.poll_once().await.unwrap(), 1);
        assert_eq!(*watcher.last_block.read().await, Some(10));

        *chain.head.lock().unwrap() = 12;
        *chain.fail_events.lock().unwrap() = true;
        assert!(watcher.poll_once().await.is_err());
        assert_eq!(*watcher.last_block.read().await, Some(10));

        *chain.fail_events.lock().unwrap() = false;
        chain.events.lock().unwrap().push(loss(player, 2, 11));
        assert_eq!(watcher.poll_once().await.unwrap(), 1);
        assert_eq!(*watcher.last_block.read().await, Some(12));
        assert_eq!(watcher.poll_once().await.unwrap(), 0);
    }
}

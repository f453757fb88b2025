use ethers::types::Address;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::{models::StreakStats, utils::address_key};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakOutcome {
    /// Streak grew but has not reached the target.
    Continues(u32),
    /// Target reached; the counter is already reset. Report the mint result
    /// back with `confirm_bonus` or `bonus_failed`.
    BonusDue,
}

/// Consecutive-win counters per player address.
pub struct StreakTracker {
    target: u32,
    streaks: Mutex<HashMap<String, StreakStats>>,
}

impl StreakTracker {
    pub fn new(target: u32) -> Self {
        Self {
            target: target.max(1),
            streaks: Mutex::new(HashMap::new()),
        }
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    pub async fn record_win(&self, player: &Address) -> StreakOutcome {
        let mut streaks = self.streaks.lock().await;
        let stats = streaks.entry(address_key(player)).or_default();
        stats.current += 1;
        stats.best = stats.best.max(stats.current);
        if stats.current >= self.target {
            stats.current = 0;
            return StreakOutcome::BonusDue;
        }
        StreakOutcome::Continues(stats.current)
    }

    pub async fn confirm_bonus(&self, player: &Address) {
        let mut streaks = self.streaks.lock().await;
        streaks.entry(address_key(player)).or_default().bonuses_awarded += 1;
    }

    pub async fn bonus_failed(&self, player: &Address) {
        let mut streaks = self.streaks.lock().await;
        streaks.entry(address_key(player)).or_default().bonuses_failed += 1;
    }

    pub async fn record_loss(&self, player: &Address) {
        let mut streaks = self.streaks.lock().await;
        streaks.entry(address_key(player)).or_default().current = 0;
    }

    pub async fn get(&self, player: &Address) -> StreakStats {
        self.streaks
            .lock()
            .await
            .get(&address_key(player))
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn third_consecutive_win_triggers_bonus_and_resets() {
        let tracker = StreakTracker::new(3);
        let player = Address::repeat_byte(0x42);

        assert_eq!(tracker.record_win(&player).await, StreakOutcome::Continues(1));
        assert_eq!(tracker.record_win(&player).await, StreakOutcome::Continues(2));
        assert_eq!(tracker.record_win(&player).await, StreakOutcome::BonusDue);

        let stats = tracker.get(&player).await;
        assert_eq!(stats.current, 0);
        assert_eq!(stats.best, 3);
        assert_eq!(stats.bonuses_awarded, 0);

        tracker.confirm_bonus(&player).await;
        assert_eq!(tracker.get(&player).await.bonuses_awarded, 1);
    }

    #[tokio::test]
    async fn failed_bonus_is_not_counted_as_awarded() {
        let tracker = StreakTracker::new(1);
        let player = Address::repeat_byte(0x43);

        assert_eq!(tracker.record_win(&player).await, StreakOutcome::BonusDue);
        tracker.bonus_failed(&player).await;

        let stats = tracker.get(&player).await;
        assert_eq!(stats.bonuses_awarded, 0);
        assert_eq!(stats.bonuses_failed, 1);
    }

    #[tokio::test]
    async fn loss_breaks_the_streak() {
        let tracker = StreakTracker::new(3);
        let player = Address::repeat_byte(0x42);

        tracker.record_win(&player).await;
        tracker.record_win(&player).await;
        tracker.record_loss(&player).await;
        assert_eq!(tracker.record_win(&player).await, StreakOutcome::Continues(1));
        assert_eq!(tracker.get(&player).await.bonuses_awarded, 0);
    }

    #[tokio::test]
    async fn players_are_tracked_independently() {
        let tracker = StreakTracker::new(2);
        let a = Address::repeat_byte(0x0a);
        let b = Address::repeat_byte(0x0b);

        tracker.record_win(&a).await;
        tracker.record_loss(&b).await;
        assert_eq!(tracker.record_win(&a).await, StreakOutcome::BonusDue);
        assert_eq!(tracker.get(&b).await, StreakStats::default());
    }

    #[tokio::test]
    async fn concurrent_wins_award_exactly_one_bonus_per_target() {
        let tracker = Arc::new(StreakTracker::new(3));
        let player = Address::repeat_byte(0x77);

        let mut handles = Vec::new();
        for _ in 0..9 {
            let tracker = tracker.clone();
            handles.push(tokio::spawn(async move { tracker.record_win(&player).await }));
        }
        let mut bonuses = 0;
        for handle in handles {
            if handle.await.unwrap() == StreakOutcome::BonusDue {
                bonuses += 1;
            }
        }
        assert_eq!(bonuses, 3);
        assert_eq!(tracker.get(&player).await.current, 0);
    }
}

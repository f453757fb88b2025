use chrono::Utc;
use ethers::types::{Address, H256};
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;

use crate::{
    constants::HISTORY_OWNERS_MAX,
    models::{GameEvent, GameEventKind, HistoryEntry, HistoryStatus, Prediction},
    utils::address_key,
};

struct Slot {
    tx: H256,
    entry: HistoryEntry,
}

#[derive(Default)]
struct Book {
    by_player: HashMap<String, VecDeque<Slot>>,
    // play tx -> address the play is attributed to; outlives the player's entry
    owners: HashMap<H256, Address>,
    owner_order: VecDeque<H256>,
}

impl Book {
    fn slot_mut(&mut self, owner: &Address, tx: &H256) -> Option<&mut Slot> {
        self.by_player
            .get_mut(&address_key(owner))?
            .iter_mut()
            .find(|slot| slot.tx == *tx)
    }

    fn claim(&mut self, tx: H256, owner: Address) {
        if self.owners.insert(tx, owner).is_none() {
            self.owner_order.push_back(tx);
        }
        while self.owner_order.len() > HISTORY_OWNERS_MAX {
            if let Some(old) = self.owner_order.pop_front() {
                self.owners.remove(&old);
            }
        }
    }

    fn push(&mut self, owner: Address, slot: Slot, cap: usize) {
        self.claim(slot.tx, owner);
        let entries = self.by_player.entry(address_key(&owner)).or_default();
        entries.push_back(slot);
        while entries.len() > cap {
            entries.pop_front();
        }
    }
}

/// In-memory game history per player. Lost on restart.
pub struct GameHistory {
    cap: usize,
    book: RwLock<Book>,
}

impl GameHistory {
    pub fn new(max_entries_per_player: usize) -> Self {
        Self {
            cap: max_entries_per_player.max(1),
            book: RwLock::new(Book::default()),
        }
    }

    /// Adds a pending entry for a play submitted on behalf of `requester`.
    pub async fn record_submission(
        &self,
        requester: Address,
        play_tx: H256,
        guess: u8,
        predicted: Option<Prediction>,
    ) {
        let slot = Slot {
            tx: play_tx,
            entry: HistoryEntry {
                play_tx: format!("{:#x}", play_tx),
                guess: Some(guess),
                status: HistoryStatus::Submitted,
                winning_number: None,
                prize: None,
                predicted,
                submitted_at: Utc::now(),
                resolved_at: None,
            },
        };
        self.book.write().await.push(requester, slot, self.cap);
    }

    /// Folds a contract event into the history. Returns the address the
    /// event was attributed to: the requester for gateway plays, otherwise
    /// the event's player. Events of a play whose entry was already evicted
    /// still count for its requester but add no entry.
    pub async fn apply_event(&self, event: &GameEvent) -> Address {
        let mut book = self.book.write().await;
        let claimed = book.owners.get(&event.tx_hash).copied();
        let owner = claimed.unwrap_or_else(|| event.kind.player());

        if claimed.is_none() {
            let slot = Slot {
                tx: event.tx_hash,
                entry: HistoryEntry {
                    play_tx: format!("{:#x}", event.tx_hash),
                    guess: None,
                    status: HistoryStatus::Submitted,
                    winning_number: None,
                    prize: None,
                    predicted: None,
                    submitted_at: Utc::now(),
                    resolved_at: None,
                },
            };
            book.push(owner, slot, self.cap);
        }

        if let Some(slot) = book.slot_mut(&owner, &event.tx_hash) {
            let entry = &mut slot.entry;
            match &event.kind {
                GameEventKind::BetPlaced { guess, winning, .. } => {
                    entry.guess.get_or_insert(*guess);
                    entry.winning_number = Some(*winning);
                }
                GameEventKind::Win { prize, .. } => {
                    entry.status = HistoryStatus::Won;
                    entry.prize = Some(prize.to_string());
                    entry.resolved_at = Some(Utc::now());
                }
                GameEventKind::Loss { .. } => {
                    entry.status = HistoryStatus::Lost;
                    entry.resolved_at = Some(Utc::now());
                }
            }
        }

        owner
    }

    /// Newest first.
    pub async fn list(&self, player: &Address, limit: usize) -> Vec<HistoryEntry> {
        let book = self.book.read().await;
        book.by_player
            .get(&address_key(player))
            .map(|entries| {
                entries
                    .iter()
                    .rev()
                    .take(limit)
                    .map(|slot| slot.entry.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

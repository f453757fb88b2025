use chrono::{DateTime, Duration as ChronoDuration, Utc};
use ethers::types::H256;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tokio::time::{interval, Duration};

use crate::{
    constants::{RECEIPT_POLL_INTERVAL_SECS, TX_PENDING_TIMEOUT_SECS, TX_RECORDS_MAX},
    error::Result,
    services::chain::GameChain,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    Approve,
    Play,
    Mint,
    StreakBonus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    Confirmed,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxRecord {
    pub hash: String,
    pub kind: TxKind,
    pub status: TxStatus,
    pub requester: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Exclusive right to submit transactions with the operator key.
pub type SubmissionGuard<'a> = MutexGuard<'a, ()>;

#[derive(Default)]
struct Registry {
    records: HashMap<H256, TxRecord>,
    order: VecDeque<H256>,
}

impl Registry {
    // Evicts the oldest resolved records first; pending ones go only when
    // resolved records alone cannot bring the registry under the cap.
    fn evict(&mut self, cap: usize) {
        if self.order.len() <= cap {
            return;
        }
        let mut excess = self.order.len() - cap;
        let records = &mut self.records;
        self.order.retain(|hash| {
            if excess == 0 {
                return true;
            }
            let resolved = records
                .get(hash)
                .map(|r| r.status != TxStatus::Pending)
                .unwrap_or(true);
            if resolved {
                records.remove(hash);
                excess -= 1;
                false
            } else {
                true
            }
        });

        while self.order.len() > cap {
            if let Some(hash) = self.order.pop_front() {
                tracing::warn!("Evicting unresolved transaction {:#x}", hash);
                self.records.remove(&hash);
            }
        }
    }
}

/// Serializes operator-key submissions and tracks every submitted
/// transaction until its receipt settles it.
pub struct TxCoordinator {
    chain: Arc<dyn GameChain>,
    submit_lock: Mutex<()>,
    registry: RwLock<Registry>,
    cap: usize,
    pending_timeout: ChronoDuration,
}

impl TxCoordinator {
    pub fn new(chain: Arc<dyn GameChain>) -> Self {
        Self::with_capacity(chain, TX_RECORDS_MAX)
    }

    pub fn with_capacity(chain: Arc<dyn GameChain>, cap: usize) -> Self {
        Self::with_limits(chain, cap, ChronoDuration::seconds(TX_PENDING_TIMEOUT_SECS))
    }

    /// `pending_timeout`: how long a transaction may stay unmined before it
    /// is marked failed.
    pub fn with_limits(
        chain: Arc<dyn GameChain>,
        cap: usize,
        pending_timeout: ChronoDuration,
    ) -> Self {
        Self {
            chain,
            submit_lock: Mutex::new(()),
            registry: RwLock::new(Registry::default()),
            cap: cap.max(1),
            pending_timeout,
        }
    }

    /// Hold the returned guard for the whole multi-transaction sequence.
    pub async fn lock(&self) -> SubmissionGuard<'_> {
        self.submit_lock.lock().await
    }

    pub async fn record(&self, hash: H256, kind: TxKind, requester: Option<String>) -> TxRecord {
        let record = TxRecord {
            hash: format!("{:#x}", hash),
            kind,
            status: TxStatus::Pending,
            requester,
            submitted_at: Utc::now(),
            resolved_at: None,
        };
        let mut registry = self.registry.write().await;
        if registry.records.insert(hash, record.clone()).is_none() {
            registry.order.push_back(hash);
        }
        registry.evict(self.cap);
        record
    }

    pub async fn get(&self, hash: &H256) -> Option<TxRecord> {
        self.registry.read().await.records.get(hash).cloned()
    }

    pub async fn pending(&self) -> Vec<H256> {
        let registry = self.registry.read().await;
        registry
            .order
            .iter()
            .filter(|h| {
                registry
                    .records
                    .get(h)
                    .map(|r| r.status == TxStatus::Pending)
                    .unwrap_or(false)
            })
            .copied()
            .collect()
    }

    /// Newest first.
    pub async fn recent(&self, limit: usize) -> Vec<TxRecord> {
        let registry = self.registry.read().await;
        registry
            .order
            .iter()
            .rev()
            .filter_map(|h| registry.records.get(h).cloned())
            .take(limit)
            .collect()
    }

    /// Polls receipts of pending transactions once. Returns how many settled.
    /// Transactions unmined past the pending timeout settle as failed.
    pub async fn refresh(&self) -> Result<usize> {
        let mut settled = 0;
        for hash in self.pending().await {
            let status = match self.chain.receipt_status(hash).await {
                Ok(Some(true)) => TxStatus::Confirmed,
                Ok(Some(false)) => TxStatus::Failed,
                Ok(None) if self.timed_out(&hash).await => {
                    tracing::warn!(
                        "Transaction {:#x} unmined after {}s; treating it as dropped",
                        hash,
                        self.pending_timeout.num_seconds()
                    );
                    TxStatus::Failed
                }
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!("Receipt lookup for {:#x} failed: {}", hash, e);
                    continue;
                }
            };

            let mut registry = self.registry.write().await;
            if let Some(record) = registry.records.get_mut(&hash) {
                record.status = status;
                record.resolved_at = Some(Utc::now());
                settled += 1;
                match status {
                    TxStatus::Failed => tracing::warn!(
                        "Transaction {} ({:?}) reverted",
                        record.hash,
                        record.kind
                    ),
                    _ => tracing::info!("Transaction {} ({:?}) confirmed", record.hash, record.kind),
                }
            }
        }
        Ok(settled)
    }

    async fn timed_out(&self, hash: &H256) -> bool {
        self.registry
            .read()
            .await
            .records
            .get(hash)
            .map(|r| Utc::now() - r.submitted_at >= self.pending_timeout)
            .unwrap_or(false)
    }

    /// Start the receipt poller loop
    pub async fn start(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(RECEIPT_POLL_INTERVAL_SECS));
            loop {
                ticker.tick().await;
                if let Err(e) = self.refresh().await {
                    tracing::error!("Receipt poller error: {}", e);
                }
            }
        });
    }
}

//! In-memory ledger twin, month-partitioned like the Postgres store.
//!
//! Used by tests and the development profile. Same append-only discipline:
//! the only mutation is pushing a new row into its month partition.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use certus_types::Verdict;

use crate::error::{LedgerError, LedgerResult};
use crate::model::VerdictRow;
use crate::traits::{LedgerAnalytics, QueryWindow, VerdictStore};

/// Month key → rows in append order.
type Partitions = BTreeMap<String, Vec<VerdictRow>>;

pub struct MemoryVerdictStore {
    partitions: RwLock<Partitions>,
    next_id: AtomicI64,
}

impl MemoryVerdictStore {
    pub fn new() -> Self {
        Self {
            partitions: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Number of persisted rows.
    pub async fn len(&self) -> usize {
        self.partitions.read().await.values().map(Vec::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Partition keys currently present, oldest first.
    pub async fn partitions(&self) -> Vec<String> {
        self.partitions.read().await.keys().cloned().collect()
    }

    pub(crate) async fn all_rows_newest_first(&self) -> Vec<VerdictRow> {
        let partitions = self.partitions.read().await;
        let mut rows: Vec<VerdictRow> = partitions.values().flatten().cloned().collect();
        rows.sort_by(|a, b| (b.timestamp, b.id).cmp(&(a.timestamp, a.id)));
        rows
    }
}

impl Default for MemoryVerdictStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VerdictStore for MemoryVerdictStore {
    async fn append(&self, verdict: &Verdict) -> LedgerResult<()> {
        let mut row = VerdictRow::from_verdict(verdict)?;

        let mut partitions = self.partitions.write().await;
        let duplicate = partitions
            .values()
            .flatten()
            .any(|r| r.trace_id == row.trace_id);
        if duplicate {
            return Err(LedgerError::Conflict(row.trace_id));
        }

        row.id = self.next_id.fetch_add(1, Ordering::SeqCst);
        partitions.entry(row.partition_key()).or_default().push(row);
        Ok(())
    }

    async fn list(&self, window: QueryWindow) -> LedgerResult<Vec<VerdictRow>> {
        let rows = self.all_rows_newest_first().await;
        let iter = rows.into_iter().skip(window.offset);
        Ok(if window.limit == 0 {
            iter.collect()
        } else {
            iter.take(window.limit).collect()
        })
    }

    async fn find_by_trace(&self, trace_id: &str) -> LedgerResult<Option<VerdictRow>> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .values()
            .flatten()
            .find(|r| r.trace_id == trace_id)
            .cloned())
    }

    async fn analytics(&self, since: Option<DateTime<Utc>>) -> LedgerResult<LedgerAnalytics> {
        let partitions = self.partitions.read().await;
        let rows = partitions
            .values()
            .flatten()
            .filter(|r| since.map(|s| r.timestamp >= s).unwrap_or(true));
        Ok(LedgerAnalytics::from_rows(rows))
    }
}

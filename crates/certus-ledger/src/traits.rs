use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use certus_types::Verdict;

use crate::error::LedgerResult;
use crate::model::VerdictRow;

/// Paged read window, newest-first. `limit == 0` means unbounded.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryWindow {
    pub limit: usize,
    pub offset: usize,
}

/// Aggregate figures over the ledger's read path.
///
/// `p95_latency_ms` is the certification KPI: 95% of verdicts must come in
/// under the governance budget for the deployment to stay certifiable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerAnalytics {
    pub total: u64,
    pub allowed: u64,
    pub denied: u64,
    pub escalated: u64,
    pub deny_rate: f64,
    pub escalate_rate: f64,
    pub avg_latency_ms: f64,
    pub p95_latency_ms: f64,
    pub max_latency_ms: f64,
    pub certifiable_rate: f64,
}

impl LedgerAnalytics {
    /// Fold rows into aggregate figures.
    pub fn from_rows<'a>(rows: impl Iterator<Item = &'a VerdictRow>) -> Self {
        let mut out = Self::default();
        let mut latencies = Vec::new();
        let mut certifiable = 0u64;

        for row in rows {
            out.total += 1;
            match row.decision.as_str() {
                "ALLOW" => out.allowed += 1,
                "DENY" => out.denied += 1,
                "ESCALATE" => out.escalated += 1,
                _ => {}
            }
            latencies.push(row.total_latency_ms);
            out.max_latency_ms = out.max_latency_ms.max(row.total_latency_ms);
            if row.certifiable {
                certifiable += 1;
            }
        }

        if out.total > 0 {
            let total = out.total as f64;
            out.deny_rate = out.denied as f64 / total;
            out.escalate_rate = out.escalated as f64 / total;
            out.avg_latency_ms = latencies.iter().sum::<f64>() / total;
            out.p95_latency_ms = percentile_nearest_rank(&mut latencies, 0.95);
            out.certifiable_rate = certifiable as f64 / total;
        }
        out
    }
}

/// Nearest-rank percentile over a sample; sorts in place.
fn percentile_nearest_rank(samples: &mut [f64], quantile: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let rank = ((quantile * samples.len() as f64).ceil() as usize).clamp(1, samples.len());
    samples[rank - 1]
}


/// Append-only verdict store.
///
/// `append` is the write-path contract the gate holds: one call per verdict,
/// no update, no delete. Everything else is the analytical read path.
#[async_trait]
pub trait VerdictStore: Send + Sync {
    /// Persist one verdict. The gate emits exactly one verdict per trace;
    /// backends may additionally reject duplicate trace ids.
    async fn append(&self, verdict: &Verdict) -> LedgerResult<()>;

    /// Rows newest-first.
    async fn list(&self, window: QueryWindow) -> LedgerResult<Vec<VerdictRow>>;

    /// The verdict row for one trace id.
    async fn find_by_trace(&self, trace_id: &str) -> LedgerResult<Option<VerdictRow>>;

    /// Aggregate figures since the given instant (all time when `None`).
    async fn analytics(&self, since: Option<DateTime<Utc>>) -> LedgerResult<LedgerAnalytics>;
}

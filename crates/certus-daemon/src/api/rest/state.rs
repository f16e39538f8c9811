use std::sync::Arc;

use chrono::{DateTime, Utc};

use certus_gate::ValidationGate;
use certus_ledger::VerdictStore;

use crate::metrics::GateMetrics;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<ValidationGate>,
    pub ledger: Arc<dyn VerdictStore>,
    pub metrics: Arc<GateMetrics>,
    pub started_at: DateTime<Utc>,
    pub version: String,
    /// When set, a ledger-write failure escalates to 503.
    pub complete_fail_closed: bool,
}

impl AppState {
    pub fn new(
        gate: Arc<ValidationGate>,
        ledger: Arc<dyn VerdictStore>,
        metrics: Arc<GateMetrics>,
        complete_fail_closed: bool,
    ) -> Self {
        Self {
            gate,
            ledger,
            metrics,
            started_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            complete_fail_closed,
        }
    }

    pub fn uptime(&self) -> String {
        let secs = (Utc::now() - self.started_at).num_seconds().max(0);
        format!("{}h{}m{}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

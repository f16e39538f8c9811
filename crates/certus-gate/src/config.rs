use std::time::Duration;

/// Stage deadlines and policy knobs for the Validation Gate.
///
/// Defaults match the certified latency profile: 200 ms total governance
/// budget, 500 ms semantic ceiling (the semantic stage may outlive the total
/// budget on its own only if the total race has not fired first), 150 ms per
/// validator, 50 ms for the ledger append.
#[derive(Clone, Debug)]
pub struct GateConfig {
    /// Total governance budget for one evaluation.
    pub total_budget_ms: u64,
    /// Semantic authority check deadline.
    pub semantic_budget_ms: u64,
    /// Default per-validator deadline; a validator's own declared timeout
    /// wins when it is lower.
    pub validator_budget_ms: u64,
    /// Ledger append deadline.
    pub persist_budget_ms: u64,
    /// How long a successful health probe is trusted.
    pub health_cache: Duration,
    /// Below this semantic coverage an otherwise-ALLOW verdict escalates.
    pub coverage_floor: f64,
    /// Maximum concurrently admitted evaluations before OVERLOAD refusal.
    pub max_inflight: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            total_budget_ms: 200,
            semantic_budget_ms: 500,
            validator_budget_ms: 150,
            persist_budget_ms: 50,
            health_cache: Duration::from_secs(30),
            coverage_floor: 0.8,
            max_inflight: 256,
        }
    }
}

impl GateConfig {
    /// Effective deadline for one validator: the lower of the validator's
    /// declared timeout and the gate-wide cap.
    pub fn effective_validator_budget(&self, declared_ms: u64) -> u64 {
        declared_ms.min(self.validator_budget_ms).max(1)
    }
}

//! Domain validators — deterministic rule evaluators, one regulatory
//! citation each.
//!
//! Validators are pure functions over `(action, context)`: no I/O, no shared
//! state, no mutation of the action. A validator that cannot compute because
//! required parameters are missing returns `Escalate` with
//! `INSUFFICIENT_CONTEXT`; that is a policy outcome, distinct from a crash
//! (which the gate records as `Deny`/`EXCEPTION`).

pub mod aviation;
pub mod fintech;

use certus_types::{ActionPrimitive, MaturityLevel, ValidatorVerdict};

pub use aviation::{AirspaceValidator, CrewRestValidator, FuelReserveValidator};
pub use fintech::{
    AmlRiskScoreValidator, AmlThresholdValidator, BeneficiaryValidator, PaymentLimitValidator,
    StrongCustomerAuthValidator,
};

/// Context derived from the agent's request, handed to every validator.
#[derive(Clone, Debug)]
pub struct ValidatorContext {
    pub maturity: MaturityLevel,
    pub trace_id: String,
}

impl ValidatorContext {
    pub fn new(maturity: MaturityLevel, trace_id: impl Into<String>) -> Self {
        Self {
            maturity,
            trace_id: trace_id.into(),
        }
    }
}

/// Uniform contract for a domain validator.
///
/// `validate` performs bounded local CPU work and must complete within
/// `timeout_ms`; the gate enforces the deadline and records latency, so
/// implementations report `latency_ms = 0` and let the dispatcher stamp it.
pub trait DomainValidator: Send + Sync {
    /// Stable registry name, snake_case.
    fn name(&self) -> &'static str;

    /// The regulatory citation this validator enforces.
    fn rule_id(&self) -> &'static str;

    /// Declared completion budget in milliseconds.
    fn timeout_ms(&self) -> u64 {
        150
    }

    fn validate(&self, action: &ActionPrimitive, ctx: &ValidatorContext) -> ValidatorVerdict;
}

/// Escalation verdict for a validator missing required parameters.
pub(crate) fn insufficient_context(name: &'static str, missing: &str) -> ValidatorVerdict {
    ValidatorVerdict::escalate(
        name,
        certus_types::reason::INSUFFICIENT_CONTEXT,
        format!("cannot compute: missing parameter `{}`", missing),
        0.0,
    )
}

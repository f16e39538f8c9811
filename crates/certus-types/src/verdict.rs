use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::action::{ActionPrimitive, MaturityLevel};

/// Final decision of the gateway for one action.
///
/// Conservative-veto ordering: `Deny` dominates `Escalate` dominates `Allow`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Allow,
    Deny,
    Escalate,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Allow => "ALLOW",
            Decision::Deny => "DENY",
            Decision::Escalate => "ESCALATE",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of the semantic authority check against the domain ontology.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SemanticVerdict {
    /// Allow or Deny; the semantic layer never escalates on its own —
    /// low coverage is downgraded to Escalate at aggregation.
    pub decision: Decision,
    /// Whether the verb exists in the domain ontology.
    pub ontology_match: bool,
    /// Whether the agent's maturity level authorizes the action.
    pub maturity_authorized: bool,
    /// Fraction of action parameters with declared governance, in [0, 1].
    /// 1.0 when the action has no parameters.
    pub coverage: f64,
    /// Citation-style reason string.
    pub reason: String,
}

impl SemanticVerdict {
    /// Authority granted.
    pub fn allowed(coverage: f64, reason: impl Into<String>) -> Self {
        Self {
            decision: Decision::Allow,
            ontology_match: true,
            maturity_authorized: true,
            coverage: coverage.clamp(0.0, 1.0),
            reason: reason.into(),
        }
    }

    /// Authority denied with both flags explicit.
    pub fn denied(
        ontology_match: bool,
        maturity_authorized: bool,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            decision: Decision::Deny,
            ontology_match,
            maturity_authorized,
            coverage: 0.0,
            reason: reason.into(),
        }
    }

    /// Placeholder verdict recorded when the semantic stage itself failed.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::denied(false, false, reason)
    }
}

/// Result of one domain validator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidatorVerdict {
    pub validator_name: String,
    pub decision: Decision,
    /// Regulatory citation, e.g. `FAA 14 CFR §91.151`, or a gate-assigned
    /// code (`TIMEOUT`, `EXCEPTION`) when the validator did not return.
    pub rule_id: String,
    pub rationale: String,
    pub latency_ms: f64,
    /// Fixed at 1.0 by contract — validators are deterministic.
    pub confidence: f64,
}

impl ValidatorVerdict {
    fn new(
        validator_name: impl Into<String>,
        decision: Decision,
        rule_id: impl Into<String>,
        rationale: impl Into<String>,
        latency_ms: f64,
    ) -> Self {
        Self {
            validator_name: validator_name.into(),
            decision,
            rule_id: rule_id.into(),
            rationale: rationale.into(),
            latency_ms,
            confidence: 1.0,
        }
    }

    pub fn pass(
        name: impl Into<String>,
        rule_id: impl Into<String>,
        rationale: impl Into<String>,
        latency_ms: f64,
    ) -> Self {
        Self::new(name, Decision::Allow, rule_id, rationale, latency_ms)
    }

    pub fn deny(
        name: impl Into<String>,
        rule_id: impl Into<String>,
        rationale: impl Into<String>,
        latency_ms: f64,
    ) -> Self {
        Self::new(name, Decision::Deny, rule_id, rationale, latency_ms)
    }

    pub fn escalate(
        name: impl Into<String>,
        rule_id: impl Into<String>,
        rationale: impl Into<String>,
        latency_ms: f64,
    ) -> Self {
        Self::new(name, Decision::Escalate, rule_id, rationale, latency_ms)
    }

    /// Slot recorded when a validator exceeded its declared timeout.
    pub fn timed_out(name: impl Into<String>, timeout_ms: u64) -> Self {
        let name = name.into();
        let rationale = format!("{} exceeded {} ms", name, timeout_ms);
        Self::new(
            name,
            Decision::Deny,
            crate::reason::TIMEOUT,
            rationale,
            timeout_ms as f64,
        )
    }

    /// Slot recorded when a validator panicked.
    pub fn crashed(name: impl Into<String>, message: impl Into<String>, latency_ms: f64) -> Self {
        Self::new(
            name,
            Decision::Deny,
            crate::reason::EXCEPTION,
            message,
            latency_ms,
        )
    }

    /// Whether this slot represents a validator that returned within budget.
    pub fn within_budget(&self) -> bool {
        self.rule_id != crate::reason::TIMEOUT && self.rule_id != crate::reason::EXCEPTION
    }
}

/// Wall-clock elapsed per pipeline stage, milliseconds.
///
/// Stages that were skipped (short-circuit paths) stay at zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentTimings {
    pub health_ms: f64,
    pub semantic_ms: f64,
    pub validators_ms: f64,
    pub sign_ms: f64,
    pub persist_ms: f64,
}

impl ComponentTimings {
    /// Sum of stages actually executed — the governance latency.
    pub fn total(&self) -> f64 {
        self.health_ms + self.semantic_ms + self.validators_ms + self.sign_ms + self.persist_ms
    }
}

/// The signed, audited outcome of one gate evaluation.
///
/// Emitted exactly once per [`ActionPrimitive`]; immutable thereafter. The
/// signature covers `{decision, reason, trace_id, validator_name: "gate"}`
/// in canonical sorted-key JSON, so any downstream mutation of those fields
/// is detectable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub trace_id: String,
    pub decision: Decision,
    pub reason: String,
    /// The action as accepted, echoed for the audit trail.
    pub action: ActionPrimitive,
    #[serde(default)]
    pub agent_id: Option<String>,
    pub agent_maturity: MaturityLevel,
    pub semantic: SemanticVerdict,
    /// Ordered by validator registry order, not completion order.
    pub validator_results: Vec<ValidatorVerdict>,
    /// Sum of executed stage timings, milliseconds.
    pub governance_latency_ms: f64,
    pub component_timings: ComponentTimings,
    /// True only when every stage ran inside its deadline and the verdict
    /// carries a signature.
    pub certifiable: bool,
    /// Hex HMAC over the canonical signing payload; empty when signing
    /// failed or was skipped on a fail-closed path.
    pub signature: String,
    /// Reserved for key-rotation metadata; rotation itself is operator-driven.
    #[serde(default)]
    pub key_version: Option<String>,
    pub emitted_at: DateTime<Utc>,
}

impl Verdict {
    /// Recompute certifiability from the verdict's own contents.
    ///
    /// Certifiable ⇔ semantic check succeeded, every validator slot returned
    /// within its declared budget, the signature is present, and governance
    /// latency stayed at or under `total_budget_ms`.
    pub fn meets_certification(&self, total_budget_ms: u64) -> bool {
        self.semantic.decision == Decision::Allow
            && self.validator_results.iter().all(|v| v.within_budget())
            && !self.signature.is_empty()
            && self.governance_latency_ms <= total_budget_ms as f64
    }
}

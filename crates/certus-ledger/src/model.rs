use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use certus_types::Verdict;

use crate::error::{LedgerError, LedgerResult};

/// Wire-stable persisted form of a verdict.
///
/// Flattened so every field is queryable without unpacking JSON; nested
/// structures (`action_parameters`, `validator_results`, `metadata`) stay
/// JSON. The store assigns `id`; `(timestamp, id)` is the primary key.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerdictRow {
    pub timestamp: DateTime<Utc>,
    /// Store-side surrogate id, assigned at append.
    pub id: i64,

    pub trace_id: String,
    pub decision: String,
    pub reason: String,

    pub agent_id: Option<String>,
    pub maturity_level: i32,

    pub action_verb: String,
    pub action_resource: String,
    pub action_domain: String,
    pub action_parameters: serde_json::Value,

    pub semantic_ontology_match: bool,
    pub semantic_maturity_authorized: bool,
    pub semantic_coverage: f64,

    pub validator_results: serde_json::Value,

    pub total_latency_ms: f64,
    pub certifiable: bool,
    pub signature: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

impl VerdictRow {
    /// Flatten a verdict for persistence. The surrogate id is zero until
    /// the store assigns it.
    pub fn from_verdict(verdict: &Verdict) -> LedgerResult<Self> {
        let action_parameters = serde_json::to_value(&verdict.action.parameters)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        let validator_results = serde_json::to_value(&verdict.validator_results)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        let metadata = verdict
            .key_version
            .as_ref()
            .map(|v| serde_json::json!({ "key_version": v }));

        Ok(Self {
            timestamp: verdict.emitted_at,
            id: 0,
            trace_id: verdict.trace_id.clone(),
            decision: verdict.decision.as_str().to_string(),
            reason: verdict.reason.clone(),
            agent_id: verdict.agent_id.clone(),
            maturity_level: verdict.agent_maturity.value() as i32,
            action_verb: verdict.action.verb.clone(),
            action_resource: verdict.action.resource.clone(),
            action_domain: verdict.action.domain.clone(),
            action_parameters,
            semantic_ontology_match: verdict.semantic.ontology_match,
            semantic_maturity_authorized: verdict.semantic.maturity_authorized,
            semantic_coverage: verdict.semantic.coverage,
            validator_results,
            total_latency_ms: verdict.governance_latency_ms,
            certifiable: verdict.certifiable,
            signature: if verdict.signature.is_empty() {
                None
            } else {
                Some(verdict.signature.clone())
            },
            metadata,
        })
    }

    /// Partition key: the UTC month of emission, `YYYY-MM`.
    pub fn partition_key(&self) -> String {
        self.timestamp.format("%Y-%m").to_string()
    }
}

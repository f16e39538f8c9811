//! The one inbound operation: `POST /api/v1/validate`.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use certus_types::{reason, ActionPrimitive, AgentContext, Verdict};

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};

/// Request body: the structured action plus the agent's context.
#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub action: ActionRequest,
    pub agent: AgentContext,
}

/// Raw action shape; re-validated through the `ActionPrimitive` constructor
/// so handler input obeys the same rules as programmatic construction.
#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub verb: String,
    pub resource: String,
    pub domain: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, serde_json::Value>,
}

/// Response: the signed verdict, with certifiability surfaced for callers
/// that only check the envelope.
#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub verdict: Verdict,
    pub trace_id: String,
    pub certifiable: bool,
}

/// Evaluate one action through the gate.
///
/// Always 200 for an emitted verdict — DENY is a governance outcome, not an
/// HTTP error. The only non-200 paths are a malformed action (400) and,
/// when `complete_fail_closed` is configured, an unpersisted verdict (503).
#[instrument(skip(state, request), fields(trace_id = %request.agent.trace_id))]
pub async fn validate_action(
    State(state): State<AppState>,
    Json(request): Json<ValidateRequest>,
) -> ApiResult<Json<ValidateResponse>> {
    let action = ActionPrimitive::new(
        request.action.verb,
        request.action.resource,
        request.action.domain,
        request.action.parameters,
    )
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let verdict = state.gate.evaluate(action, request.agent).await;
    state.metrics.record(&verdict);

    if state.complete_fail_closed && verdict.reason.starts_with(reason::LEDGER_ERROR) {
        return Err(ApiError::PersistFailed);
    }

    Ok(Json(ValidateResponse {
        trace_id: verdict.trace_id.clone(),
        certifiable: verdict.certifiable,
        verdict,
    }))
}

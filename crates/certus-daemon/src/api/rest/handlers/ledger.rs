//! Analytical read path over the verdict ledger.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use certus_ledger::{LedgerAnalytics, LedgerError, QueryWindow, VerdictRow};

use crate::api::rest::state::AppState;
use crate::error::ApiResult;

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

/// `GET /api/v1/verdicts` — persisted rows, newest first.
pub async fn list_verdicts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<VerdictRow>>> {
    let window = QueryWindow {
        limit: params.limit.unwrap_or(100),
        offset: params.offset.unwrap_or(0),
    };
    Ok(Json(state.ledger.list(window).await?))
}

/// `GET /api/v1/verdicts/:trace_id`.
pub async fn get_verdict(
    State(state): State<AppState>,
    Path(trace_id): Path<String>,
) -> ApiResult<Json<VerdictRow>> {
    let row = state
        .ledger
        .find_by_trace(&trace_id)
        .await?
        .ok_or(LedgerError::NotFound(trace_id))?;
    Ok(Json(row))
}

#[derive(Debug, Deserialize, Default)]
pub struct AnalyticsParams {
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
}

/// `GET /api/v1/verdicts/analytics` — deny rate, escalate rate, latency
/// aggregates. Off the write path by design.
pub async fn ledger_analytics(
    State(state): State<AppState>,
    Query(params): Query<AnalyticsParams>,
) -> ApiResult<Json<LedgerAnalytics>> {
    Ok(Json(state.ledger.analytics(params.since).await?))
}

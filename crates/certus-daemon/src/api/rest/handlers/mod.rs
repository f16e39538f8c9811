mod health;
mod ledger;
mod validate;

pub use health::health_check;
pub use ledger::{get_verdict, ledger_analytics, list_verdicts};
pub use validate::validate_action;

use axum::extract::State;

use super::state::AppState;

/// Handler for `GET /metrics`.
pub async fn export_metrics(State(state): State<AppState>) -> axum::response::Response {
    use axum::response::IntoResponse;
    (
        axum::http::StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        state.metrics.export(),
    )
        .into_response()
}

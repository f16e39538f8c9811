use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

pub type DaemonResult<T> = Result<T, DaemonError>;
pub type ApiResult<T> = Result<T, ApiError>;

/// Startup and lifecycle errors. These are fatal: there is deliberately no
/// degraded mode, so a daemon that cannot wire all collaborators refuses to
/// start.
#[derive(Error, Debug)]
pub enum DaemonError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("signing secret missing: set CERTUS_SIGNATURE_SECRET")]
    MissingSecret,

    #[error("ledger initialization failed: {0}")]
    Ledger(#[from] certus_ledger::LedgerError),

    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// Request-level errors on the read path and for malformed input.
///
/// Note `POST /validate` never produces these for governance outcomes: a
/// DENY verdict is a successful 200 response.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("ledger unavailable: {0}")]
    Ledger(#[from] certus_ledger::LedgerError),

    #[error("verdict could not be persisted")]
    PersistFailed,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Ledger(certus_ledger::LedgerError::NotFound(trace)) => {
                (StatusCode::NOT_FOUND, format!("no verdict for trace `{trace}`"))
            }
            ApiError::Ledger(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            ApiError::PersistFailed => {
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
        };
        let body = Json(serde_json::json!({ "error": message }));
        (status, body).into_response()
    }
}

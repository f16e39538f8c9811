use thiserror::Error;

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors from the verdict ledger.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("ledger backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("no verdict for trace `{0}`")]
    NotFound(String),

    #[error("duplicate append for trace `{0}`")]
    Conflict(String),

    #[error("invalid query input: {0}")]
    InvalidInput(String),
}

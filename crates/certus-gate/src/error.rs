use thiserror::Error;

pub type GateResult<T> = Result<T, GateError>;

/// Errors internal to the gate pipeline.
///
/// None of these cross the API boundary: every variant is converted into a
/// DENY verdict with a named reason code before the caller sees anything.
#[derive(Error, Debug)]
pub enum GateError {
    #[error("ontology query failed: {0}")]
    Ontology(String),

    #[error("ontology session unreachable")]
    OntologyUnreachable,

    #[error("stage `{stage}` exceeded {budget_ms} ms")]
    StageTimeout { stage: &'static str, budget_ms: u64 },

    #[error("no validators registered for ({domain}, {verb})")]
    NoValidators { domain: String, verb: String },

    #[error("signing secret unavailable")]
    MissingSecret,

    #[error("signature computation failed: {0}")]
    Signing(String),

    #[error("ledger append failed: {0}")]
    Ledger(#[from] certus_ledger::LedgerError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

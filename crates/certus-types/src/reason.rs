//! Named reason codes carried on verdicts.
//!
//! Callers only ever see the decision plus one of these codes (optionally
//! followed by detail after `" | "`); internal error types never leak.

/// Ontology health probe failed.
pub const VALIDATOR_UNHEALTHY: &str = "VALIDATOR_UNHEALTHY";
/// Semantic check exceeded its stage budget.
pub const SEMANTIC_TIMEOUT: &str = "SEMANTIC_TIMEOUT";
/// Semantic check raised an error other than timeout.
pub const SEMANTIC_ERROR: &str = "SEMANTIC_ERROR";
/// Verb not present in the domain ontology.
pub const UNKNOWN_VERB: &str = "UNKNOWN_VERB";
/// Agent maturity below the action's required level.
pub const AMM_VIOLATION: &str = "AMM_VIOLATION";
/// Semantic authority granted.
pub const SEMANTIC_OK: &str = "SEMANTIC_OK";
/// Governed verb has no registered validators.
pub const NO_VALIDATORS: &str = "NO_VALIDATORS";
/// Verdict MAC could not be computed.
pub const SIGNATURE_ERROR: &str = "SIGNATURE_ERROR";
/// Ledger append failed.
pub const LEDGER_ERROR: &str = "LEDGER_ERROR";
/// Total governance budget exceeded.
pub const GATE_TIMEOUT: &str = "GATE_TIMEOUT";
/// Catch-all for unexpected internal failure.
pub const GATE_INTERNAL_ERROR: &str = "GATE_INTERNAL_ERROR";
/// Backpressure bound hit; request refused rather than degraded.
pub const OVERLOAD: &str = "OVERLOAD";
/// Semantic coverage below the configured floor.
pub const LOW_SEMANTIC_COVERAGE: &str = "LOW_SEMANTIC_COVERAGE";
/// Every validator passed and coverage met the floor.
pub const ALL_VALIDATORS_PASSED: &str = "ALL_VALIDATORS_PASSED";
/// Informational verb with no validators required.
pub const NO_VALIDATORS_REQUIRED: &str = "NO_VALIDATORS_REQUIRED";

/// Rule id recorded for a validator that exceeded its declared timeout.
pub const TIMEOUT: &str = "TIMEOUT";
/// Rule id recorded for a validator that panicked.
pub const EXCEPTION: &str = "EXCEPTION";
/// Validator could not compute because required parameters were missing.
pub const INSUFFICIENT_CONTEXT: &str = "INSUFFICIENT_CONTEXT";

/// Join a reason code with free-form detail.
pub fn with_detail(code: &str, detail: impl AsRef<str>) -> String {
    format!("{} | {}", code, detail.as_ref())
}

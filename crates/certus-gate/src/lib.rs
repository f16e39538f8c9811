//! The Validation Gate — the decision pipeline between probabilistic agents
//! and systems-of-record.
//!
//! Per incoming action the gate (a) probes collaborator health, (b) checks
//! semantic authority against the domain ontology, (c) fans out to the
//! registered domain validators under per-stage deadlines, (d) consolidates
//! verdicts with a conservative-veto rule, (e) signs the result, and
//! (f) persists it to the append-only ledger.
//!
//! ## Invariants
//!
//! - **Fail-closed**: every failure mode — timeout, panic, collaborator
//!   error, overload — yields a DENY verdict with a named reason.
//!   [`ValidationGate::evaluate`] is infallible by construction.
//! - **Bounded latency**: the whole pipeline runs under a total governance
//!   budget; each stage has its own deadline and records its wall time.
//! - **Determinism**: validator results are re-sorted into registry order
//!   before aggregation, so identical inputs produce identical verdicts.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod gate;
pub mod graph;
pub mod health;
pub mod mocks;
pub mod ontology;
pub mod registry;
pub mod signer;
pub mod validators;

pub use aggregator::aggregate;
pub use config::GateConfig;
pub use error::{GateError, GateResult};
pub use gate::ValidationGate;
pub use graph::{OntologyGraph, OntologyGraphBuilder};
pub use health::HealthProbe;
pub use ontology::OntologyAuthority;
pub use registry::ValidatorRegistry;
pub use signer::VerdictSigner;
pub use validators::{DomainValidator, ValidatorContext};

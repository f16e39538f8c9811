//! Test doubles for gate collaborators.
//!
//! Used by unit tests and the scenario suite to inject the failure modes
//! the fail-closed property is proved against: unreachable ontology, slow
//! queries, panicking validators, failing or slow ledgers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use certus_types::{ActionPrimitive, MaturityLevel, SemanticVerdict, ValidatorVerdict, Verdict};

use certus_ledger::{
    LedgerAnalytics, LedgerError, LedgerResult, QueryWindow, VerdictRow, VerdictStore,
};

use crate::error::{GateError, GateResult};
use crate::graph::OntologyGraph;
use crate::ontology::OntologyAuthority;
use crate::validators::{DomainValidator, ValidatorContext};

/// Behavior profile for [`MockOntology`].
enum OntologyMode {
    /// Delegate to the seed graph.
    Healthy,
    /// `ping` fails; queries error.
    Unreachable,
    /// Queries sleep before answering from the seed graph.
    Slow(Duration),
    /// Queries return an error.
    Erroring,
}

/// Configurable ontology double wrapping the seed graph.
pub struct MockOntology {
    graph: OntologyGraph,
    mode: OntologyMode,
    pings: AtomicUsize,
}

impl MockOntology {
    pub fn healthy() -> Self {
        Self::with_mode(OntologyMode::Healthy)
    }

    pub fn unreachable() -> Self {
        Self::with_mode(OntologyMode::Unreachable)
    }

    pub fn slow(delay: Duration) -> Self {
        Self::with_mode(OntologyMode::Slow(delay))
    }

    pub fn erroring() -> Self {
        Self::with_mode(OntologyMode::Erroring)
    }

    fn with_mode(mode: OntologyMode) -> Self {
        Self {
            graph: OntologyGraph::seed(),
            mode,
            pings: AtomicUsize::new(0),
        }
    }

    /// How many times `ping` was called.
    pub fn ping_count(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }

    async fn gate_mode(&self) -> GateResult<()> {
        match &self.mode {
            OntologyMode::Healthy => Ok(()),
            OntologyMode::Unreachable => Err(GateError::OntologyUnreachable),
            OntologyMode::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(())
            }
            OntologyMode::Erroring => Err(GateError::Ontology("simulated query failure".into())),
        }
    }
}

#[async_trait]
impl OntologyAuthority for MockOntology {
    async fn semantic_authority(
        &self,
        action: &ActionPrimitive,
        maturity: MaturityLevel,
    ) -> GateResult<SemanticVerdict> {
        self.gate_mode().await?;
        self.graph.semantic_authority(action, maturity).await
    }

    async fn required_validators(&self, action: &ActionPrimitive) -> GateResult<Vec<String>> {
        self.gate_mode().await?;
        self.graph.required_validators(action).await
    }

    async fn requires_validation(&self, action: &ActionPrimitive) -> GateResult<bool> {
        self.gate_mode().await?;
        self.graph.requires_validation(action).await
    }

    async fn ping(&self) -> bool {
        self.pings.fetch_add(1, Ordering::SeqCst);
        !matches!(self.mode, OntologyMode::Unreachable)
    }
}

/// Validator that panics, for exception-isolation tests.
pub struct PanickingValidator;

impl DomainValidator for PanickingValidator {
    fn name(&self) -> &'static str {
        "panicking"
    }

    fn rule_id(&self) -> &'static str {
        "TEST-PANIC"
    }

    fn validate(&self, _action: &ActionPrimitive, _ctx: &ValidatorContext) -> ValidatorVerdict {
        panic!("simulated validator crash");
    }
}

/// Validator that spins past its declared budget.
pub struct RunawayValidator {
    pub spin: Duration,
}

impl DomainValidator for RunawayValidator {
    fn name(&self) -> &'static str {
        "runaway"
    }

    fn rule_id(&self) -> &'static str {
        "TEST-RUNAWAY"
    }

    fn timeout_ms(&self) -> u64 {
        20
    }

    fn validate(&self, _action: &ActionPrimitive, _ctx: &ValidatorContext) -> ValidatorVerdict {
        std::thread::sleep(self.spin);
        ValidatorVerdict::pass(self.name(), self.rule_id(), "finished late", 0.0)
    }
}

/// Validator with a fixed outcome.
pub struct StaticValidator {
    pub fixed_name: &'static str,
    pub decision: certus_types::Decision,
}

impl DomainValidator for StaticValidator {
    fn name(&self) -> &'static str {
        self.fixed_name
    }

    fn rule_id(&self) -> &'static str {
        "TEST-STATIC"
    }

    fn validate(&self, _action: &ActionPrimitive, _ctx: &ValidatorContext) -> ValidatorVerdict {
        match self.decision {
            certus_types::Decision::Allow => {
                ValidatorVerdict::pass(self.fixed_name, self.rule_id(), "static pass", 0.0)
            }
            certus_types::Decision::Deny => {
                ValidatorVerdict::deny(self.fixed_name, self.rule_id(), "static deny", 0.0)
            }
            certus_types::Decision::Escalate => {
                ValidatorVerdict::escalate(self.fixed_name, self.rule_id(), "static escalate", 0.0)
            }
        }
    }
}

/// Ledger that fails every append.
pub struct FailingLedger;

#[async_trait]
impl VerdictStore for FailingLedger {
    async fn append(&self, _verdict: &Verdict) -> LedgerResult<()> {
        Err(LedgerError::Backend("simulated ledger outage".into()))
    }

    async fn list(&self, _window: QueryWindow) -> LedgerResult<Vec<VerdictRow>> {
        Ok(vec![])
    }

    async fn find_by_trace(&self, _trace_id: &str) -> LedgerResult<Option<VerdictRow>> {
        Ok(None)
    }

    async fn analytics(
        &self,
        _since: Option<chrono::DateTime<chrono::Utc>>,
    ) -> LedgerResult<LedgerAnalytics> {
        Ok(LedgerAnalytics::default())
    }
}

/// Ledger whose appends hang past the persist budget.
pub struct HangingLedger {
    pub delay: Duration,
}

#[async_trait]
impl VerdictStore for HangingLedger {
    async fn append(&self, _verdict: &Verdict) -> LedgerResult<()> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    async fn list(&self, _window: QueryWindow) -> LedgerResult<Vec<VerdictRow>> {
        Ok(vec![])
    }

    async fn find_by_trace(&self, _trace_id: &str) -> LedgerResult<Option<VerdictRow>> {
        Ok(None)
    }

    async fn analytics(
        &self,
        _since: Option<chrono::DateTime<chrono::Utc>>,
    ) -> LedgerResult<LedgerAnalytics> {
        Ok(LedgerAnalytics::default())
    }
}

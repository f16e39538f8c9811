//! The Validation Gate orchestrator.
//!
//! `evaluate` is the single entry point. It never returns an error and
//! never blocks past the total governance budget: every exit path — happy,
//! degraded, or catastrophic — produces a verdict, and every failure mode
//! produces a DENY.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use certus_ledger::VerdictStore;
use certus_types::{
    reason, ActionPrimitive, AgentContext, ComponentTimings, Decision, SemanticVerdict,
    ValidatorVerdict, Verdict,
};

use crate::aggregator::aggregate;
use crate::config::GateConfig;
use crate::health::HealthProbe;
use crate::ontology::OntologyAuthority;
use crate::registry::ValidatorRegistry;
use crate::signer::VerdictSigner;
use crate::validators::ValidatorContext;

/// The request pipeline between agents and systems-of-record.
///
/// Cheap to clone: collaborators are shared behind `Arc`, so one gate serves
/// all concurrent requests.
#[derive(Clone)]
pub struct ValidationGate {
    config: GateConfig,
    ontology: Arc<dyn OntologyAuthority>,
    registry: Arc<ValidatorRegistry>,
    signer: VerdictSigner,
    ledger: Arc<dyn VerdictStore>,
    health: Arc<HealthProbe>,
    inflight: Arc<Semaphore>,
}

impl ValidationGate {
    pub fn new(
        config: GateConfig,
        ontology: Arc<dyn OntologyAuthority>,
        registry: Arc<ValidatorRegistry>,
        signer: VerdictSigner,
        ledger: Arc<dyn VerdictStore>,
    ) -> Self {
        let health = Arc::new(HealthProbe::new(config.health_cache));
        let inflight = Arc::new(Semaphore::new(config.max_inflight));
        Self {
            config,
            ontology,
            registry,
            signer,
            ledger,
            health,
            inflight,
        }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Uncached ontology reachability, for the daemon's health endpoint.
    pub async fn ontology_reachable(&self) -> bool {
        self.ontology.ping().await
    }

    /// Evaluate one action. Infallible: all failure modes fold into a DENY
    /// verdict with a named reason.
    pub async fn evaluate(&self, action: ActionPrimitive, agent: AgentContext) -> Verdict {
        // Backpressure: refuse outright rather than degrade the deadline.
        let Ok(_permit) = Arc::clone(&self.inflight).try_acquire_owned() else {
            warn!(trace_id = %agent.trace_id, "request refused: gate at capacity");
            return self
                .emergency_verdict(
                    action,
                    agent,
                    reason::OVERLOAD.to_string(),
                    SemanticVerdict::failed("gate at capacity; request refused"),
                    ComponentTimings::default(),
                )
                .await;
        };

        let gate = self.clone();
        let task_action = action.clone();
        let task_agent = agent.clone();
        let mut handle =
            tokio::spawn(async move { gate.evaluate_pipeline(task_action, task_agent).await });

        let total = Duration::from_millis(self.config.total_budget_ms);
        match tokio::time::timeout(total, &mut handle).await {
            Ok(Ok(verdict)) => verdict,
            Ok(Err(join_err)) => {
                // A panic anywhere in the pipeline lands here, not in the caller.
                error!(trace_id = %agent.trace_id, error = %join_err, "gate pipeline panicked");
                self.emergency_verdict(
                    action,
                    agent,
                    reason::with_detail(reason::GATE_INTERNAL_ERROR, join_err.to_string()),
                    SemanticVerdict::failed("gate internal error; fail-closed"),
                    ComponentTimings::default(),
                )
                .await
            }
            Err(_) => {
                // Cancel the in-flight stage and deny.
                handle.abort();
                warn!(
                    trace_id = %agent.trace_id,
                    budget_ms = self.config.total_budget_ms,
                    "total governance budget exceeded"
                );
                self.emergency_verdict(
                    action,
                    agent,
                    reason::with_detail(
                        reason::GATE_TIMEOUT,
                        format!("exceeded {} ms total budget", self.config.total_budget_ms),
                    ),
                    SemanticVerdict::failed("governance budget exceeded"),
                    ComponentTimings::default(),
                )
                .await
            }
        }
    }

    async fn evaluate_pipeline(&self, action: ActionPrimitive, agent: AgentContext) -> Verdict {
        let mut timings = ComponentTimings::default();

        info!(
            trace_id = %agent.trace_id,
            verb = %action.verb,
            domain = %action.domain,
            maturity = %agent.maturity,
            "validation started"
        );

        // Stage 1: cached health probe.
        let stage = Instant::now();
        let healthy = self.health.check(&self.ontology).await;
        timings.health_ms = elapsed_ms(stage);
        if !healthy {
            error!(trace_id = %agent.trace_id, "ontology unhealthy; denying fail-closed");
            return self
                .finalize(
                    action,
                    agent,
                    Decision::Deny,
                    reason::with_detail(reason::VALIDATOR_UNHEALTHY, "ontology session down"),
                    SemanticVerdict::failed("health probe failed"),
                    vec![],
                    timings,
                )
                .await;
        }

        // Stage 2: semantic authority under its own deadline.
        let stage = Instant::now();
        let semantic = tokio::time::timeout(
            Duration::from_millis(self.config.semantic_budget_ms),
            self.ontology.semantic_authority(&action, agent.maturity),
        )
        .await;
        timings.semantic_ms = elapsed_ms(stage);

        let semantic = match semantic {
            Err(_) => {
                error!(
                    trace_id = %agent.trace_id,
                    budget_ms = self.config.semantic_budget_ms,
                    "semantic check timed out"
                );
                return self
                    .finalize(
                        action,
                        agent,
                        Decision::Deny,
                        reason::with_detail(
                            reason::SEMANTIC_TIMEOUT,
                            format!("exceeded {} ms", self.config.semantic_budget_ms),
                        ),
                        SemanticVerdict::failed("semantic check timed out"),
                        vec![],
                        timings,
                    )
                    .await;
            }
            Ok(Err(e)) => {
                error!(trace_id = %agent.trace_id, error = %e, "semantic check failed");
                return self
                    .finalize(
                        action,
                        agent,
                        Decision::Deny,
                        reason::with_detail(reason::SEMANTIC_ERROR, e.to_string()),
                        SemanticVerdict::failed(format!("semantic check failed: {e}")),
                        vec![],
                        timings,
                    )
                    .await;
            }
            Ok(Ok(verdict)) => verdict,
        };

        // Fast rejection: a semantic DENY skips the validators entirely.
        if semantic.decision == Decision::Deny {
            info!(
                trace_id = %agent.trace_id,
                reason = %semantic.reason,
                "denied at semantic authority"
            );
            let semantic_reason = semantic.reason.clone();
            return self
                .finalize(
                    action,
                    agent,
                    Decision::Deny,
                    semantic_reason,
                    semantic,
                    vec![],
                    timings,
                )
                .await;
        }

        // Stage 3: validator lookup. The registry binding for the
        // `(domain, verb)` pair wins; when nothing is bound directly, the
        // ontology's validator names are resolved against the registry.
        let mut validators = self.registry.lookup(&action.domain, &action.verb);
        if validators.is_empty() {
            match self.ontology.required_validators(&action).await {
                Ok(names) => validators = self.registry.resolve(&names),
                Err(e) => {
                    return self
                        .finalize(
                            action,
                            agent,
                            Decision::Deny,
                            reason::with_detail(reason::SEMANTIC_ERROR, e.to_string()),
                            semantic,
                            vec![],
                            timings,
                        )
                        .await;
                }
            }
        }

        if validators.is_empty() {
            let requires_validation = self
                .ontology
                .requires_validation(&action)
                .await
                .unwrap_or(true);
            if requires_validation {
                // A governed verb with nobody to govern it fails closed.
                warn!(
                    trace_id = %agent.trace_id,
                    verb = %action.verb,
                    "governed verb has no registered validators"
                );
                let detail_reason = reason::with_detail(
                    reason::NO_VALIDATORS,
                    format!("no validators registered for ({}, {})", action.domain, action.verb),
                );
                return self
                    .finalize(
                        action,
                        agent,
                        Decision::Deny,
                        detail_reason,
                        semantic,
                        vec![],
                        timings,
                    )
                    .await;
            }

            // Informational verb: coverage floor still applies.
            let (decision, agg_reason) = aggregate(&semantic, &[], self.config.coverage_floor);
            let final_reason = if decision == Decision::Allow {
                reason::NO_VALIDATORS_REQUIRED.to_string()
            } else {
                agg_reason
            };
            return self
                .finalize(action, agent, decision, final_reason, semantic, vec![], timings)
                .await;
        }

        // Stage 4: parallel dispatch, one task per validator. Deadlines are
        // anchored at dispatch, results collected back in registry order.
        let stage = Instant::now();
        let ctx = ValidatorContext::new(agent.maturity, agent.trace_id.clone());
        let dispatched: Vec<_> = validators
            .iter()
            .map(|validator| {
                let validator = Arc::clone(validator);
                let action = action.clone();
                let ctx = ctx.clone();
                let name = validator.name();
                let budget_ms = self.config.effective_validator_budget(validator.timeout_ms());
                let handle = tokio::spawn(async move {
                    let started = Instant::now();
                    let mut verdict = validator.validate(&action, &ctx);
                    verdict.latency_ms = elapsed_ms(started);
                    verdict
                });
                (name, budget_ms, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(dispatched.len());
        for (name, budget_ms, mut handle) in dispatched {
            let deadline = stage + Duration::from_millis(budget_ms);
            let remaining = deadline.saturating_duration_since(Instant::now());
            match tokio::time::timeout(remaining, &mut handle).await {
                Ok(Ok(verdict)) => {
                    debug!(
                        trace_id = %ctx.trace_id,
                        validator = name,
                        decision = %verdict.decision,
                        "validator returned"
                    );
                    results.push(verdict);
                }
                Ok(Err(join_err)) => {
                    warn!(trace_id = %ctx.trace_id, validator = name, "validator panicked");
                    results.push(ValidatorVerdict::crashed(
                        name,
                        format!("validator raised: {join_err}"),
                        elapsed_ms(stage),
                    ));
                }
                Err(_) => {
                    // Runaway: abandon the task, record the slot as DENY.
                    handle.abort();
                    warn!(
                        trace_id = %ctx.trace_id,
                        validator = name,
                        budget_ms,
                        "validator exceeded its deadline"
                    );
                    results.push(ValidatorVerdict::timed_out(name, budget_ms));
                }
            }
        }
        timings.validators_ms = elapsed_ms(stage);

        // Stage 5: conservative-veto aggregation.
        let (decision, final_reason) = aggregate(&semantic, &results, self.config.coverage_floor);

        self.finalize(action, agent, decision, final_reason, semantic, results, timings)
            .await
    }

    /// Stages 6 and 7: sign, persist, stamp latency and certifiability.
    /// Every pipeline exit converges here so that each emitted verdict is
    /// signed and offered to the ledger exactly once.
    #[allow(clippy::too_many_arguments)]
    async fn finalize(
        &self,
        action: ActionPrimitive,
        agent: AgentContext,
        decision: Decision,
        final_reason: String,
        semantic: SemanticVerdict,
        validator_results: Vec<ValidatorVerdict>,
        mut timings: ComponentTimings,
    ) -> Verdict {
        let mut verdict = Verdict {
            trace_id: agent.trace_id.clone(),
            decision,
            reason: final_reason,
            action,
            agent_id: agent.agent_id,
            agent_maturity: agent.maturity,
            semantic,
            validator_results,
            governance_latency_ms: 0.0,
            component_timings: timings,
            certifiable: false,
            signature: String::new(),
            key_version: self.signer.key_version().map(String::from),
            emitted_at: Utc::now(),
        };

        // Stage 6: sign.
        let stage = Instant::now();
        match self.signer.sign(&verdict) {
            Ok(signature) => verdict.signature = signature,
            Err(e) => {
                error!(trace_id = %verdict.trace_id, error = %e, "verdict signing failed");
                verdict.decision = Decision::Deny;
                verdict.reason = reason::with_detail(reason::SIGNATURE_ERROR, e.to_string());
                verdict.signature.clear();
            }
        }
        timings.sign_ms = elapsed_ms(stage);

        // Stage 7: persist under the persist budget. The row carries the
        // latency accumulated so far; the persist stage itself is only
        // visible on the in-memory verdict.
        verdict.governance_latency_ms = timings.total();
        verdict.component_timings = timings;
        verdict.certifiable = verdict.meets_certification(self.config.total_budget_ms);

        let stage = Instant::now();
        let persisted = tokio::time::timeout(
            Duration::from_millis(self.config.persist_budget_ms),
            self.ledger.append(&verdict),
        )
        .await;
        timings.persist_ms = elapsed_ms(stage);

        match persisted {
            Ok(Ok(())) => {
                debug!(trace_id = %verdict.trace_id, "verdict persisted");
            }
            Ok(Err(e)) => {
                // The caller still gets a response, but it is DENY and an
                // operator-visible critical event is emitted.
                error!(
                    trace_id = %verdict.trace_id,
                    error = %e,
                    "CRITICAL: ledger append failed; verdict not persisted"
                );
                self.mark_ledger_failure(&mut verdict, e.to_string());
            }
            Err(_) => {
                error!(
                    trace_id = %verdict.trace_id,
                    budget_ms = self.config.persist_budget_ms,
                    "CRITICAL: ledger append exceeded budget"
                );
                self.mark_ledger_failure(
                    &mut verdict,
                    format!("append exceeded {} ms", self.config.persist_budget_ms),
                );
            }
        }

        verdict.governance_latency_ms = timings.total();
        verdict.component_timings = timings;
        verdict.certifiable =
            verdict.certifiable && verdict.meets_certification(self.config.total_budget_ms);

        info!(
            trace_id = %verdict.trace_id,
            decision = %verdict.decision,
            latency_ms = verdict.governance_latency_ms,
            certifiable = verdict.certifiable,
            "validation complete"
        );

        verdict
    }

    /// Convert an unpersisted verdict into a fail-closed LEDGER_ERROR deny.
    /// The signed fields change, so the verdict is re-signed.
    fn mark_ledger_failure(&self, verdict: &mut Verdict, detail: String) {
        verdict.decision = Decision::Deny;
        verdict.reason = reason::with_detail(reason::LEDGER_ERROR, detail);
        verdict.certifiable = false;
        verdict.signature = self.signer.sign(verdict).unwrap_or_default();
    }

    /// Verdict for paths outside the normal pipeline (overload, total
    /// timeout, pipeline panic). Signed; persisted best-effort off the
    /// request path so the caller is not held past the budget it already
    /// exhausted.
    async fn emergency_verdict(
        &self,
        action: ActionPrimitive,
        agent: AgentContext,
        deny_reason: String,
        semantic: SemanticVerdict,
        timings: ComponentTimings,
    ) -> Verdict {
        let mut verdict = Verdict {
            trace_id: agent.trace_id.clone(),
            decision: Decision::Deny,
            reason: deny_reason,
            action,
            agent_id: agent.agent_id,
            agent_maturity: agent.maturity,
            semantic,
            validator_results: vec![],
            governance_latency_ms: timings.total(),
            component_timings: timings,
            certifiable: false,
            signature: String::new(),
            key_version: self.signer.key_version().map(String::from),
            emitted_at: Utc::now(),
        };
        verdict.signature = self.signer.sign(&verdict).unwrap_or_default();

        let ledger = Arc::clone(&self.ledger);
        let persist_budget = Duration::from_millis(self.config.persist_budget_ms);
        let record = verdict.clone();
        tokio::spawn(async move {
            if tokio::time::timeout(persist_budget, ledger.append(&record))
                .await
                .map(|r| r.is_err())
                .unwrap_or(true)
            {
                error!(
                    trace_id = %record.trace_id,
                    "CRITICAL: emergency verdict could not be persisted"
                );
            }
        });

        verdict
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{FailingLedger, MockOntology, PanickingValidator, RunawayValidator};
    use crate::registry::ValidatorRegistry;
    use certus_ledger::MemoryVerdictStore;
    use certus_types::MaturityLevel;
    use std::collections::BTreeMap;

    fn signer() -> VerdictSigner {
        VerdictSigner::new(b"gate-test-secret").unwrap()
    }

    fn gate_with(
        ontology: Arc<dyn OntologyAuthority>,
        registry: ValidatorRegistry,
        ledger: Arc<dyn VerdictStore>,
    ) -> ValidationGate {
        ValidationGate::new(
            GateConfig::default(),
            ontology,
            Arc::new(registry),
            signer(),
            ledger,
        )
    }

    fn default_gate() -> (ValidationGate, Arc<MemoryVerdictStore>) {
        let ledger = Arc::new(MemoryVerdictStore::new());
        let gate = gate_with(
            Arc::new(MockOntology::healthy()),
            ValidatorRegistry::builtin(),
            Arc::clone(&ledger) as Arc<dyn VerdictStore>,
        );
        (gate, ledger)
    }

    fn reroute_action(params: &[(&str, serde_json::Value)]) -> ActionPrimitive {
        let parameters: BTreeMap<String, serde_json::Value> = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        ActionPrimitive::new("reroute_flight", "flight:IB3202", "aviation", parameters).unwrap()
    }

    fn agent(trace: &str) -> AgentContext {
        AgentContext::new("agent-test", MaturityLevel::ActionableAgency, trace)
    }

    fn good_fuel_params() -> Vec<(&'static str, serde_json::Value)> {
        vec![
            ("current_fuel", serde_json::json!(6000)),
            ("route_distance", serde_json::json!(500)),
            ("burn_rate", serde_json::json!(5)),
            ("night", serde_json::json!(false)),
        ]
    }

    #[tokio::test]
    async fn happy_path_allows_and_persists() {
        let (gate, ledger) = default_gate();
        let verdict = gate
            .evaluate(reroute_action(&good_fuel_params()), agent("t-happy"))
            .await;

        assert_eq!(verdict.decision, Decision::Allow);
        assert_eq!(verdict.reason, "ALL_VALIDATORS_PASSED");
        assert!(!verdict.signature.is_empty());
        assert!(verdict.certifiable);
        assert_eq!(verdict.validator_results.len(), 2);
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn validator_results_follow_registry_order() {
        let (gate, _) = default_gate();
        let verdict = gate
            .evaluate(reroute_action(&good_fuel_params()), agent("t-order"))
            .await;
        let names: Vec<_> = verdict
            .validator_results
            .iter()
            .map(|v| v.validator_name.as_str())
            .collect();
        assert_eq!(names, vec!["fuel_reserve", "crew_rest"]);
    }

    #[tokio::test]
    async fn unreachable_ontology_denies_unhealthy() {
        let ledger = Arc::new(MemoryVerdictStore::new());
        let gate = gate_with(
            Arc::new(MockOntology::unreachable()),
            ValidatorRegistry::builtin(),
            Arc::clone(&ledger) as Arc<dyn VerdictStore>,
        );
        let verdict = gate
            .evaluate(reroute_action(&good_fuel_params()), agent("t-unhealthy"))
            .await;

        assert_eq!(verdict.decision, Decision::Deny);
        assert!(verdict.reason.contains("VALIDATOR_UNHEALTHY"));
        assert!(!verdict.certifiable);
        // The failure itself is still audited.
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_semantic_check_times_out() {
        let ledger = Arc::new(MemoryVerdictStore::new());
        let gate = {
            let config = GateConfig {
                // Leave room under the total budget so the stage-level
                // timeout (not GATE_TIMEOUT) is the one observed.
                total_budget_ms: 10_000,
                semantic_budget_ms: 500,
                ..GateConfig::default()
            };
            ValidationGate::new(
                config,
                Arc::new(MockOntology::slow(Duration::from_millis(600))),
                Arc::new(ValidatorRegistry::builtin()),
                signer(),
                ledger as Arc<dyn VerdictStore>,
            )
        };

        let verdict = gate
            .evaluate(reroute_action(&good_fuel_params()), agent("t-sem-timeout"))
            .await;
        assert_eq!(verdict.decision, Decision::Deny);
        assert!(verdict.reason.contains("SEMANTIC_TIMEOUT"));
    }

    #[tokio::test]
    async fn erroring_ontology_denies_semantic_error() {
        let gate = gate_with(
            Arc::new(MockOntology::erroring()),
            ValidatorRegistry::builtin(),
            Arc::new(MemoryVerdictStore::new()),
        );
        let verdict = gate
            .evaluate(reroute_action(&good_fuel_params()), agent("t-sem-error"))
            .await;
        assert_eq!(verdict.decision, Decision::Deny);
        assert!(verdict.reason.contains("SEMANTIC_ERROR"));
    }

    #[tokio::test]
    async fn semantic_deny_short_circuits_validators() {
        let (gate, _) = default_gate();
        let action = ActionPrimitive::new(
            "teleport_aircraft",
            "flight:IB3202",
            "aviation",
            BTreeMap::new(),
        )
        .unwrap();
        let verdict = gate.evaluate(action, agent("t-unknown")).await;

        assert_eq!(verdict.decision, Decision::Deny);
        assert!(verdict.reason.contains("UNKNOWN_VERB"));
        assert!(verdict.validator_results.is_empty());
        assert_eq!(verdict.component_timings.validators_ms, 0.0);
    }

    #[tokio::test]
    async fn governed_verb_without_validators_denies() {
        // Empty registry: the seed ontology still names validators, but
        // nothing is bound at build time.
        let ledger = Arc::new(MemoryVerdictStore::new());
        let gate = gate_with(
            Arc::new(MockOntology::healthy()),
            ValidatorRegistry::new(),
            ledger as Arc<dyn VerdictStore>,
        );
        let verdict = gate
            .evaluate(reroute_action(&good_fuel_params()), agent("t-novalidators"))
            .await;
        assert_eq!(verdict.decision, Decision::Deny);
        assert!(verdict.reason.contains("NO_VALIDATORS"));
    }

    #[tokio::test]
    async fn informational_verb_allows_without_validators() {
        let (gate, _) = default_gate();
        let action = ActionPrimitive::new(
            "query_flight_status",
            "flight:IB3202",
            "aviation",
            BTreeMap::new(),
        )
        .unwrap();
        let verdict = gate
            .evaluate(
                action,
                AgentContext::new("agent-test", MaturityLevel::PassiveKnowledge, "t-info"),
            )
            .await;
        assert_eq!(verdict.decision, Decision::Allow);
        assert_eq!(verdict.reason, "NO_VALIDATORS_REQUIRED");
    }

    #[tokio::test]
    async fn panicking_validator_recorded_as_exception() {
        let ledger = Arc::new(MemoryVerdictStore::new());
        let mut registry = ValidatorRegistry::new();
        registry.bind(
            "aviation",
            "reroute_flight",
            vec![
                Arc::new(PanickingValidator),
                Arc::new(crate::validators::FuelReserveValidator),
            ],
        );
        let gate = gate_with(
            Arc::new(MockOntology::healthy()),
            registry,
            ledger as Arc<dyn VerdictStore>,
        );
        let verdict = gate
            .evaluate(reroute_action(&good_fuel_params()), agent("t-panic"))
            .await;

        assert_eq!(verdict.decision, Decision::Deny);
        let crashed = verdict
            .validator_results
            .iter()
            .find(|v| v.validator_name == "panicking")
            .expect("panicking slot recorded");
        assert_eq!(crashed.rule_id, "EXCEPTION");
        assert!(!verdict.certifiable);
    }

    // Multi-threaded runtime: the runaway validator blocks its worker
    // thread, and the dispatcher's deadline must still fire.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn runaway_validator_recorded_as_timeout() {
        let ledger = Arc::new(MemoryVerdictStore::new());
        let mut registry = ValidatorRegistry::new();
        registry.bind(
            "aviation",
            "reroute_flight",
            vec![Arc::new(RunawayValidator {
                spin: Duration::from_millis(100),
            })],
        );
        let gate = gate_with(
            Arc::new(MockOntology::healthy()),
            registry,
            ledger as Arc<dyn VerdictStore>,
        );
        let verdict = gate
            .evaluate(reroute_action(&good_fuel_params()), agent("t-runaway"))
            .await;

        assert_eq!(verdict.decision, Decision::Deny);
        let slot = &verdict.validator_results[0];
        assert_eq!(slot.rule_id, "TIMEOUT");
        assert!(slot.rationale.contains("exceeded"));
    }

    #[tokio::test]
    async fn ledger_failure_denies_but_returns_verdict() {
        let gate = gate_with(
            Arc::new(MockOntology::healthy()),
            ValidatorRegistry::builtin(),
            Arc::new(FailingLedger),
        );
        let verdict = gate
            .evaluate(reroute_action(&good_fuel_params()), agent("t-ledger"))
            .await;

        assert_eq!(verdict.decision, Decision::Deny);
        assert!(verdict.reason.contains("LEDGER_ERROR"));
        assert!(!verdict.certifiable);
        // Still signed, so the caller can prove what it was told.
        assert!(!verdict.signature.is_empty());
        assert!(gate.signer.verify(&verdict));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_ledger_append_becomes_ledger_error() {
        let gate = gate_with(
            Arc::new(MockOntology::healthy()),
            ValidatorRegistry::builtin(),
            Arc::new(crate::mocks::HangingLedger {
                delay: Duration::from_millis(500),
            }),
        );
        let verdict = gate
            .evaluate(reroute_action(&good_fuel_params()), agent("t-slow-ledger"))
            .await;

        assert_eq!(verdict.decision, Decision::Deny);
        assert!(verdict.reason.contains("LEDGER_ERROR"));
        assert!(verdict.reason.contains("exceeded"));
    }

    #[tokio::test]
    async fn escalating_validator_escalates_verdict() {
        let ledger = Arc::new(MemoryVerdictStore::new());
        let mut registry = ValidatorRegistry::new();
        registry.bind(
            "aviation",
            "reroute_flight",
            vec![
                Arc::new(crate::mocks::StaticValidator {
                    fixed_name: "static_pass",
                    decision: Decision::Allow,
                }),
                Arc::new(crate::mocks::StaticValidator {
                    fixed_name: "static_escalate",
                    decision: Decision::Escalate,
                }),
            ],
        );
        let gate = gate_with(
            Arc::new(MockOntology::healthy()),
            registry,
            ledger as Arc<dyn VerdictStore>,
        );
        let verdict = gate
            .evaluate(reroute_action(&good_fuel_params()), agent("t-escalate"))
            .await;

        assert_eq!(verdict.decision, Decision::Escalate);
        assert!(verdict.reason.contains("static escalate"));
    }

    #[tokio::test]
    async fn overload_refused_with_deny() {
        let ledger = Arc::new(MemoryVerdictStore::new());
        let config = GateConfig {
            max_inflight: 0,
            ..GateConfig::default()
        };
        let gate = ValidationGate::new(
            config,
            Arc::new(MockOntology::healthy()),
            Arc::new(ValidatorRegistry::builtin()),
            signer(),
            ledger as Arc<dyn VerdictStore>,
        );
        let verdict = gate
            .evaluate(reroute_action(&good_fuel_params()), agent("t-overload"))
            .await;
        assert_eq!(verdict.decision, Decision::Deny);
        assert_eq!(verdict.reason, "OVERLOAD");
    }

    #[tokio::test]
    async fn deterministic_for_identical_inputs() {
        let (gate, _) = default_gate();
        let action = reroute_action(&good_fuel_params());

        let first = gate.evaluate(action.clone(), agent("t-det")).await;
        // Same trace id is rejected by the memory ledger as a duplicate,
        // which would flip the second verdict to LEDGER_ERROR; use a fresh
        // store to model an identical re-run.
        let (gate2, _) = default_gate();
        let second = gate2.evaluate(action, agent("t-det")).await;

        assert_eq!(first.decision, second.decision);
        assert_eq!(first.reason, second.reason);
        assert_eq!(first.signature, second.signature);
        assert_eq!(first.semantic, second.semantic);
    }

    #[tokio::test]
    async fn every_verdict_signature_verifies() {
        let (gate, _) = default_gate();
        let verdict = gate
            .evaluate(reroute_action(&good_fuel_params()), agent("t-verify"))
            .await;
        assert!(gate.signer.verify(&verdict));
    }

    #[tokio::test]
    async fn governance_latency_is_sum_of_stage_timings() {
        let (gate, _) = default_gate();
        let verdict = gate
            .evaluate(reroute_action(&good_fuel_params()), agent("t-latency"))
            .await;
        let timings = verdict.component_timings;
        assert!((verdict.governance_latency_ms - timings.total()).abs() < 1e-9);
        assert!(timings.semantic_ms > 0.0);
        assert!(timings.validators_ms > 0.0);
    }
}

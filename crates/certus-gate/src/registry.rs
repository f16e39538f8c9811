//! Static validator directory.
//!
//! Maps `(domain, verb)` to an ordered list of validators. The map is built
//! at startup and never modified afterwards — new validators are added at
//! build time, keeping the certifiable surface static. Registry order is the
//! tie-break order for aggregation, so it must be deterministic.

use std::collections::HashMap;
use std::sync::Arc;

use crate::validators::{
    AirspaceValidator, AmlRiskScoreValidator, AmlThresholdValidator, BeneficiaryValidator,
    CrewRestValidator, DomainValidator, FuelReserveValidator, PaymentLimitValidator,
    StrongCustomerAuthValidator,
};

/// `(domain, verb)` → ordered validator list.
pub struct ValidatorRegistry {
    bindings: HashMap<(String, String), Vec<Arc<dyn DomainValidator>>>,
    by_name: HashMap<String, Arc<dyn DomainValidator>>,
}

impl ValidatorRegistry {
    /// An empty registry; bind validators with [`bind`](Self::bind).
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// The built-in validator set, bound to the verbs the seed ontology
    /// governs.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.bind(
            "aviation",
            "reroute_flight",
            vec![Arc::new(FuelReserveValidator), Arc::new(CrewRestValidator)],
        );
        registry.bind(
            "aviation",
            "adjust_altitude",
            vec![Arc::new(AirspaceValidator)],
        );
        // Payment compliance runs as one ordered suite: autonomous limit,
        // SCA, AML threshold, AML risk score, beneficiary screening.
        registry.bind(
            "fintech",
            "initiate_payment",
            vec![
                Arc::new(PaymentLimitValidator),
                Arc::new(StrongCustomerAuthValidator),
                Arc::new(AmlThresholdValidator),
                Arc::new(AmlRiskScoreValidator),
                Arc::new(BeneficiaryValidator::new()),
            ],
        );
        registry
    }

    /// Bind an ordered validator list to a `(domain, verb)` pair.
    pub fn bind(
        &mut self,
        domain: impl Into<String>,
        verb: impl Into<String>,
        validators: Vec<Arc<dyn DomainValidator>>,
    ) {
        for validator in &validators {
            self.by_name
                .insert(validator.name().to_string(), Arc::clone(validator));
        }
        self.bindings
            .insert((domain.into(), verb.into()), validators);
    }

    /// Ordered validators for a `(domain, verb)` pair. Empty when none are
    /// bound — the gate decides what an empty list means.
    pub fn lookup(&self, domain: &str, verb: &str) -> Vec<Arc<dyn DomainValidator>> {
        self.bindings
            .get(&(domain.to_string(), verb.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    /// Resolve validators by ontology-provided names, preserving the given
    /// order and skipping names with no build-time implementation.
    pub fn resolve(&self, names: &[String]) -> Vec<Arc<dyn DomainValidator>> {
        names
            .iter()
            .filter_map(|name| self.by_name.get(name).cloned())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_binds_reroute_validators_in_order() {
        let registry = ValidatorRegistry::builtin();
        let validators = registry.lookup("aviation", "reroute_flight");
        let names: Vec<_> = validators.iter().map(|v| v.name()).collect();
        assert_eq!(names, vec!["fuel_reserve", "crew_rest"]);
    }

    #[test]
    fn builtin_binds_payment_compliance_suite_in_order() {
        let registry = ValidatorRegistry::builtin();
        let validators = registry.lookup("fintech", "initiate_payment");
        let names: Vec<_> = validators.iter().map(|v| v.name()).collect();
        assert_eq!(
            names,
            vec![
                "payment_limit",
                "strong_customer_auth",
                "aml_threshold",
                "aml_risk_score",
                "beneficiary_screen",
            ]
        );
    }

    #[test]
    fn unknown_pair_yields_empty_list() {
        let registry = ValidatorRegistry::builtin();
        assert!(registry.lookup("aviation", "teleport_aircraft").is_empty());
        assert!(registry.lookup("healthcare", "reroute_flight").is_empty());
    }

    #[test]
    fn resolve_preserves_requested_order() {
        let registry = ValidatorRegistry::builtin();
        let names = vec!["crew_rest".to_string(), "fuel_reserve".to_string()];
        let resolved = registry.resolve(&names);
        let resolved_names: Vec<_> = resolved.iter().map(|v| v.name()).collect();
        assert_eq!(resolved_names, vec!["crew_rest", "fuel_reserve"]);
    }

    #[test]
    fn resolve_skips_unknown_names() {
        let registry = ValidatorRegistry::builtin();
        let names = vec!["fuel_reserve".to_string(), "no_such_validator".to_string()];
        assert_eq!(registry.resolve(&names).len(), 1);
    }
}

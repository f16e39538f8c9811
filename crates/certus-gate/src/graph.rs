//! In-process arena model of the governance ontology.
//!
//! The ontology graph is cyclic (Action ↔ Regulation ↔ Validator), so nodes
//! live in arenas and relations are index lists; lookups are keyed, never
//! traversals. The graph is built once at startup from seed data and shared
//! read-only across requests.

use std::collections::HashMap;

use async_trait::async_trait;
use certus_types::{reason, ActionPrimitive, MaturityLevel, SemanticVerdict};

use crate::error::GateResult;
use crate::ontology::OntologyAuthority;

/// An action node: one governed verb within a domain.
#[derive(Clone, Debug)]
pub struct ActionNode {
    pub verb: String,
    pub domain: String,
    pub required_maturity: MaturityLevel,
    /// Whether this verb needs validator coverage at all. Informational
    /// verbs (lookups, queries) carry `false`.
    pub requires_validation: bool,
    /// Parameters the ontology declares governance for.
    pub governed_parameters: Vec<String>,
    /// Indices into the regulation arena.
    pub governed_by: Vec<usize>,
    /// Indices into the validator-name arena, in enforcement order.
    pub required_validators: Vec<usize>,
}

/// A regulation node.
#[derive(Clone, Debug)]
pub struct RegulationNode {
    pub id: String,
    pub citation: String,
    pub summary: String,
    /// Indices into the validator-name arena.
    pub enforced_by: Vec<usize>,
}

/// Arena-backed ontology snapshot.
pub struct OntologyGraph {
    actions: Vec<ActionNode>,
    regulations: Vec<RegulationNode>,
    validator_names: Vec<String>,
    /// `(domain, verb)` → action arena index.
    action_index: HashMap<(String, String), usize>,
}

impl OntologyGraph {
    pub fn builder() -> OntologyGraphBuilder {
        OntologyGraphBuilder::default()
    }

    /// Keyed lookup, no traversal.
    pub fn find_action(&self, domain: &str, verb: &str) -> Option<&ActionNode> {
        self.action_index
            .get(&(domain.to_string(), verb.to_string()))
            .map(|&idx| &self.actions[idx])
    }

    pub fn regulation(&self, idx: usize) -> Option<&RegulationNode> {
        self.regulations.get(idx)
    }

    pub fn validator_name(&self, idx: usize) -> Option<&str> {
        self.validator_names.get(idx).map(String::as_str)
    }

    /// Fraction of the action's parameters that the ontology recognizes as
    /// governed. 1.0 when the action carries no parameters.
    pub fn coverage(&self, node: &ActionNode, action: &ActionPrimitive) -> f64 {
        if action.parameters.is_empty() {
            return 1.0;
        }
        let governed = action
            .parameters
            .keys()
            .filter(|k| node.governed_parameters.iter().any(|g| g == *k))
            .count();
        governed as f64 / action.parameters.len() as f64
    }

    /// The default governance schema used by the built-in validator set:
    /// aviation flight operations and fintech payment initiation.
    pub fn seed() -> Self {
        let mut builder = Self::builder();

        builder.regulation("FAA-91-151", "FAA 14 CFR §91.151", "VFR fuel reserve minimums");
        builder.regulation("FAA-121-471", "14 CFR §121.471", "Flight-time limits and crew rest");
        builder.regulation("FAA-91-119", "14 CFR §91.119", "Minimum safe altitudes");
        builder.regulation("PSD2-RTS-97", "PSD2 RTS 2018/389", "Strong customer authentication");
        builder.regulation("EU-5AMLD-11", "EU Directive 2018/843", "AML due-diligence thresholds");

        builder
            .action("aviation", "reroute_flight", MaturityLevel::ActionableAgency)
            .governed_params(&[
                "current_fuel",
                "route_distance",
                "burn_rate",
                "burn_rate_per_min",
                "night",
                "current_duty_minutes",
                "proposed_flight_minutes",
            ])
            .governed_by(&["FAA-91-151", "FAA-121-471"])
            .validators(&["fuel_reserve", "crew_rest"]);

        builder
            .action("aviation", "adjust_altitude", MaturityLevel::ActionableAgency)
            .governed_params(&["requested_altitude_ft", "terrain_type", "terrain_elevation_ft"])
            .governed_by(&["FAA-91-119"])
            .validators(&["airspace"]);

        builder
            .action("fintech", "initiate_payment", MaturityLevel::ActionableAgency)
            .governed_params(&[
                "amount",
                "currency",
                "sca_completed",
                "transaction_type",
                "risk_profile",
                "risk_score",
                "beneficiary_iban",
                "beneficiary_whitelisted",
            ])
            .governed_by(&["PSD2-RTS-97", "EU-5AMLD-11"])
            .validators(&[
                "payment_limit",
                "strong_customer_auth",
                "aml_threshold",
                "aml_risk_score",
                "beneficiary_screen",
            ]);

        // Informational verbs pass without validators.
        builder
            .action("aviation", "query_flight_status", MaturityLevel::PassiveKnowledge)
            .informational();
        builder
            .action("fintech", "check_balance", MaturityLevel::PassiveKnowledge)
            .informational();

        builder.build()
    }
}

#[async_trait]
impl OntologyAuthority for OntologyGraph {
    async fn semantic_authority(
        &self,
        action: &ActionPrimitive,
        maturity: MaturityLevel,
    ) -> GateResult<SemanticVerdict> {
        let Some(node) = self.find_action(&action.domain, &action.verb) else {
            return Ok(SemanticVerdict::denied(
                false,
                false,
                reason::with_detail(
                    reason::UNKNOWN_VERB,
                    format!(
                        "verb `{}` not found in ontology `{}`",
                        action.verb, action.domain
                    ),
                ),
            ));
        };

        if maturity < node.required_maturity {
            return Ok(SemanticVerdict::denied(
                true,
                false,
                format!(
                    "{}: requires {}, agent is {}",
                    reason::AMM_VIOLATION,
                    node.required_maturity,
                    maturity
                ),
            ));
        }

        let coverage = self.coverage(node, action);
        Ok(SemanticVerdict::allowed(
            coverage,
            reason::with_detail(
                reason::SEMANTIC_OK,
                format!("{} authorized at {}", action.verb, maturity),
            ),
        ))
    }

    async fn required_validators(&self, action: &ActionPrimitive) -> GateResult<Vec<String>> {
        let names = self
            .find_action(&action.domain, &action.verb)
            .map(|node| {
                node.required_validators
                    .iter()
                    .filter_map(|&idx| self.validator_name(idx))
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        Ok(names)
    }

    async fn requires_validation(&self, action: &ActionPrimitive) -> GateResult<bool> {
        Ok(self
            .find_action(&action.domain, &action.verb)
            .map(|node| node.requires_validation)
            .unwrap_or(true))
    }

    async fn ping(&self) -> bool {
        true
    }
}

/// Builder assembling the arenas and their cross-indices.
#[derive(Default)]
pub struct OntologyGraphBuilder {
    actions: Vec<ActionNode>,
    regulations: Vec<RegulationNode>,
    validator_names: Vec<String>,
    regulation_ids: HashMap<String, usize>,
    current: Option<usize>,
}

impl OntologyGraphBuilder {
    /// Register a regulation node.
    pub fn regulation(
        &mut self,
        id: impl Into<String>,
        citation: impl Into<String>,
        summary: impl Into<String>,
    ) -> &mut Self {
        let id = id.into();
        let idx = self.regulations.len();
        self.regulations.push(RegulationNode {
            id: id.clone(),
            citation: citation.into(),
            summary: summary.into(),
            enforced_by: Vec::new(),
        });
        self.regulation_ids.insert(id, idx);
        self
    }

    /// Begin an action node; subsequent calls configure it.
    pub fn action(
        &mut self,
        domain: impl Into<String>,
        verb: impl Into<String>,
        required_maturity: MaturityLevel,
    ) -> &mut Self {
        self.actions.push(ActionNode {
            verb: verb.into(),
            domain: domain.into(),
            required_maturity,
            requires_validation: true,
            governed_parameters: Vec::new(),
            governed_by: Vec::new(),
            required_validators: Vec::new(),
        });
        self.current = Some(self.actions.len() - 1);
        self
    }

    /// Declare governance for the current action's parameters.
    pub fn governed_params(&mut self, params: &[&str]) -> &mut Self {
        if let Some(idx) = self.current {
            self.actions[idx].governed_parameters =
                params.iter().map(|p| p.to_string()).collect();
        }
        self
    }

    /// Link the current action to regulations by id.
    pub fn governed_by(&mut self, regulation_ids: &[&str]) -> &mut Self {
        if let Some(idx) = self.current {
            for reg_id in regulation_ids {
                if let Some(&reg_idx) = self.regulation_ids.get(*reg_id) {
                    self.actions[idx].governed_by.push(reg_idx);
                }
            }
        }
        self
    }

    /// Bind validators to the current action, in enforcement order. Also
    /// back-links each validator onto the action's regulations, which is
    /// what makes the graph cyclic.
    pub fn validators(&mut self, names: &[&str]) -> &mut Self {
        if let Some(idx) = self.current {
            for name in names {
                let v_idx = self.intern_validator(name);
                self.actions[idx].required_validators.push(v_idx);
                let governed_by = self.actions[idx].governed_by.clone();
                for reg_idx in governed_by {
                    if !self.regulations[reg_idx].enforced_by.contains(&v_idx) {
                        self.regulations[reg_idx].enforced_by.push(v_idx);
                    }
                }
            }
        }
        self
    }

    /// Mark the current action as informational: no validators required.
    pub fn informational(&mut self) -> &mut Self {
        if let Some(idx) = self.current {
            self.actions[idx].requires_validation = false;
        }
        self
    }

    fn intern_validator(&mut self, name: &str) -> usize {
        if let Some(pos) = self.validator_names.iter().position(|n| n == name) {
            return pos;
        }
        self.validator_names.push(name.to_string());
        self.validator_names.len() - 1
    }

    pub fn build(self) -> OntologyGraph {
        let action_index = self
            .actions
            .iter()
            .enumerate()
            .map(|(idx, node)| ((node.domain.clone(), node.verb.clone()), idx))
            .collect();
        OntologyGraph {
            actions: self.actions,
            regulations: self.regulations,
            validator_names: self.validator_names,
            action_index,
        }
    }
}

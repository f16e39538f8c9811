use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from action construction.
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("verb must be lowercase with underscores, 3..=50 chars: `{0}`")]
    InvalidVerb(String),

    #[error("resource must be 1..=100 chars")]
    InvalidResource,

    #[error("domain must be lowercase with underscores: `{0}`")]
    InvalidDomain(String),

    #[error("unknown maturity level {0}, expected 1..=5")]
    UnknownMaturityLevel(u8),
}

/// Agentic maturity level — how much authority the agent is trusted with.
///
/// Higher levels are strictly more autonomous. An action declares the
/// minimum level required; an agent below it is denied at the semantic
/// authority check.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(into = "u8", try_from = "u8")]
pub enum MaturityLevel {
    /// Read-only: queries and lookups.
    PassiveKnowledge = 1,
    /// Assists a human who executes.
    HumanTeaming = 2,
    /// Executes actions under gateway validation.
    ActionableAgency = 3,
    /// Coordinates other agents.
    AutonomousOrchestration = 4,
    /// Full self-regulation.
    FullSystemicAutonomy = 5,
}

impl MaturityLevel {
    /// Numeric level, 1..=5.
    pub fn value(self) -> u8 {
        self as u8
    }
}

impl From<MaturityLevel> for u8 {
    fn from(level: MaturityLevel) -> u8 {
        level as u8
    }
}

impl TryFrom<u8> for MaturityLevel {
    type Error = ActionError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::PassiveKnowledge),
            2 => Ok(Self::HumanTeaming),
            3 => Ok(Self::ActionableAgency),
            4 => Ok(Self::AutonomousOrchestration),
            5 => Ok(Self::FullSystemicAutonomy),
            other => Err(ActionError::UnknownMaturityLevel(other)),
        }
    }
}

impl std::fmt::Display for MaturityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "L{}", self.value())
    }
}

/// A structured action proposed by an agent — the atomic unit of governance.
///
/// Produced by an upstream intent-normalization layer; once accepted by the
/// gate it is never mutated. Parameters are an opaque key→value map whose
/// interpretation belongs to the domain validators.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionPrimitive {
    /// Verb in infinitive snake_case, e.g. `reroute_flight`, `initiate_payment`.
    pub verb: String,
    /// The entity affected, e.g. `flight:IB3202`, `account:DE89...`.
    pub resource: String,
    /// Knowledge domain the verb belongs to, e.g. `aviation`, `fintech`.
    pub domain: String,
    /// Action-specific parameters. BTreeMap keeps serialization order stable
    /// so identical actions produce identical wire bytes.
    #[serde(default)]
    pub parameters: BTreeMap<String, serde_json::Value>,
}

impl ActionPrimitive {
    /// Construct a validated action primitive.
    pub fn new(
        verb: impl Into<String>,
        resource: impl Into<String>,
        domain: impl Into<String>,
        parameters: BTreeMap<String, serde_json::Value>,
    ) -> Result<Self, ActionError> {
        let verb = verb.into();
        let resource = resource.into();
        let domain = domain.into();

        if verb.len() < 3
            || verb.len() > 50
            || !verb.chars().all(|c| c.is_ascii_lowercase() || c == '_')
        {
            return Err(ActionError::InvalidVerb(verb));
        }
        if resource.is_empty() || resource.len() > 100 {
            return Err(ActionError::InvalidResource);
        }
        if domain.is_empty() || !domain.chars().all(|c| c.is_ascii_lowercase() || c == '_') {
            return Err(ActionError::InvalidDomain(domain));
        }

        Ok(Self {
            verb,
            resource,
            domain,
            parameters,
        })
    }

    /// Fetch a parameter as f64, accepting any JSON number.
    pub fn param_f64(&self, key: &str) -> Option<f64> {
        self.parameters.get(key).and_then(|v| v.as_f64())
    }

    /// Fetch a parameter as bool.
    pub fn param_bool(&self, key: &str) -> Option<bool> {
        self.parameters.get(key).and_then(|v| v.as_bool())
    }

    /// Fetch a parameter as str.
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(|v| v.as_str())
    }
}

/// Caller-supplied context for one evaluation request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentContext {
    /// Opaque agent identifier for the audit trail.
    #[serde(default)]
    pub agent_id: Option<String>,
    /// The agent's maturity level.
    pub maturity: MaturityLevel,
    /// Unique per-request correlation id, provided by the caller.
    pub trace_id: String,
    /// When the caller submitted the action.
    #[serde(default = "Utc::now")]
    pub submitted_at: DateTime<Utc>,
}

impl AgentContext {
    /// Context for an identified agent.
    pub fn new(
        agent_id: impl Into<String>,
        maturity: MaturityLevel,
        trace_id: impl Into<String>,
    ) -> Self {
        Self {
            agent_id: Some(agent_id.into()),
            maturity,
            trace_id: trace_id.into(),
            submitted_at: Utc::now(),
        }
    }

    /// Context for an anonymous agent.
    pub fn anonymous(maturity: MaturityLevel, trace_id: impl Into<String>) -> Self {
        Self {
            agent_id: None,
            maturity,
            trace_id: trace_id.into(),
            submitted_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, serde_json::Value)]) -> BTreeMap<String, serde_json::Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn valid_action_constructs() {
        let action = ActionPrimitive::new(
            "reroute_flight",
            "flight:IB3202",
            "aviation",
            params(&[("current_fuel", serde_json::json!(6000))]),
        )
        .unwrap();

        assert_eq!(action.verb, "reroute_flight");
        assert_eq!(action.param_f64("current_fuel"), Some(6000.0));
        assert_eq!(action.param_f64("missing"), None);
    }

    #[test]
    fn uppercase_verb_rejected() {
        let result = ActionPrimitive::new("RerouteFlight", "flight:X", "aviation", BTreeMap::new());
        assert!(matches!(result, Err(ActionError::InvalidVerb(_))));
    }

    #[test]
    fn short_verb_rejected() {
        let result = ActionPrimitive::new("go", "flight:X", "aviation", BTreeMap::new());
        assert!(matches!(result, Err(ActionError::InvalidVerb(_))));
    }

    #[test]
    fn empty_resource_rejected() {
        let result = ActionPrimitive::new("reroute_flight", "", "aviation", BTreeMap::new());
        assert!(matches!(result, Err(ActionError::InvalidResource)));
    }

    #[test]
    fn maturity_ordering() {
        assert!(MaturityLevel::HumanTeaming < MaturityLevel::ActionableAgency);
        assert_eq!(MaturityLevel::try_from(3).unwrap(), MaturityLevel::ActionableAgency);
        assert!(MaturityLevel::try_from(6).is_err());
        assert_eq!(MaturityLevel::FullSystemicAutonomy.to_string(), "L5");
    }

    #[test]
    fn maturity_serializes_as_integer() {
        let json = serde_json::to_string(&MaturityLevel::ActionableAgency).unwrap();
        assert_eq!(json, "3");
        let level: MaturityLevel = serde_json::from_str("2").unwrap();
        assert_eq!(level, MaturityLevel::HumanTeaming);
    }

    #[test]
    fn action_parameters_serialize_in_stable_order() {
        let a = ActionPrimitive::new(
            "initiate_payment",
            "account:X",
            "fintech",
            params(&[
                ("amount", serde_json::json!(350.0)),
                ("sca_completed", serde_json::json!(false)),
            ]),
        )
        .unwrap();
        let b = serde_json::from_str::<ActionPrimitive>(&serde_json::to_string(&a).unwrap())
            .unwrap();
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }
}

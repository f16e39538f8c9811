use async_trait::async_trait;
use certus_types::{ActionPrimitive, MaturityLevel, SemanticVerdict};

use crate::error::GateResult;

/// Read-only query surface over the domain ontology.
///
/// The gate treats the ontology store as an external collaborator: it asks
/// whether a verb exists, whether the agent's maturity authorizes it, which
/// validators govern it, and nothing else. Queries must be safe for
/// concurrent use across requests.
#[async_trait]
pub trait OntologyAuthority: Send + Sync {
    /// The semantic authority check: verb existence, maturity authorization,
    /// and parameter coverage, folded into one verdict.
    async fn semantic_authority(
        &self,
        action: &ActionPrimitive,
        maturity: MaturityLevel,
    ) -> GateResult<SemanticVerdict>;

    /// Ordered list of validator names governing `(domain, verb)`.
    async fn required_validators(&self, action: &ActionPrimitive) -> GateResult<Vec<String>>;

    /// Whether the ontology classifies this verb as requiring validation.
    /// Informational verbs may pass with an empty validator list; governed
    /// verbs with an empty list are denied.
    async fn requires_validation(&self, action: &ActionPrimitive) -> GateResult<bool>;

    /// Liveness probe for the backing session. Must be cheap; the gate
    /// caches the result.
    async fn ping(&self) -> bool;
}

//! Conservative-veto consolidation of semantic and validator verdicts.

use certus_types::{reason, Decision, SemanticVerdict, ValidatorVerdict};

/// Apply the conservative-veto policy, in fixed order:
///
/// 1. semantic DENY wins outright;
/// 2. any validator DENY wins, surfacing the first offender in registry
///    order (never completion order);
/// 3. any validator ESCALATE escalates, same tie-break;
/// 4. semantic coverage below the floor escalates;
/// 5. otherwise ALLOW.
///
/// The fixed tie-break keeps the caller-visible reason stable across runs
/// for the same inputs.
pub fn aggregate(
    semantic: &SemanticVerdict,
    validator_results: &[ValidatorVerdict],
    coverage_floor: f64,
) -> (Decision, String) {
    if semantic.decision == Decision::Deny {
        return (Decision::Deny, semantic.reason.clone());
    }

    if let Some(denier) = validator_results
        .iter()
        .find(|v| v.decision == Decision::Deny)
    {
        return (
            Decision::Deny,
            format!("{}: {}", denier.rule_id, denier.rationale),
        );
    }

    if let Some(escalator) = validator_results
        .iter()
        .find(|v| v.decision == Decision::Escalate)
    {
        return (
            Decision::Escalate,
            format!("{}: {}", escalator.rule_id, escalator.rationale),
        );
    }

    if semantic.coverage < coverage_floor {
        return (
            Decision::Escalate,
            reason::with_detail(
                reason::LOW_SEMANTIC_COVERAGE,
                format!(
                    "coverage {:.2} below floor {:.2}; human review required",
                    semantic.coverage, coverage_floor
                ),
            ),
        );
    }

    (Decision::Allow, reason::ALL_VALIDATORS_PASSED.to_string())
}

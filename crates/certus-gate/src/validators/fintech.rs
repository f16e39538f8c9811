//! Fintech domain validators (PSD2 / EU AML directives).

use certus_types::{ActionPrimitive, ValidatorVerdict};

use super::{insufficient_context, DomainValidator, ValidatorContext};

const SCA_THRESHOLD_EUR: f64 = 30.0;
const AUTONOMOUS_LIMIT_EUR: f64 = 1_000.0;
const AML_STANDARD_THRESHOLD_EUR: f64 = 10_000.0;
const AML_HIGH_RISK_THRESHOLD_EUR: f64 = 5_000.0;
const AML_HIGH_RISK_SCORE: f64 = 0.8;

/// Transaction types exempt from strong customer authentication.
const SCA_EXEMPT_TYPES: &[&str] = &["inquiry", "balance_check", "card_validation"];

/// PSD2 RTS 2018/389 Art. 97 — strong customer authentication.
///
/// Remote payments above EUR 30 require completed SCA; absence of the
/// `sca_completed` flag is treated as not completed.
pub struct StrongCustomerAuthValidator;

impl DomainValidator for StrongCustomerAuthValidator {
    fn name(&self) -> &'static str {
        "strong_customer_auth"
    }

    fn rule_id(&self) -> &'static str {
        "PSD2 RTS 2018/389"
    }

    fn timeout_ms(&self) -> u64 {
        50
    }

    fn validate(&self, action: &ActionPrimitive, _ctx: &ValidatorContext) -> ValidatorVerdict {
        let tx_type = action.param_str("transaction_type").unwrap_or("payment");
        if SCA_EXEMPT_TYPES.contains(&tx_type) {
            return ValidatorVerdict::pass(
                self.name(),
                self.rule_id(),
                format!("SCA exemption applies to {tx_type} transactions"),
                0.0,
            );
        }

        let Some(amount) = action.param_f64("amount") else {
            return insufficient_context(self.name(), "amount");
        };
        let sca_completed = action.param_bool("sca_completed").unwrap_or(false);

        if amount > SCA_THRESHOLD_EUR && !sca_completed {
            return ValidatorVerdict::deny(
                self.name(),
                self.rule_id(),
                format!(
                    "strong customer authentication required for EUR {amount:.2} \
                     (> EUR {SCA_THRESHOLD_EUR:.0} threshold, {})",
                    self.rule_id()
                ),
                0.0,
            );
        }

        ValidatorVerdict::pass(
            self.name(),
            self.rule_id(),
            format!("SCA compliance verified for EUR {amount:.2}"),
            0.0,
        )
    }
}

/// Autonomous-operation payment limit.
///
/// Payments above EUR 1000 escalate for human approval regardless of SCA
/// state; the agent may not initiate them on its own authority.
pub struct PaymentLimitValidator;

impl DomainValidator for PaymentLimitValidator {
    fn name(&self) -> &'static str {
        "payment_limit"
    }

    fn rule_id(&self) -> &'static str {
        "Internal Policy - Autonomous Operation Limits"
    }

    fn timeout_ms(&self) -> u64 {
        50
    }

    fn validate(&self, action: &ActionPrimitive, _ctx: &ValidatorContext) -> ValidatorVerdict {
        let Some(amount) = action.param_f64("amount") else {
            return insufficient_context(self.name(), "amount");
        };

        if amount > AUTONOMOUS_LIMIT_EUR {
            return ValidatorVerdict::escalate(
                self.name(),
                self.rule_id(),
                format!(
                    "EUR {amount:.2} exceeds autonomous operation limit of \
                     EUR {AUTONOMOUS_LIMIT_EUR:.0}; human approval required"
                ),
                0.0,
            );
        }

        ValidatorVerdict::pass(
            self.name(),
            self.rule_id(),
            format!("EUR {amount:.2} within autonomous operation limits"),
            0.0,
        )
    }
}

/// EU Directive 2018/843 (5AMLD) — anti-money-laundering thresholds.
///
/// Transactions at or above the reporting threshold escalate for enhanced
/// due diligence rather than deny outright; a sanctions-list match denies.
/// High-risk customers and politically exposed persons use the lower
/// threshold.
pub struct AmlThresholdValidator;

impl DomainValidator for AmlThresholdValidator {
    fn name(&self) -> &'static str {
        "aml_threshold"
    }

    fn rule_id(&self) -> &'static str {
        "EU Directive 2018/843"
    }

    fn timeout_ms(&self) -> u64 {
        50
    }

    fn validate(&self, action: &ActionPrimitive, _ctx: &ValidatorContext) -> ValidatorVerdict {
        if action.param_bool("sanctions_match").unwrap_or(false) {
            return ValidatorVerdict::deny(
                self.name(),
                "EU Regulation 269/2014",
                "sanctions list match detected; transaction blocked",
                0.0,
            );
        }

        let Some(amount) = action.param_f64("amount") else {
            return insufficient_context(self.name(), "amount");
        };
        let risk_profile = action.param_str("risk_profile").unwrap_or("standard");

        let threshold = match risk_profile {
            "high_risk" | "pep" => AML_HIGH_RISK_THRESHOLD_EUR,
            _ => AML_STANDARD_THRESHOLD_EUR,
        };

        if amount >= threshold && risk_profile != "enhanced_due_diligence_passed" {
            return ValidatorVerdict::escalate(
                self.name(),
                self.rule_id(),
                format!(
                    "AML threshold exceeded: EUR {amount:.2} >= EUR {threshold:.0} \
                     ({risk_profile} profile); enhanced due diligence required"
                ),
                0.0,
            );
        }

        ValidatorVerdict::pass(
            self.name(),
            self.rule_id(),
            format!("AML threshold compliant: EUR {amount:.2} ({risk_profile} profile)"),
            0.0,
        )
    }
}

/// EU Directive 2018/843 Art. 18 — composite AML risk score.
///
/// Scores at or above 0.8 escalate for manual review. An absent score reads
/// as 0.0; the sanctions-list DENY lives with the threshold check.
pub struct AmlRiskScoreValidator;

impl DomainValidator for AmlRiskScoreValidator {
    fn name(&self) -> &'static str {
        "aml_risk_score"
    }

    fn rule_id(&self) -> &'static str {
        "EU Directive 2018/843"
    }

    fn timeout_ms(&self) -> u64 {
        50
    }

    fn validate(&self, action: &ActionPrimitive, _ctx: &ValidatorContext) -> ValidatorVerdict {
        let risk_score = action.param_f64("risk_score").unwrap_or(0.0);

        if risk_score >= AML_HIGH_RISK_SCORE {
            return ValidatorVerdict::escalate(
                self.name(),
                self.rule_id(),
                format!("high AML risk score ({risk_score:.2}); manual review required"),
                0.0,
            );
        }

        ValidatorVerdict::pass(
            self.name(),
            self.rule_id(),
            format!("AML risk score acceptable ({risk_score:.2})"),
            0.0,
        )
    }
}

/// Beneficiary screening for payment orders.
///
/// A pre-approved beneficiary passes outright. A payment naming no
/// beneficiary IBAN is denied as an incomplete payment order, a rule
/// outcome rather than an inability to compute. When a whitelist is
/// configured, an unlisted IBAN escalates for manual approval.
#[derive(Default)]
pub struct BeneficiaryValidator {
    whitelist: std::collections::HashSet<String>,
}

impl BeneficiaryValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_whitelist(ibans: impl IntoIterator<Item = String>) -> Self {
        Self {
            whitelist: ibans.into_iter().collect(),
        }
    }
}

impl DomainValidator for BeneficiaryValidator {
    fn name(&self) -> &'static str {
        "beneficiary_screen"
    }

    fn rule_id(&self) -> &'static str {
        "PSD2 - Payment Order Requirements"
    }

    fn timeout_ms(&self) -> u64 {
        50
    }

    fn validate(&self, action: &ActionPrimitive, _ctx: &ValidatorContext) -> ValidatorVerdict {
        if action.param_bool("beneficiary_whitelisted").unwrap_or(false) {
            return ValidatorVerdict::pass(
                self.name(),
                "Internal Policy - Fraud Prevention",
                "beneficiary is pre-approved",
                0.0,
            );
        }

        let iban = action.param_str("beneficiary_iban").unwrap_or("");
        if iban.is_empty() {
            return ValidatorVerdict::deny(
                self.name(),
                self.rule_id(),
                "beneficiary IBAN not provided",
                0.0,
            );
        }

        if !self.whitelist.is_empty() && !self.whitelist.contains(iban) {
            return ValidatorVerdict::escalate(
                self.name(),
                "Internal Policy - Fraud Prevention",
                "beneficiary not in approved whitelist; manual approval required",
                0.0,
            );
        }

        ValidatorVerdict::pass(
            self.name(),
            self.rule_id(),
            "beneficiary validation passed",
            0.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certus_types::{Decision, MaturityLevel};
    use std::collections::BTreeMap;

    fn ctx() -> ValidatorContext {
        ValidatorContext::new(MaturityLevel::ActionableAgency, "trace-test")
    }

    fn payment(params: &[(&str, serde_json::Value)]) -> ActionPrimitive {
        let parameters: BTreeMap<String, serde_json::Value> = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        ActionPrimitive::new("initiate_payment", "account:DE89", "fintech", parameters).unwrap()
    }

    #[test]
    fn payment_over_threshold_without_sca_denied() {
        let action = payment(&[
            ("amount", serde_json::json!(350.0)),
            ("sca_completed", serde_json::json!(false)),
        ]);
        let verdict = StrongCustomerAuthValidator.validate(&action, &ctx());
        assert_eq!(verdict.decision, Decision::Deny);
        assert_eq!(verdict.rule_id, "PSD2 RTS 2018/389");
    }

    #[test]
    fn payment_with_sca_passes() {
        let action = payment(&[
            ("amount", serde_json::json!(350.0)),
            ("sca_completed", serde_json::json!(true)),
        ]);
        let verdict = StrongCustomerAuthValidator.validate(&action, &ctx());
        assert_eq!(verdict.decision, Decision::Allow);
    }

    #[test]
    fn small_payment_passes_without_sca() {
        let action = payment(&[("amount", serde_json::json!(12.5))]);
        let verdict = StrongCustomerAuthValidator.validate(&action, &ctx());
        assert_eq!(verdict.decision, Decision::Allow);
    }

    #[test]
    fn missing_sca_flag_treated_as_not_completed() {
        let action = payment(&[("amount", serde_json::json!(100.0))]);
        let verdict = StrongCustomerAuthValidator.validate(&action, &ctx());
        assert_eq!(verdict.decision, Decision::Deny);
    }

    #[test]
    fn exempt_transaction_type_passes() {
        let action = payment(&[
            ("amount", serde_json::json!(5000.0)),
            ("transaction_type", serde_json::json!("balance_check")),
        ]);
        let verdict = StrongCustomerAuthValidator.validate(&action, &ctx());
        assert_eq!(verdict.decision, Decision::Allow);
    }

    #[test]
    fn missing_amount_escalates() {
        let verdict = StrongCustomerAuthValidator.validate(&payment(&[]), &ctx());
        assert_eq!(verdict.decision, Decision::Escalate);
        assert_eq!(verdict.rule_id, "INSUFFICIENT_CONTEXT");
    }

    #[test]
    fn aml_threshold_escalates() {
        let action = payment(&[("amount", serde_json::json!(10_000.0))]);
        let verdict = AmlThresholdValidator.validate(&action, &ctx());
        assert_eq!(verdict.decision, Decision::Escalate);
        assert!(verdict.rationale.contains("enhanced due diligence"));
    }

    #[test]
    fn aml_passes_with_completed_due_diligence() {
        let action = payment(&[
            ("amount", serde_json::json!(25_000.0)),
            ("risk_profile", serde_json::json!("enhanced_due_diligence_passed")),
        ]);
        let verdict = AmlThresholdValidator.validate(&action, &ctx());
        assert_eq!(verdict.decision, Decision::Allow);
    }

    #[test]
    fn high_risk_profile_uses_lower_threshold() {
        let action = payment(&[
            ("amount", serde_json::json!(6_000.0)),
            ("risk_profile", serde_json::json!("pep")),
        ]);
        let verdict = AmlThresholdValidator.validate(&action, &ctx());
        assert_eq!(verdict.decision, Decision::Escalate);

        let standard = payment(&[("amount", serde_json::json!(6_000.0))]);
        let verdict = AmlThresholdValidator.validate(&standard, &ctx());
        assert_eq!(verdict.decision, Decision::Allow);
    }

    #[test]
    fn sanctions_match_denies() {
        let action = payment(&[
            ("amount", serde_json::json!(50.0)),
            ("sanctions_match", serde_json::json!(true)),
        ]);
        let verdict = AmlThresholdValidator.validate(&action, &ctx());
        assert_eq!(verdict.decision, Decision::Deny);
        assert_eq!(verdict.rule_id, "EU Regulation 269/2014");
    }

    #[test]
    fn amount_over_autonomous_limit_escalates() {
        let action = payment(&[("amount", serde_json::json!(1_500.0))]);
        let verdict = PaymentLimitValidator.validate(&action, &ctx());
        assert_eq!(verdict.decision, Decision::Escalate);
        assert!(verdict.rationale.contains("human approval"));
    }

    #[test]
    fn amount_within_autonomous_limit_passes() {
        let action = payment(&[("amount", serde_json::json!(999.0))]);
        let verdict = PaymentLimitValidator.validate(&action, &ctx());
        assert_eq!(verdict.decision, Decision::Allow);
    }

    #[test]
    fn limit_missing_amount_escalates() {
        let verdict = PaymentLimitValidator.validate(&payment(&[]), &ctx());
        assert_eq!(verdict.decision, Decision::Escalate);
        assert_eq!(verdict.rule_id, "INSUFFICIENT_CONTEXT");
    }

    #[test]
    fn high_risk_score_escalates() {
        let action = payment(&[("risk_score", serde_json::json!(0.85))]);
        let verdict = AmlRiskScoreValidator.validate(&action, &ctx());
        assert_eq!(verdict.decision, Decision::Escalate);
        assert!(verdict.rationale.contains("manual review"));
    }

    #[test]
    fn low_or_absent_risk_score_passes() {
        let scored = payment(&[("risk_score", serde_json::json!(0.3))]);
        assert_eq!(
            AmlRiskScoreValidator.validate(&scored, &ctx()).decision,
            Decision::Allow
        );
        // No score supplied reads as 0.0.
        assert_eq!(
            AmlRiskScoreValidator.validate(&payment(&[]), &ctx()).decision,
            Decision::Allow
        );
    }

    #[test]
    fn whitelisted_beneficiary_passes() {
        let action = payment(&[("beneficiary_whitelisted", serde_json::json!(true))]);
        let verdict = BeneficiaryValidator::new().validate(&action, &ctx());
        assert_eq!(verdict.decision, Decision::Allow);
    }

    #[test]
    fn missing_beneficiary_iban_denied() {
        let action = payment(&[("amount", serde_json::json!(20.0))]);
        let verdict = BeneficiaryValidator::new().validate(&action, &ctx());
        assert_eq!(verdict.decision, Decision::Deny);
        assert_eq!(verdict.rule_id, "PSD2 - Payment Order Requirements");
        assert!(verdict.rationale.contains("IBAN not provided"));
    }

    #[test]
    fn unlisted_beneficiary_escalates_when_whitelist_configured() {
        let validator =
            BeneficiaryValidator::with_whitelist(vec!["DE89370400440532013000".to_string()]);
        let action = payment(&[("beneficiary_iban", serde_json::json!("FR7630006000011234567890189"))]);
        let verdict = validator.validate(&action, &ctx());
        assert_eq!(verdict.decision, Decision::Escalate);

        let listed = payment(&[("beneficiary_iban", serde_json::json!("DE89370400440532013000"))]);
        let verdict = validator.validate(&listed, &ctx());
        assert_eq!(verdict.decision, Decision::Allow);
    }

    #[test]
    fn provided_iban_passes_without_configured_whitelist() {
        let action = payment(&[("beneficiary_iban", serde_json::json!("DE89370400440532013000"))]);
        let verdict = BeneficiaryValidator::new().validate(&action, &ctx());
        assert_eq!(verdict.decision, Decision::Allow);
    }
}

//! Aviation domain validators (FAA Part 91 / Part 121).

use certus_types::{ActionPrimitive, ValidatorVerdict};

use super::{insufficient_context, DomainValidator, ValidatorContext};

const VFR_DAY_RESERVE_MIN: f64 = 30.0;
const VFR_NIGHT_RESERVE_MIN: f64 = 45.0;
const MAX_DUTY_PERIOD_MIN: f64 = 540.0;

/// FAA 14 CFR §91.151 — VFR fuel reserve minimums.
///
/// Required fuel = route_distance × burn_rate plus a 30-minute (day) or
/// 45-minute (night) reserve at `burn_rate_per_min` (defaults to the cruise
/// burn rate when not supplied separately).
pub struct FuelReserveValidator;

impl DomainValidator for FuelReserveValidator {
    fn name(&self) -> &'static str {
        "fuel_reserve"
    }

    fn rule_id(&self) -> &'static str {
        "FAA 14 CFR §91.151"
    }

    fn timeout_ms(&self) -> u64 {
        50
    }

    fn validate(&self, action: &ActionPrimitive, _ctx: &ValidatorContext) -> ValidatorVerdict {
        let Some(current_fuel) = action.param_f64("current_fuel") else {
            return insufficient_context(self.name(), "current_fuel");
        };
        let Some(route_distance) = action.param_f64("route_distance") else {
            return insufficient_context(self.name(), "route_distance");
        };
        let Some(burn_rate) = action.param_f64("burn_rate") else {
            return insufficient_context(self.name(), "burn_rate");
        };
        let burn_rate_per_min = action.param_f64("burn_rate_per_min").unwrap_or(burn_rate);
        let night = action.param_bool("night").unwrap_or(false);

        let reserve_min = if night {
            VFR_NIGHT_RESERVE_MIN
        } else {
            VFR_DAY_RESERVE_MIN
        };
        let required = route_distance * burn_rate + reserve_min * burn_rate_per_min;

        if current_fuel < required {
            return ValidatorVerdict::deny(
                self.name(),
                self.rule_id(),
                format!(
                    "insufficient fuel: have {current_fuel:.0} lb, need {required:.0} lb \
                     (includes {reserve_min:.0} min reserve per {})",
                    self.rule_id()
                ),
                0.0,
            );
        }

        ValidatorVerdict::pass(
            self.name(),
            self.rule_id(),
            format!(
                "fuel adequate: {current_fuel:.0} lb available, {required:.0} lb required"
            ),
            0.0,
        )
    }
}

/// 14 CFR §121.471 — flight-time limitations and rest requirements.
///
/// Denies a reroute that would push crew duty time past the 9-hour limit.
/// A reroute carrying no duty-time parameters proposes no duty change and
/// passes; a partial pair is an escalation.
pub struct CrewRestValidator;

impl DomainValidator for CrewRestValidator {
    fn name(&self) -> &'static str {
        "crew_rest"
    }

    fn rule_id(&self) -> &'static str {
        "14 CFR §121.471"
    }

    fn timeout_ms(&self) -> u64 {
        50
    }

    fn validate(&self, action: &ActionPrimitive, _ctx: &ValidatorContext) -> ValidatorVerdict {
        let current = action.param_f64("current_duty_minutes");
        let proposed = action.param_f64("proposed_flight_minutes");

        let (current, proposed) = match (current, proposed) {
            (None, None) => {
                return ValidatorVerdict::pass(
                    self.name(),
                    self.rule_id(),
                    "no duty-time change proposed",
                    0.0,
                );
            }
            (Some(c), Some(p)) => (c, p),
            (None, _) => return insufficient_context(self.name(), "current_duty_minutes"),
            (_, None) => return insufficient_context(self.name(), "proposed_flight_minutes"),
        };

        let total = current + proposed;
        if total > MAX_DUTY_PERIOD_MIN {
            return ValidatorVerdict::deny(
                self.name(),
                self.rule_id(),
                format!(
                    "crew duty time would exceed limit: {total:.0} min > {MAX_DUTY_PERIOD_MIN:.0} min ({})",
                    self.rule_id()
                ),
                0.0,
            );
        }

        ValidatorVerdict::pass(
            self.name(),
            self.rule_id(),
            format!("crew duty within limits: {total:.0}/{MAX_DUTY_PERIOD_MIN:.0} min"),
            0.0,
        )
    }
}

/// 14 CFR §91.119 — minimum safe altitudes and restricted airspace.
pub struct AirspaceValidator;

impl AirspaceValidator {
    fn min_altitude_agl(terrain: &str) -> f64 {
        match terrain {
            "congested" => 1000.0,
            "mountainous" => 2000.0,
            _ => 500.0,
        }
    }
}

impl DomainValidator for AirspaceValidator {
    fn name(&self) -> &'static str {
        "airspace"
    }

    fn rule_id(&self) -> &'static str {
        "14 CFR §91.119"
    }

    fn timeout_ms(&self) -> u64 {
        50
    }

    fn validate(&self, action: &ActionPrimitive, _ctx: &ValidatorContext) -> ValidatorVerdict {
        let Some(requested) = action.param_f64("requested_altitude_ft") else {
            return insufficient_context(self.name(), "requested_altitude_ft");
        };
        let terrain = action.param_str("terrain_type").unwrap_or("open");
        let elevation = action.param_f64("terrain_elevation_ft").unwrap_or(0.0);

        if action.param_bool("crosses_restricted_zone").unwrap_or(false) {
            return ValidatorVerdict::deny(
                self.name(),
                self.rule_id(),
                "requested route intersects a restricted zone",
                0.0,
            );
        }

        let min_msl = elevation + Self::min_altitude_agl(terrain);
        if requested < min_msl {
            return ValidatorVerdict::deny(
                self.name(),
                self.rule_id(),
                format!(
                    "altitude {requested:.0} ft below minimum safe altitude {min_msl:.0} ft MSL \
                     over {terrain} terrain ({})",
                    self.rule_id()
                ),
                0.0,
            );
        }

        ValidatorVerdict::pass(
            self.name(),
            self.rule_id(),
            format!("altitude safe: {requested:.0} ft above minimum {min_msl:.0} ft"),
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

    fn reroute(params: &[(&str, serde_json::Value)]) -> ActionPrimitive {
        let parameters: BTreeMap<String, serde_json::Value> = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        ActionPrimitive::new("reroute_flight", "flight:IB3202", "aviation", parameters).unwrap()
    }

    #[test]
    fn fuel_adequate_passes() {
        let action = reroute(&[
            ("current_fuel", serde_json::json!(6000)),
            ("route_distance", serde_json::json!(500)),
            ("burn_rate", serde_json::json!(5)),
            ("night", serde_json::json!(false)),
        ]);
        let verdict = FuelReserveValidator.validate(&action, &ctx());
        assert_eq!(verdict.decision, Decision::Allow);
    }

    #[test]
    fn fuel_short_of_reserve_denied() {
        // 500 nm × 5 lb/nm = 2500 lb trip fuel, plus 30 min × 5 lb/min = 150 lb
        // day reserve; 2000 lb on board is 650 lb short.
        let action = reroute(&[
            ("current_fuel", serde_json::json!(2000)),
            ("route_distance", serde_json::json!(500)),
            ("burn_rate", serde_json::json!(5)),
        ]);
        let verdict = FuelReserveValidator.validate(&action, &ctx());
        assert_eq!(verdict.decision, Decision::Deny);
        assert_eq!(verdict.rule_id, "FAA 14 CFR §91.151");
        assert!(verdict.rationale.contains("need 2650 lb"));
    }

    #[test]
    fn night_reserve_is_larger() {
        // Same fuel state passes by day, fails by night (45 min reserve).
        let base = [
            ("current_fuel", serde_json::json!(2700)),
            ("route_distance", serde_json::json!(500)),
            ("burn_rate", serde_json::json!(5)),
        ];
        let day = FuelReserveValidator.validate(&reroute(&base), &ctx());
        assert_eq!(day.decision, Decision::Allow);

        let mut night_params = base.to_vec();
        night_params.push(("night", serde_json::json!(true)));
        let night = FuelReserveValidator.validate(&reroute(&night_params), &ctx());
        assert_eq!(night.decision, Decision::Deny);
    }

    #[test]
    fn fuel_missing_parameters_escalates() {
        let verdict = FuelReserveValidator.validate(&reroute(&[]), &ctx());
        assert_eq!(verdict.decision, Decision::Escalate);
        assert_eq!(verdict.rule_id, "INSUFFICIENT_CONTEXT");
    }

    #[test]
    fn duty_overrun_denied() {
        let action = reroute(&[
            ("current_duty_minutes", serde_json::json!(520)),
            ("proposed_flight_minutes", serde_json::json!(60)),
        ]);
        let verdict = CrewRestValidator.validate(&action, &ctx());
        assert_eq!(verdict.decision, Decision::Deny);
        assert_eq!(verdict.rule_id, "14 CFR §121.471");
        assert!(verdict.rationale.contains("580 min"));
    }

    #[test]
    fn duty_within_limit_passes() {
        let action = reroute(&[
            ("current_duty_minutes", serde_json::json!(300)),
            ("proposed_flight_minutes", serde_json::json!(90)),
        ]);
        let verdict = CrewRestValidator.validate(&action, &ctx());
        assert_eq!(verdict.decision, Decision::Allow);
    }

    #[test]
    fn no_duty_change_passes() {
        let verdict = CrewRestValidator.validate(&reroute(&[]), &ctx());
        assert_eq!(verdict.decision, Decision::Allow);
        assert!(verdict.rationale.contains("no duty-time change"));
    }

    #[test]
    fn partial_duty_parameters_escalate() {
        let action = reroute(&[("current_duty_minutes", serde_json::json!(520))]);
        let verdict = CrewRestValidator.validate(&action, &ctx());
        assert_eq!(verdict.decision, Decision::Escalate);
    }

    fn altitude(params: &[(&str, serde_json::Value)]) -> ActionPrimitive {
        let parameters: BTreeMap<String, serde_json::Value> = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        ActionPrimitive::new("adjust_altitude", "flight:IB3202", "aviation", parameters).unwrap()
    }

    #[test]
    fn altitude_below_terrain_minimum_denied() {
        let action = altitude(&[
            ("requested_altitude_ft", serde_json::json!(2200)),
            ("terrain_type", serde_json::json!("mountainous")),
            ("terrain_elevation_ft", serde_json::json!(1500)),
        ]);
        let verdict = AirspaceValidator.validate(&action, &ctx());
        assert_eq!(verdict.decision, Decision::Deny);
        // 1500 + 2000 AGL minimum over mountainous terrain.
        assert!(verdict.rationale.contains("3500 ft"));
    }

    #[test]
    fn restricted_zone_denied() {
        let action = altitude(&[
            ("requested_altitude_ft", serde_json::json!(10000)),
            ("crosses_restricted_zone", serde_json::json!(true)),
        ]);
        let verdict = AirspaceValidator.validate(&action, &ctx());
        assert_eq!(verdict.decision, Decision::Deny);
        assert!(verdict.rationale.contains("restricted zone"));
    }

    #[test]
    fn safe_altitude_passes() {
        let action = altitude(&[("requested_altitude_ft", serde_json::json!(10000))]);
        let verdict = AirspaceValidator.validate(&action, &ctx());
        assert_eq!(verdict.decision, Decision::Allow);
    }
}

//! Health and status handlers.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::rest::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub ontology_reachable: bool,
    pub version: String,
    pub uptime: String,
}

/// `GET /api/v1/health` — always 200; degradation is reported in the body.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    let ontology_reachable = state.gate.ontology_reachable().await;
    Json(HealthCheckResponse {
        status: if ontology_reachable {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        ontology_reachable,
        version: state.version.clone(),
        uptime: state.uptime(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use certus_gate::mocks::MockOntology;
    use certus_gate::{GateConfig, ValidationGate, ValidatorRegistry, VerdictSigner};
    use certus_ledger::MemoryVerdictStore;
    use std::sync::Arc;

    fn state(ontology: MockOntology) -> AppState {
        let ledger = Arc::new(MemoryVerdictStore::new());
        let gate = ValidationGate::new(
            GateConfig::default(),
            Arc::new(ontology),
            Arc::new(ValidatorRegistry::builtin()),
            VerdictSigner::new(b"health-secret").unwrap(),
            Arc::clone(&ledger) as Arc<dyn certus_ledger::VerdictStore>,
        );
        AppState::new(
            Arc::new(gate),
            ledger,
            Arc::new(crate::metrics::GateMetrics::new().unwrap()),
            false,
        )
    }

    #[tokio::test]
    async fn healthy_when_ontology_reachable() {
        let response = health_check(State(state(MockOntology::healthy()))).await;
        assert_eq!(response.0.status, "healthy");
        assert!(response.0.ontology_reachable);
    }

    #[tokio::test]
    async fn degraded_when_ontology_down() {
        let response = health_check(State(state(MockOntology::unreachable()))).await;
        assert_eq!(response.0.status, "degraded");
        assert!(!response.0.ontology_reachable);
    }
}

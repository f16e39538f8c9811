//! Daemon wiring: collaborators are constructed once at startup and shared
//! for the life of the process. Anything that cannot be wired is fatal —
//! there is no degraded mode.

use std::sync::Arc;

use tracing::info;

use certus_gate::{OntologyGraph, ValidationGate, ValidatorRegistry, VerdictSigner};
use certus_ledger::{MemoryVerdictStore, VerdictStore};

use crate::api::rest::router::create_router;
use crate::api::rest::state::AppState;
use crate::config::{DaemonConfig, LedgerConfig};
use crate::error::{DaemonError, DaemonResult};
use crate::metrics::GateMetrics;

pub struct Server {
    config: DaemonConfig,
    state: AppState,
}

impl Server {
    /// Wire all collaborators. Fails fast on missing keying material or an
    /// unreachable ledger backend.
    pub async fn new(config: DaemonConfig) -> DaemonResult<Self> {
        // The signing secret is mandatory; refuse to start without it.
        let signer = VerdictSigner::from_env().map_err(|_| DaemonError::MissingSecret)?;

        let ledger = Self::build_ledger(&config).await?;
        let ontology = Arc::new(OntologyGraph::seed());
        let registry = Arc::new(ValidatorRegistry::builtin());

        let gate = ValidationGate::new(
            config.gate.to_gate_config(),
            ontology,
            registry,
            signer,
            Arc::clone(&ledger),
        );

        let metrics = GateMetrics::new()
            .map_err(|e| DaemonError::Config(format!("metrics registration failed: {e}")))?;

        let state = AppState::new(
            Arc::new(gate),
            ledger,
            Arc::new(metrics),
            config.gate.complete_fail_closed,
        );

        Ok(Self { config, state })
    }

    async fn build_ledger(config: &DaemonConfig) -> DaemonResult<Arc<dyn VerdictStore>> {
        match &config.ledger {
            LedgerConfig::Memory => {
                info!("ledger backend: in-memory (development profile)");
                Ok(Arc::new(MemoryVerdictStore::new()))
            }
            #[cfg(feature = "postgres")]
            LedgerConfig::Postgres {
                url,
                max_connections,
                connect_timeout_secs,
            } => {
                info!("ledger backend: postgres");
                let store = certus_ledger::PostgresVerdictStore::connect_with_options(
                    url,
                    *max_connections,
                    *connect_timeout_secs,
                )
                .await?;
                Ok(Arc::new(store))
            }
            #[cfg(not(feature = "postgres"))]
            LedgerConfig::Postgres { .. } => Err(DaemonError::Config(
                "postgres ledger configured but the daemon was built without the \
                 `postgres` feature"
                    .into(),
            )),
        }
    }

    /// Serve until shutdown.
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;
        let router = create_router(self.state, self.config.server.enable_cors);

        info!(%addr, "certus daemon listening");
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                info!("shutdown signal received");
            })
            .await?;

        Ok(())
    }
}

//! Cached liveness probe for the ontology session.
//!
//! Probing on every request would dominate the latency budget, so a passing
//! probe is trusted for a configurable window. A failing probe is also
//! cached: a dead session denies requests for the window rather than
//! hammering the store.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::warn;

use crate::ontology::OntologyAuthority;

#[derive(Clone, Copy, Debug)]
struct ProbeState {
    healthy: bool,
    checked_at: Instant,
}

/// Shared, cached health probe.
pub struct HealthProbe {
    ttl: Duration,
    probe_timeout: Duration,
    state: Mutex<Option<ProbeState>>,
}

impl HealthProbe {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            probe_timeout: Duration::from_millis(500),
            state: Mutex::new(None),
        }
    }

    /// Whether the ontology session is alive, consulting the cache first.
    pub async fn check(&self, ontology: &Arc<dyn OntologyAuthority>) -> bool {
        let mut state = self.state.lock().await;

        if let Some(cached) = *state {
            if cached.checked_at.elapsed() < self.ttl {
                return cached.healthy;
            }
        }

        let healthy = tokio::time::timeout(self.probe_timeout, ontology.ping())
            .await
            .unwrap_or(false);

        if !healthy {
            warn!(component = "ontology", "health probe failed");
        }

        *state = Some(ProbeState {
            healthy,
            checked_at: Instant::now(),
        });
        healthy
    }

    /// Drop the cached state so the next check probes again. Used by the
    /// daemon's health endpoint for an uncached view.
    pub async fn invalidate(&self) {
        *self.state.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockOntology;

    #[tokio::test]
    async fn healthy_probe_is_cached() {
        let ontology = MockOntology::healthy();
        let probe = HealthProbe::new(Duration::from_secs(30));
        let shared: Arc<dyn OntologyAuthority> = Arc::new(ontology);

        assert!(probe.check(&shared).await);
        // Second check hits the cache; ping count stays at one.
        assert!(probe.check(&shared).await);
    }

    #[tokio::test]
    async fn unhealthy_probe_is_cached_for_ttl() {
        let shared: Arc<dyn OntologyAuthority> = Arc::new(MockOntology::unreachable());
        let probe = HealthProbe::new(Duration::from_secs(30));

        assert!(!probe.check(&shared).await);
        assert!(!probe.check(&shared).await);
    }

    #[tokio::test]
    async fn expired_cache_reprobes() {
        let shared: Arc<dyn OntologyAuthority> = Arc::new(MockOntology::healthy());
        let probe = HealthProbe::new(Duration::from_millis(0));

        assert!(probe.check(&shared).await);
        // TTL of zero forces a fresh probe each time.
        assert!(probe.check(&shared).await);
    }

    #[tokio::test]
    async fn invalidate_clears_cache() {
        let shared: Arc<dyn OntologyAuthority> = Arc::new(MockOntology::healthy());
        let probe = HealthProbe::new(Duration::from_secs(30));
        assert!(probe.check(&shared).await);
        probe.invalidate().await;
        assert!(probe.check(&shared).await);
    }
}

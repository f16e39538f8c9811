//! Prometheus metrics for the gate's decision stream.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

use certus_types::Verdict;

/// Gate-level metric instruments, registered once at startup.
pub struct GateMetrics {
    registry: Registry,
    decisions: IntCounterVec,
    certifiable: IntCounterVec,
    latency: HistogramVec,
}

impl GateMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let decisions = IntCounterVec::new(
            Opts::new("certus_decisions_total", "Verdicts emitted, by decision"),
            &["decision", "domain"],
        )?;
        let certifiable = IntCounterVec::new(
            Opts::new(
                "certus_certifiable_total",
                "Verdicts by certifiability outcome",
            ),
            &["certifiable"],
        )?;
        let latency = HistogramVec::new(
            HistogramOpts::new(
                "certus_governance_latency_ms",
                "Governance latency per verdict, milliseconds",
            )
            .buckets(vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 150.0, 200.0, 500.0]),
            &["decision"],
        )?;

        registry.register(Box::new(decisions.clone()))?;
        registry.register(Box::new(certifiable.clone()))?;
        registry.register(Box::new(latency.clone()))?;

        Ok(Self {
            registry,
            decisions,
            certifiable,
            latency,
        })
    }

    /// Record one emitted verdict.
    pub fn record(&self, verdict: &Verdict) {
        let decision = verdict.decision.as_str();
        self.decisions
            .with_label_values(&[decision, &verdict.action.domain])
            .inc();
        self.certifiable
            .with_label_values(&[if verdict.certifiable { "true" } else { "false" }])
            .inc();
        self.latency
            .with_label_values(&[decision])
            .observe(verdict.governance_latency_ms);
    }

    /// Render the registry in Prometheus text format.
    pub fn export(&self) -> String {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        if encoder.encode(&families, &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

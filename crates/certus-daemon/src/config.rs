//! Daemon configuration.
//!
//! Layered defaults → optional file → `CERTUS_`-prefixed environment.
//! The signing secret is deliberately NOT part of this struct: it is keying
//! material, loaded by the signer straight from the environment at startup.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

/// Main daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub gate: GateSettings,

    #[serde(default)]
    pub ontology: OntologyConfig,

    #[serde(default)]
    pub ledger: LedgerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            gate: GateSettings::default(),
            ontology: OntologyConfig::default(),
            ledger: LedgerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,

    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".parse().unwrap(),
            enable_cors: true,
        }
    }
}

/// Stage budgets and gate policy, mirroring `certus_gate::GateConfig`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateSettings {
    #[serde(default = "default_total_budget")]
    pub total_budget_ms: u64,

    #[serde(default = "default_semantic_budget")]
    pub semantic_budget_ms: u64,

    #[serde(default = "default_validator_budget")]
    pub validator_budget_ms: u64,

    #[serde(default = "default_persist_budget")]
    pub persist_budget_ms: u64,

    #[serde(default = "default_health_cache")]
    pub health_cache_secs: u64,

    #[serde(default = "default_coverage_floor")]
    pub coverage_floor: f64,

    #[serde(default = "default_max_inflight")]
    pub max_inflight: usize,

    /// When set, a ledger-write failure escalates the HTTP response to 503
    /// instead of returning the DENY verdict with 200.
    #[serde(default)]
    pub complete_fail_closed: bool,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            total_budget_ms: default_total_budget(),
            semantic_budget_ms: default_semantic_budget(),
            validator_budget_ms: default_validator_budget(),
            persist_budget_ms: default_persist_budget(),
            health_cache_secs: default_health_cache(),
            coverage_floor: default_coverage_floor(),
            max_inflight: default_max_inflight(),
            complete_fail_closed: false,
        }
    }
}

impl GateSettings {
    pub fn to_gate_config(&self) -> certus_gate::GateConfig {
        certus_gate::GateConfig {
            total_budget_ms: self.total_budget_ms,
            semantic_budget_ms: self.semantic_budget_ms,
            validator_budget_ms: self.validator_budget_ms,
            persist_budget_ms: self.persist_budget_ms,
            health_cache: std::time::Duration::from_secs(self.health_cache_secs),
            coverage_floor: self.coverage_floor,
            max_inflight: self.max_inflight,
        }
    }
}

/// Ontology store binding.
///
/// The embedded snapshot is the default: the governance graph is loaded
/// in-process at startup and queried by key. The connection fields are the
/// seam for a remote graph-store session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OntologyConfig {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub password: Option<String>,
}

impl Default for OntologyConfig {
    fn default() -> Self {
        Self {
            url: None,
            user: None,
            password: None,
        }
    }
}

/// Verdict ledger backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LedgerConfig {
    /// In-memory store for development and tests.
    Memory,

    /// Append-only Postgres store (feature `postgres`).
    Postgres {
        url: String,

        #[serde(default = "default_pool_size")]
        max_connections: u32,

        #[serde(default = "default_connect_timeout")]
        connect_timeout_secs: u64,
    },
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig::Memory
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_total_budget() -> u64 {
    200
}

fn default_semantic_budget() -> u64 {
    500
}

fn default_validator_budget() -> u64 {
    150
}

fn default_persist_budget() -> u64 {
    50
}

fn default_health_cache() -> u64 {
    30
}

fn default_coverage_floor() -> f64 {
    0.8
}

fn default_max_inflight() -> usize {
    256
}

fn default_pool_size() -> u32 {
    10
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration: defaults, then an optional file, then
    /// `CERTUS_`-prefixed environment variables.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("CERTUS")
                .separator("__")
                .try_parsing(true),
        );

        let mut loaded: DaemonConfig = builder.build()?.try_deserialize()?;

        // Spec-named shorthand bindings take precedence over the nested
        // forms when present.
        if let Ok(url) = std::env::var("CERTUS_LEDGER_URL") {
            loaded.ledger = LedgerConfig::Postgres {
                url,
                max_connections: default_pool_size(),
                connect_timeout_secs: default_connect_timeout(),
            };
        }
        if let Ok(url) = std::env::var("CERTUS_ONTOLOGY_URL") {
            loaded.ontology.url = Some(url);
            loaded.ontology.user = std::env::var("CERTUS_ONTOLOGY_USER").ok();
            loaded.ontology.password = std::env::var("CERTUS_ONTOLOGY_PASSWORD").ok();
        }
        if let Ok(floor) = std::env::var("CERTUS_COVERAGE_FLOOR") {
            if let Ok(parsed) = floor.parse() {
                loaded.gate.coverage_floor = parsed;
            }
        }
        if let Ok(flag) = std::env::var("CERTUS_COMPLETE_FAIL_CLOSED") {
            loaded.gate.complete_fail_closed = matches!(flag.as_str(), "1" | "true" | "yes");
        }

        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_gate_profile() {
        let config = DaemonConfig::default();
        assert_eq!(config.server.listen_addr.port(), 8080);
        assert!(matches!(config.ledger, LedgerConfig::Memory));
        assert_eq!(config.gate.total_budget_ms, 200);
        assert!(!config.gate.complete_fail_closed);
    }

    #[test]
    fn gate_settings_convert() {
        let settings = GateSettings {
            total_budget_ms: 300,
            coverage_floor: 0.9,
            ..GateSettings::default()
        };
        let gate_config = settings.to_gate_config();
        assert_eq!(gate_config.total_budget_ms, 300);
        assert_eq!(gate_config.coverage_floor, 0.9);
        assert_eq!(gate_config.health_cache.as_secs(), 30);
    }

    #[test]
    fn ledger_config_deserializes_tagged() {
        let parsed: LedgerConfig = serde_json::from_str(
            r#"{"type": "postgres", "url": "postgres://localhost/certus"}"#,
        )
        .unwrap();
        match parsed {
            LedgerConfig::Postgres { url, max_connections, .. } => {
                assert_eq!(url, "postgres://localhost/certus");
                assert_eq!(max_connections, 10);
            }
            _ => panic!("expected postgres config"),
        }
    }
}

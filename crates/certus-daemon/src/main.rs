//! certusd — deterministic policy enforcement gateway daemon.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use certus_daemon::{DaemonConfig, DaemonError, DaemonResult, Server};

/// Certus daemon CLI.
#[derive(Parser)]
#[command(name = "certusd")]
#[command(about = "Certus - deterministic policy enforcement gateway", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "CERTUS_CONFIG")]
    config: Option<String>,

    /// Listen address
    #[arg(short, long, env = "CERTUS_LISTEN_ADDR")]
    listen: Option<String>,

    /// Log level
    #[arg(long, env = "CERTUS_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "CERTUS_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_level.clone().into());

    if cli.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let mut config = DaemonConfig::load(cli.config.as_deref())
        .map_err(|e| DaemonError::Config(e.to_string()))?;

    if let Some(listen) = cli.listen {
        config.server.listen_addr = listen
            .parse()
            .map_err(|e| DaemonError::Config(format!("invalid listen address: {e}")))?;
    }

    println!(
        "certusd {} - policy enforcement gateway\n  listening: {}\n  ledger: {}",
        env!("CARGO_PKG_VERSION"),
        config.server.listen_addr,
        match &config.ledger {
            certus_daemon::config::LedgerConfig::Memory => "memory".to_string(),
            certus_daemon::config::LedgerConfig::Postgres { .. } => "postgres".to_string(),
        },
    );

    let server = Server::new(config).await?;
    server.run().await
}

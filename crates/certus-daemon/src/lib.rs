//! Certus daemon — the HTTP surface of the validation gate.
//!
//! One inbound operation (`POST /api/v1/validate`), a health endpoint, a
//! prometheus exporter, and a read path over the verdict ledger. DENY is a
//! normal 200 response; 5xx is reserved for total unavailability, which the
//! gate's fail-closed design is built to prevent.

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod server;

pub use config::DaemonConfig;
pub use error::{DaemonError, DaemonResult};
pub use server::Server;

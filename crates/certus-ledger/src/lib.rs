//! Append-only, time-partitioned ledger of emitted verdicts.
//!
//! The write path is the only contract the gate depends on: one `append`
//! per verdict, under the gate's persist deadline. Rows are never updated
//! or deleted here — retention is an operator policy applied outside the
//! gateway. The read path (listing, per-trace lookup, analytics) serves
//! auditors and dashboards and is deliberately not on the hot path.
//!
//! Two backends: an in-memory twin for tests and the development profile,
//! and a Postgres store (feature `postgres`) with monthly range partitions
//! and write-time constraints.

mod error;
pub mod memory;
mod model;
#[cfg(feature = "postgres")]
pub mod postgres;
mod traits;

pub use error::{LedgerError, LedgerResult};
pub use memory::MemoryVerdictStore;
pub use model::VerdictRow;
#[cfg(feature = "postgres")]
pub use postgres::PostgresVerdictStore;
pub use traits::{LedgerAnalytics, QueryWindow, VerdictStore};

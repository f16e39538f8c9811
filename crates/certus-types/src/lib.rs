//! Shared data model for the Certus policy enforcement gateway.
//!
//! This crate is the contract between every other component: the structured
//! action an agent proposes, the context it carries, and the signed verdict
//! the gateway emits. Nothing here performs I/O.
//!
//! ## Invariants
//!
//! - An [`ActionPrimitive`] is immutable once accepted by the gate.
//! - A [`Verdict`] is emitted exactly once per action and never revised;
//!   mutating any signed field breaks signature verification downstream.
//! - Every failure mode surfaces as `Decision::Deny` with a named reason
//!   code from [`reason`] — the gateway never fails open.

pub mod action;
pub mod reason;
pub mod verdict;

pub use action::{ActionError, ActionPrimitive, AgentContext, MaturityLevel};
pub use verdict::{
    ComponentTimings, Decision, SemanticVerdict, ValidatorVerdict, Verdict,
};

//! Keyed-MAC signing of verdicts for non-repudiation.
//!
//! The MAC covers the canonical JSON of `{decision, reason, trace_id,
//! validator_name: "gate"}` with keys sorted, so downstream auditors can
//! verify a verdict without the full ledger row. The secret is loaded once
//! at startup; its absence is a fatal configuration error.

use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use certus_types::Verdict;

use crate::error::{GateError, GateResult};

type HmacSha256 = Hmac<Sha256>;

/// Environment binding for the signing secret.
pub const SECRET_ENV: &str = "CERTUS_SIGNATURE_SECRET";

/// Process-wide verdict signer. Construct once at startup and share.
#[derive(Clone)]
pub struct VerdictSigner {
    secret: Vec<u8>,
    key_version: Option<String>,
}

impl VerdictSigner {
    /// Build from explicit keying material.
    pub fn new(secret: impl AsRef<[u8]>) -> GateResult<Self> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(GateError::MissingSecret);
        }
        Ok(Self {
            secret: secret.to_vec(),
            key_version: None,
        })
    }

    /// Load the secret from the process environment. Fails when unset or
    /// empty — the gate refuses to start without keying material.
    pub fn from_env() -> GateResult<Self> {
        let secret = std::env::var(SECRET_ENV).map_err(|_| GateError::MissingSecret)?;
        Self::new(secret.as_bytes())
    }

    /// Attach a key-version label carried onto signed verdicts. Reserved
    /// for operator-driven rotation; the gate itself never rotates.
    pub fn with_key_version(mut self, version: impl Into<String>) -> Self {
        self.key_version = Some(version.into());
        self
    }

    pub fn key_version(&self) -> Option<&str> {
        self.key_version.as_deref()
    }

    /// Canonical signing payload: sorted-key JSON over the covered fields.
    fn payload(decision: &str, reason: &str, trace_id: &str) -> GateResult<Vec<u8>> {
        // BTreeMap serializes in key order, giving a canonical byte string.
        let fields: BTreeMap<&str, &str> = BTreeMap::from([
            ("decision", decision),
            ("reason", reason),
            ("trace_id", trace_id),
            ("validator_name", "gate"),
        ]);
        Ok(serde_json::to_vec(&fields)?)
    }

    fn mac(&self, payload: &[u8]) -> GateResult<String> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| GateError::Signing(e.to_string()))?;
        mac.update(payload);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Compute the hex MAC for a verdict's covered fields.
    pub fn sign(&self, verdict: &Verdict) -> GateResult<String> {
        let payload = Self::payload(
            verdict.decision.as_str(),
            &verdict.reason,
            &verdict.trace_id,
        )?;
        self.mac(&payload)
    }

    /// Verify a verdict's signature against this signer's secret. Exposed
    /// for downstream auditors; constant-time comparison via the MAC itself.
    pub fn verify(&self, verdict: &Verdict) -> bool {
        if verdict.signature.is_empty() {
            return false;
        }
        let Ok(payload) = Self::payload(
            verdict.decision.as_str(),
            &verdict.reason,
            &verdict.trace_id,
        ) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(&self.secret) else {
            return false;
        };
        mac.update(&payload);
        let Ok(expected) = hex::decode(&verdict.signature) else {
            return false;
        };
        mac.verify_slice(&expected).is_ok()
    }
}

impl std::fmt::Debug for VerdictSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose keying material through Debug.
        f.debug_struct("VerdictSigner")
            .field("key_version", &self.key_version)
            .finish_non_exhaustive()
    }
}

//! Attestation issuer seam.
//!
//! The proof service is external and opaque: it takes a circuit and its
//! public inputs and returns a 32-byte attestation identifier. The core
//! never checks the identifier's correctness.

use async_trait::async_trait;
use zkrfq_codec::attestation_id_from;
use zkrfq_types::{AttestationId, AttestationKind, Result};

#[async_trait]
pub trait AttestationIssuer: Send + Sync {
    /// Submit a proof request for one circuit.
    async fn submit_proof(
        &self,
        kind: AttestationKind,
        public_inputs: &serde_json::Value,
    ) -> Result<AttestationId>;
}

/// Offline issuer deriving identifiers by hashing the request.
///
/// Same circuit and inputs always yield the same identifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeterministicIssuer;

#[async_trait]
impl AttestationIssuer for DeterministicIssuer {
    async fn submit_proof(
        &self,
        kind: AttestationKind,
        public_inputs: &serde_json::Value,
    ) -> Result<AttestationId> {
        let id = attestation_id_from(kind.circuit(), public_inputs);
        tracing::debug!(circuit = kind.circuit(), attestation_id = %id.short(), "proof issued");
        Ok(id)
    }
}

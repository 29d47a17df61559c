//! Confidential-Compute Collaborators
//!
//! Narrow request/response interfaces over the three external services the
//! pipeline drives. The concrete cryptography is opaque to this crate:
//! ciphertexts are never decrypted here and proofs are never checked here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ExecResult;
use veil_core::ComputationId;

/// Zero-knowledge eligibility proof produced by the prover
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityProof {
    /// Circuit the proof came from
    pub circuit: String,
    /// Opaque proof bytes, encoded
    pub proof: String,
    /// Verification key reference
    pub verification_key: String,
    /// Public outputs exposed by the circuit
    pub public_outputs: BTreeMap<String, String>,
}

/// Ciphertext produced by the parameter encryptor
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedValue {
    /// Opaque ciphertext, encoded
    pub ciphertext: String,
    /// Encryption public key reference
    pub public_key: String,
}

/// Result of one MPC submission
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MpcOutcome {
    /// Whether the computation succeeded
    pub success: bool,
    /// Computation id assigned by the executor
    pub computation_id: ComputationId,
    /// Computation proof if the cluster produced one
    pub proof: Option<String>,
    /// Enclave attestation if available
    pub attestation: Option<String>,
    /// Computation outputs
    pub outputs: BTreeMap<String, String>,
}

/// Eligibility prover (ZK circuits).
///
/// Must be deterministic in its success/failure classification: the same
/// inputs always pass or always fail, even when the proof bytes differ.
#[async_trait]
pub trait EligibilityProver: Send + Sync {
    /// Prove the named circuit over public and private inputs
    async fn prove(
        &self,
        circuit: &str,
        public_inputs: BTreeMap<String, String>,
        private_inputs: BTreeMap<String, String>,
    ) -> ExecResult<EligibilityProof>;
}

/// Parameter encryptor (FHE).
///
/// The ciphertext is consumed downstream by the MPC executor; this crate
/// never needs it decrypted.
#[async_trait]
pub trait ParameterEncryptor: Send + Sync {
    /// Encrypt a value under the given ciphertext type tag
    async fn encrypt(&self, value: &str, type_tag: &str) -> ExecResult<EncryptedValue>;
}

/// MPC executor.
#[async_trait]
pub trait MpcExecutor: Send + Sync {
    /// Submit an operation with encrypted inputs and plaintext metadata
    async fn submit(
        &self,
        operation: &str,
        encrypted_inputs: BTreeMap<String, String>,
        metadata: BTreeMap<String, String>,
    ) -> ExecResult<MpcOutcome>;
}

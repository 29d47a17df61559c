//! Threshold Signing
//!
//! k-of-n signing driven through one MPC submission. Fails closed: fewer
//! available signers than the threshold never reaches the MPC executor.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::pipeline::ExecutionPipeline;
use veil_core::{AgentId, ComputationId, Digest};

/// Outcome of one threshold-signing attempt
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdSignature {
    /// Whether a signature commitment was produced
    pub success: bool,
    /// Whether enough signers were available
    pub threshold_met: bool,
    /// The quorum actually used, in signer-list order
    pub signers_used: Vec<AgentId>,
    /// 0x-prefixed signature commitment
    pub signature_commitment: Option<String>,
    /// MPC computation id if a submission was made
    pub computation_id: Option<ComputationId>,
    /// Failure description
    pub error: Option<String>,
}

impl ExecutionPipeline {
    /// Sign a message with a k-of-n signer set.
    ///
    /// The quorum is the first `threshold` signers in list order; the
    /// tie-break is deterministic, not a random selection. The commitment
    /// binds the message digest to that quorum.
    pub async fn threshold_sign(
        &self,
        message: &[u8],
        signers: &[AgentId],
        threshold: usize,
    ) -> ThresholdSignature {
        if signers.len() < threshold {
            warn!(
                available = signers.len(),
                required = threshold,
                "threshold signing refused, not enough signers"
            );
            return ThresholdSignature {
                success: false,
                threshold_met: false,
                signers_used: Vec::new(),
                signature_commitment: None,
                computation_id: None,
                error: Some(format!(
                    "{} signers available, {} required",
                    signers.len(),
                    threshold
                )),
            };
        }

        let quorum: Vec<AgentId> = signers[..threshold].to_vec();
        let message_digest = Digest::blake3(message);

        let mut encrypted_inputs = BTreeMap::new();
        encrypted_inputs.insert("message_digest".to_string(), message_digest.to_hex());

        let mut metadata = BTreeMap::new();
        metadata.insert("threshold".to_string(), threshold.to_string());
        metadata.insert("signer_count".to_string(), signers.len().to_string());

        match self
            .mpc
            .submit("threshold_sign", encrypted_inputs, metadata)
            .await
        {
            Ok(outcome) if outcome.success => {
                let quorum_ids = quorum
                    .iter()
                    .map(|signer| signer.as_str())
                    .collect::<Vec<_>>()
                    .join(",");
                let commitment = Digest::combine(
                    &message_digest,
                    &Digest::blake3(quorum_ids.as_bytes()),
                );
                ThresholdSignature {
                    success: true,
                    threshold_met: true,
                    signers_used: quorum,
                    signature_commitment: Some(format!("0x{}", commitment.to_hex())),
                    computation_id: Some(outcome.computation_id),
                    error: None,
                }
            }
            Ok(outcome) => ThresholdSignature {
                success: false,
                threshold_met: true,
                signers_used: quorum,
                signature_commitment: None,
                computation_id: Some(outcome.computation_id),
                error: Some("mpc signing computation reported failure".to_string()),
            },
            Err(error) => ThresholdSignature {
                success: false,
                threshold_met: true,
                signers_used: quorum,
                signature_commitment: None,
                computation_id: None,
                error: Some(error.to_string()),
            },
        }
    }
}

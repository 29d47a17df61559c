//! Execution Entities
//!
//! One admitted invocation of the tiered pipeline: the request going in,
//! the immutable result coming out.

use super::common::{AgentId, ExecutionId};
use crate::tier::Tier;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Capability operation kind
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Swap,
    Transfer,
    Bid,
    Vote,
    Delegate,
    Prove,
}

impl OperationKind {
    /// Get operation name
    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::Swap => "swap",
            OperationKind::Transfer => "transfer",
            OperationKind::Bid => "bid",
            OperationKind::Vote => "vote",
            OperationKind::Delegate => "delegate",
            OperationKind::Prove => "prove",
        }
    }
}

/// One admitted invocation to the pipeline
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Calling agent
    pub agent_id: AgentId,
    /// Operation to execute
    pub operation: OperationKind,
    /// Economic size of the operation in USD
    pub amount_usd: Decimal,
    /// Operation inputs, validated at the router boundary
    pub inputs: BTreeMap<String, String>,
    /// Eligibility circuits that must be proven before execution, in order
    pub required_proofs: Vec<String>,
    /// Explicit tier override; wins over amount-based resolution
    pub privacy_level: Option<Tier>,
}

impl ExecutionRequest {
    /// Create a request
    pub fn new(agent_id: AgentId, operation: OperationKind, amount_usd: Decimal) -> Self {
        Self {
            agent_id,
            operation,
            amount_usd,
            inputs: BTreeMap::new(),
            required_proofs: Vec::new(),
            privacy_level: None,
        }
    }

    /// Add an input
    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.inputs.insert(key.into(), value.into());
        self
    }

    /// Require an eligibility proof from the named circuit
    pub fn with_required_proof(mut self, circuit: impl Into<String>) -> Self {
        self.required_proofs.push(circuit.into());
        self
    }

    /// Force a privacy tier
    pub fn with_privacy_level(mut self, tier: Tier) -> Self {
        self.privacy_level = Some(tier);
        self
    }
}

/// Outcome of running the pipeline for one request. Immutable once produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Execution ID
    pub execution_id: ExecutionId,
    /// Tier the request ran at
    pub tier: Tier,
    /// Stage names in completion order, append-only during a run
    pub stages_completed: Vec<String>,
    /// Usage fee charged
    pub fee_usd: Decimal,
    /// Basis points of slippage avoided versus a public execution
    pub slippage_saved_bps: Option<i64>,
    /// Wall-clock time for the whole run
    pub total_time_ms: u64,
    /// Per-stage wall-clock times
    pub stage_times: HashMap<String, u64>,
    /// Whether every applicable stage completed
    pub success: bool,
    /// Human-readable failure description
    pub error: Option<String>,
}

impl ExecutionResult {
    /// Whether a named stage completed
    pub fn completed(&self, stage: &str) -> bool {
        self.stages_completed.iter().any(|s| s == stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_names() {
        assert_eq!(OperationKind::Swap.name(), "swap");
        assert_eq!(OperationKind::Delegate.name(), "delegate");
    }

    #[test]
    fn test_request_builders() {
        let request = ExecutionRequest::new(
            AgentId::new("agent:1"),
            OperationKind::Transfer,
            Decimal::new(1_000, 0),
        )
        .with_input("recipient", "agent:2")
        .with_required_proof("balance_threshold")
        .with_privacy_level(Tier::Maximum);

        assert_eq!(request.inputs.get("recipient").map(String::as_str), Some("agent:2"));
        assert_eq!(request.required_proofs, vec!["balance_threshold"]);
        assert_eq!(request.privacy_level, Some(Tier::Maximum));
    }
}

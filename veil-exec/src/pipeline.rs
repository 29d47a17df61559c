//! Execution Pipeline
//!
//! Drives one admitted invocation through the tier-conditional stage chain:
//! resolve the tier, short-circuit the public common case, fold the stages
//! left-to-right through the external collaborators, derive the fee from the
//! privacy value delivered, and keep running statistics.

use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::collaborators::{EligibilityProver, MpcExecutor, ParameterEncryptor};
use crate::error::{ExecError, ExecResult};
use crate::fees::{self, FeeSchedule};
use crate::stage::{StageContext, StageKind, STAGE_MPC, STAGE_PUBLIC_EXECUTION};
use veil_core::{
    AuctionId, ExecutionId, ExecutionRequest, ExecutionResult, OrderbookId, Tier, TierThresholds,
    TokenSource,
};

/// Pipeline configuration
#[derive(Clone, Copy, Debug, Default)]
pub struct PipelineConfig {
    /// Tier thresholds
    pub thresholds: TierThresholds,
    /// Fee schedule
    pub fees: FeeSchedule,
}

/// Running pipeline counters. Mutated only after full success.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PipelineStats {
    /// Successful executions
    pub execution_count: u64,
    /// USD volume executed
    pub total_volume_usd: Decimal,
    /// USD fees charged
    pub total_fees_usd: Decimal,
}

/// Tiered confidential execution pipeline
pub struct ExecutionPipeline {
    pub(crate) prover: Arc<dyn EligibilityProver>,
    pub(crate) encryptor: Arc<dyn ParameterEncryptor>,
    pub(crate) mpc: Arc<dyn MpcExecutor>,
    pub(crate) tokens: Arc<dyn TokenSource>,
    pub(crate) config: PipelineConfig,
    pub(crate) stats: RwLock<PipelineStats>,
    pub(crate) orderbooks: RwLock<HashMap<OrderbookId, crate::orderbook::Orderbook>>,
    pub(crate) auctions: RwLock<HashMap<AuctionId, crate::auction::PrivateAuction>>,
}

impl ExecutionPipeline {
    /// Create a pipeline over the three collaborators
    pub fn new(
        prover: Arc<dyn EligibilityProver>,
        encryptor: Arc<dyn ParameterEncryptor>,
        mpc: Arc<dyn MpcExecutor>,
        tokens: Arc<dyn TokenSource>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            prover,
            encryptor,
            mpc,
            tokens,
            config,
            stats: RwLock::new(PipelineStats::default()),
            orderbooks: RwLock::new(HashMap::new()),
            auctions: RwLock::new(HashMap::new()),
        }
    }

    /// Pipeline configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Snapshot the running counters
    pub async fn stats(&self) -> PipelineStats {
        self.stats.read().await.clone()
    }

    /// Run one admitted invocation.
    ///
    /// Never returns an error: collaborator failures become a failed
    /// `ExecutionResult` carrying the stages and timings accumulated so far.
    pub async fn execute(&self, request: ExecutionRequest) -> ExecutionResult {
        let started = Instant::now();
        let execution_id = self.tokens.execution_id();
        let tier = request
            .privacy_level
            .unwrap_or_else(|| self.config.thresholds.resolve(request.amount_usd));

        let mut stages_completed: Vec<String> = Vec::new();
        let mut stage_times: HashMap<String, u64> = HashMap::new();

        // The common case: small public operations with no eligibility
        // requirements bypass every collaborator.
        if tier == Tier::Public
            && request.amount_usd < self.config.thresholds.fhe_recommended()
            && request.required_proofs.is_empty()
        {
            stages_completed.push(STAGE_PUBLIC_EXECUTION.to_string());
            stage_times.insert(STAGE_PUBLIC_EXECUTION.to_string(), 0);
            self.accrue(request.amount_usd, Decimal::ZERO).await;
            debug!(execution_id = %execution_id, amount = %request.amount_usd, "public short-circuit");
            return ExecutionResult {
                execution_id,
                tier,
                stages_completed,
                fee_usd: Decimal::ZERO,
                slippage_saved_bps: None,
                total_time_ms: started.elapsed().as_millis() as u64,
                stage_times,
                success: true,
                error: None,
            };
        }

        let mut ctx = StageContext::default();
        for stage in StageKind::ORDERED {
            if !stage.applies(tier, &request) {
                continue;
            }
            let stage_started = Instant::now();
            let outcome = self.run_stage(stage, &execution_id, &request, &mut ctx).await;
            let elapsed_ms = stage_started.elapsed().as_millis() as u64;
            stage_times.insert(stage.name().to_string(), elapsed_ms);
            match outcome {
                Ok(()) => stages_completed.push(stage.name().to_string()),
                Err(error) => {
                    warn!(
                        execution_id = %execution_id,
                        stage = stage.name(),
                        error = %error,
                        "stage failed, returning partial progress"
                    );
                    return ExecutionResult {
                        execution_id,
                        tier,
                        stages_completed,
                        fee_usd: Decimal::ZERO,
                        slippage_saved_bps: None,
                        total_time_ms: started.elapsed().as_millis() as u64,
                        stage_times,
                        success: false,
                        error: Some(error.to_string()),
                    };
                }
            }
        }

        // A public-tier run only reaches here when eligibility was required;
        // the operation itself still executes publicly.
        if tier == Tier::Public {
            stages_completed.push(STAGE_PUBLIC_EXECUTION.to_string());
            stage_times.insert(STAGE_PUBLIC_EXECUTION.to_string(), 0);
        }

        let breakdown = fees::assess(&self.config.fees, tier, request.amount_usd);
        self.accrue(request.amount_usd, breakdown.fee_usd).await;

        info!(
            execution_id = %execution_id,
            tier = tier.name(),
            stages = stages_completed.len(),
            fee_usd = %breakdown.fee_usd,
            duration_ms = started.elapsed().as_millis() as u64,
            "execution complete"
        );

        ExecutionResult {
            execution_id,
            tier,
            stages_completed,
            fee_usd: breakdown.fee_usd,
            slippage_saved_bps: Some(breakdown.saved_bps),
            total_time_ms: started.elapsed().as_millis() as u64,
            stage_times,
            success: true,
            error: None,
        }
    }

    async fn run_stage(
        &self,
        stage: StageKind,
        execution_id: &ExecutionId,
        request: &ExecutionRequest,
        ctx: &mut StageContext,
    ) -> ExecResult<()> {
        match stage {
            StageKind::Eligibility => {
                let circuit = request.required_proofs.first().ok_or_else(|| {
                    ExecError::InvalidState {
                        reason: "eligibility stage scheduled without required proofs".to_string(),
                    }
                })?;

                let mut public_inputs = BTreeMap::new();
                public_inputs.insert("threshold".to_string(), request.amount_usd.to_string());
                public_inputs.insert(
                    "operation".to_string(),
                    request.operation.name().to_string(),
                );

                let mut private_inputs = request.inputs.clone();
                private_inputs.insert("agent_id".to_string(), request.agent_id.to_string());

                ctx.eligibility =
                    Some(self.prover.prove(circuit, public_inputs, private_inputs).await?);
            }
            StageKind::Encrypt => {
                ctx.encrypted_amount = Some(
                    self.encryptor
                        .encrypt(&request.amount_usd.to_string(), "euint128")
                        .await?,
                );
            }
            StageKind::Mpc => {
                let mut encrypted_inputs = BTreeMap::new();
                encrypted_inputs.insert(
                    "amount".to_string(),
                    ctx.encrypted_amount
                        .as_ref()
                        .map(|e| e.ciphertext.clone())
                        .unwrap_or_else(|| request.amount_usd.to_string()),
                );
                encrypted_inputs.insert("agent_id".to_string(), request.agent_id.to_string());

                let mut metadata = BTreeMap::new();
                metadata.insert(
                    "operation".to_string(),
                    request.operation.name().to_string(),
                );
                metadata.insert("execution_id".to_string(), execution_id.to_string());
                if let Some(eligibility) = &ctx.eligibility {
                    metadata.insert("eligibility_proof".to_string(), eligibility.proof.clone());
                }

                let outcome = self
                    .mpc
                    .submit(request.operation.name(), encrypted_inputs, metadata)
                    .await?;
                if !outcome.success {
                    return Err(ExecError::StageFailed {
                        stage: STAGE_MPC.to_string(),
                        reason: format!(
                            "computation {} reported failure",
                            outcome.computation_id
                        ),
                    });
                }
                ctx.mpc = Some(outcome);
            }
            StageKind::ExecutionProof => {
                let mut public_inputs = BTreeMap::new();
                public_inputs.insert("execution_id".to_string(), execution_id.to_string());
                public_inputs.insert(
                    "operation".to_string(),
                    request.operation.name().to_string(),
                );

                let mut private_inputs = BTreeMap::new();
                private_inputs.insert(
                    "attestation".to_string(),
                    ctx.mpc
                        .as_ref()
                        .and_then(|m| m.attestation.clone())
                        .unwrap_or_default(),
                );

                ctx.correctness = Some(
                    self.prover
                        .prove("execution_correctness", public_inputs, private_inputs)
                        .await?,
                );
            }
        }
        Ok(())
    }

    pub(crate) async fn accrue(&self, volume_usd: Decimal, fee_usd: Decimal) {
        let mut stats = self.stats.write().await;
        stats.execution_count += 1;
        stats.total_volume_usd += volume_usd;
        stats.total_fees_usd += fee_usd;
    }
}

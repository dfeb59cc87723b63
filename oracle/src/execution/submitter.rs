use std::fmt::Display;
use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::calculator::ScalarDecision;
use crate::chain::{ChainClient, Signer};
use crate::execution::types::{FailureStage, GasConfigReading, SkipReason, UpdateOutcome};

/// Drives one `setGasConfig` attempt through READ → BUILD → SEND → WAIT →
/// CLASSIFY.
///
/// READ happens once per cycle in [`UpdateSubmitter::read`], before the
/// decision is computed, so the threshold gate always sees the value the
/// write would replace. Transitions are one-way. A failure at any step ends
/// the attempt with `Failed { stage, .. }`; nothing is retried here.
pub struct UpdateSubmitter<C: ChainClient, S: Signer> {
    chain: Arc<C>,
    signer: Arc<S>,
    chain_id: u64,
    wait_for_confirmation: bool,
}

impl<C: ChainClient, S: Signer> UpdateSubmitter<C, S> {
    pub fn new(chain: Arc<C>, signer: Arc<S>, chain_id: u64) -> Self {
        Self {
            chain,
            signer,
            chain_id,
            wait_for_confirmation: true,
        }
    }

    /// When disabled, the attempt ends with `Submitted` right after SEND.
    pub fn with_wait_for_confirmation(mut self, wait: bool) -> Self {
        self.wait_for_confirmation = wait;
        self
    }

    /// READ: overhead and scalar, one RPC call each.
    ///
    /// The error side is always `Failed { stage: Read }`.
    #[instrument(skip(self), target = "submitter", level = "debug")]
    pub async fn read(&self) -> Result<GasConfigReading, UpdateOutcome> {
        let overhead = self
            .chain
            .overhead()
            .await
            .map_err(|e| failed(FailureStage::Read, e))?;
        let scalar = self
            .chain
            .scalar()
            .await
            .map_err(|e| failed(FailureStage::Read, e))?;

        Ok(GasConfigReading { overhead, scalar })
    }

    /// Runs BUILD → SEND → WAIT → CLASSIFY for a decision computed against
    /// `reading`. The overhead is carried through unchanged.
    #[instrument(
        skip(self, reading, decision),
        target = "submitter",
        fields(target_scalar = %decision.target_scalar, chain_id = self.chain_id)
    )]
    pub async fn submit(&self, reading: &GasConfigReading, decision: &ScalarDecision) -> UpdateOutcome {
        if !decision.should_update {
            return UpdateOutcome::Skipped {
                reason: SkipReason::BelowThreshold,
            };
        }

        // Only reachable with a zero threshold.
        if reading.scalar == decision.target_scalar {
            info!(
                scalar = %reading.scalar,
                "on-chain scalar already at target, nothing to send"
            );
            return UpdateOutcome::Skipped {
                reason: SkipReason::AlreadyAtTarget,
            };
        }

        // BUILD
        let auth = match self.signer.authorize(self.chain_id) {
            Ok(a) => a,
            Err(e) => return failed(FailureStage::Sign, e),
        };

        // SEND
        info!(
            overhead = %reading.overhead,
            scalar = %decision.target_scalar,
            from = %auth.from,
            "sending setGasConfig"
        );
        let tx_hash = match self
            .chain
            .send_gas_config(&auth, reading.overhead, decision.target_scalar)
            .await
        {
            Ok(h) => h,
            Err(e) => return failed(FailureStage::Send, e),
        };
        let tx_id = tx_hash.to_string();

        info!(tx_id = %tx_id, "transaction sent");

        if !self.wait_for_confirmation {
            return UpdateOutcome::Submitted { tx_id };
        }

        // WAIT
        info!(tx_id = %tx_id, "waiting for confirmation");
        let receipt = match self.chain.wait_for_inclusion(tx_hash).await {
            Ok(r) => r,
            Err(e) => return failed(FailureStage::Confirm, e),
        };

        // CLASSIFY
        if receipt.success {
            info!(
                tx_id = %tx_id,
                block = receipt.block_number,
                gas_used = receipt.gas_used,
                scalar = %decision.target_scalar,
                "transaction confirmed, scalar updated"
            );
            UpdateOutcome::Confirmed {
                tx_id,
                block: receipt.block_number,
                gas_used: receipt.gas_used,
            }
        } else {
            error!(tx_id = %tx_id, block = receipt.block_number, "transaction reverted");
            UpdateOutcome::Reverted {
                tx_id,
                block: receipt.block_number,
            }
        }
    }
}

fn failed(stage: FailureStage, cause: impl Display) -> UpdateOutcome {
    let cause = cause.to_string();
    error!(stage = %stage, cause = %cause, "scalar update failed");
    UpdateOutcome::Failed { stage, cause }
}

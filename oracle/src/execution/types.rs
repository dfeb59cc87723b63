use std::fmt;

use alloy::primitives::U256;

use crate::error::AppError;

/// Gas configuration as read from `SystemConfig` at the start of a cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasConfigReading {
    /// Carried through unchanged by updates.
    pub overhead: U256,
    /// Live scalar the decision is computed against.
    pub scalar: u128,
}

/// Step of the submission protocol at which an attempt stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureStage {
    Read,
    Sign,
    Send,
    Confirm,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureStage::Read => "read",
            FailureStage::Sign => "sign",
            FailureStage::Send => "send",
            FailureStage::Confirm => "confirm",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Change stayed under the update threshold.
    BelowThreshold,
    /// The scalar read this cycle already equals the target.
    AlreadyAtTarget,
}

/// Terminal state of one submission attempt. Logged and exported, never
/// persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    Skipped {
        reason: SkipReason,
    },
    /// Broadcast without waiting for inclusion.
    Submitted {
        tx_id: String,
    },
    Confirmed {
        tx_id: String,
        block: u64,
        gas_used: u64,
    },
    Reverted {
        tx_id: String,
        block: u64,
    },
    Failed {
        stage: FailureStage,
        cause: String,
    },
}

impl UpdateOutcome {
    /// Whether the attempt got as far as broadcasting a write.
    pub fn attempted_send(&self) -> bool {
        match self {
            UpdateOutcome::Skipped { .. } => false,
            UpdateOutcome::Failed { stage, .. } => {
                matches!(stage, FailureStage::Send | FailureStage::Confirm)
            }
            UpdateOutcome::Submitted { .. }
            | UpdateOutcome::Confirmed { .. }
            | UpdateOutcome::Reverted { .. } => true,
        }
    }

    /// Stable label used in logs and on the cycle span.
    pub fn label(&self) -> &'static str {
        match self {
            UpdateOutcome::Skipped { .. } => "skipped",
            UpdateOutcome::Submitted { .. } => "submitted",
            UpdateOutcome::Confirmed { .. } => "confirmed",
            UpdateOutcome::Reverted { .. } => "reverted",
            UpdateOutcome::Failed { .. } => "failed",
        }
    }

    /// Maps failures onto the application error taxonomy.
    pub fn to_error(&self) -> Option<AppError> {
        match self {
            UpdateOutcome::Failed { stage, cause } => Some(match stage {
                FailureStage::Read => AppError::ContractRead(cause.clone()),
                FailureStage::Sign => AppError::Signing(cause.clone()),
                FailureStage::Send => AppError::Submission(cause.clone()),
                FailureStage::Confirm => AppError::Confirmation(cause.clone()),
            }),
            UpdateOutcome::Reverted { tx_id, .. } => Some(AppError::OnChainRevert {
                tx_id: tx_id.clone(),
            }),
            _ => None,
        }
    }
}

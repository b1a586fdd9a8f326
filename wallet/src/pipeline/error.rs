use std::time::Duration;

use thiserror::Error;
use tokenbank_common::{crypto::Hash, rpc::RpcError};

use crate::signer::SignerError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    // The account holder declined, nothing reached the network
    #[error("Signer rejected the transaction: {0}")]
    SignerRejected(String),

    // The node refused the transaction before inclusion
    #[error("Transaction rejected by node: {0}")]
    Submission(RpcError),

    #[error("Transaction {transaction} reverted{}", reason.as_ref().map(|r| format!(": {}", r)).unwrap_or_default())]
    ExecutionReverted {
        transaction: Hash,
        reason: Option<String>,
    },

    // The transaction may still be included later
    #[error("Transaction {transaction} not confirmed after {elapsed:?}")]
    ConfirmationTimeout { transaction: Hash, elapsed: Duration },

    #[error("Transport error: {0}")]
    Transport(RpcError),
}

impl PipelineError {
    // Classify an error returned by the node while submitting
    pub fn from_submission(error: RpcError) -> Self {
        match error {
            RpcError::UserRejected(reason) => Self::SignerRejected(reason),
            e if e.is_transport() => Self::Transport(e),
            e => Self::Submission(e),
        }
    }

    // Transaction that was already sent when the step failed, if any
    pub fn transaction(&self) -> Option<&Hash> {
        match self {
            Self::ExecutionReverted { transaction, .. }
            | Self::ConfirmationTimeout { transaction, .. } => Some(transaction),
            _ => None,
        }
    }

    /// Whether the failed read or poll may be attempted again.
    /// A state-changing step is never retried by the pipeline itself.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<SignerError> for PipelineError {
    fn from(value: SignerError) -> Self {
        match value {
            SignerError::Rejected(reason) => Self::SignerRejected(reason),
        }
    }
}

use serde::Serialize;
use tokenbank_common::{
    abi::{AbiValue, MethodDescriptor},
    crypto::{Address, Hash},
    rpc::{Receipt, RpcError, TransactionRequest},
};

use super::PipelineError;

/// One state-changing contract call. Immutable once part of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineStep {
    pub target: Address,
    pub method: MethodDescriptor,
    pub args: Vec<AbiValue>,
}

impl PipelineStep {
    pub fn new(target: Address, method: MethodDescriptor, args: Vec<AbiValue>) -> Self {
        Self {
            target,
            method,
            args,
        }
    }

    // Short label used in logs, e.g. `approve(address,uint256)`
    pub fn label(&self) -> String {
        self.method.signature()
    }

    /// Encode the call into a transaction sent from `from`.
    pub fn to_request(&self, from: Address) -> Result<TransactionRequest, RpcError> {
        let data = self.method.encode_call(&self.args)?;
        Ok(TransactionRequest::new(from, self.target, data))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Pending,
    Submitted(Hash),
    Confirmed(Receipt),
    Failed(PipelineError),
}

impl StepStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn transaction(&self) -> Option<&Hash> {
        match self {
            Self::Submitted(hash) => Some(hash),
            Self::Confirmed(receipt) => Some(&receipt.transaction_hash),
            Self::Failed(error) => error.transaction(),
            Self::Pending => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Submitted(_) => "submitted",
            Self::Confirmed(_) => "confirmed",
            Self::Failed(_) => "failed",
        }
    }
}

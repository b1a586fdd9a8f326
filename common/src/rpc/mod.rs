#[cfg(feature = "rpc-client")]
pub mod client;

mod error;
mod types;

pub use error::*;
pub use types::*;

use crate::{
    abi::{AbiValue, MethodDescriptor},
    crypto::{Address, Hash},
    storage::{Slot, Word},
};
use async_trait::async_trait;

/// Read-only view of a ledger node.
///
/// Implementations must tolerate concurrent outstanding requests, or
/// serialize them internally: several element reads may be in flight at once.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Raw storage word at `slot` of the contract at `address`. Idempotent.
    async fn get_storage_at(&self, address: &Address, slot: Slot) -> Result<Word, RpcError>;

    /// Execute a read-only call with already encoded call data.
    async fn call_raw(&self, address: &Address, data: Vec<u8>) -> Result<Vec<u8>, RpcError>;

    /// Receipt for a transaction, `ReceiptStatus::Unknown` while not included. Idempotent.
    async fn get_receipt(&self, transaction: &Hash) -> Result<Receipt, RpcError>;

    /// Encode `args` for `method`, call it and decode its outputs.
    async fn call(
        &self,
        address: &Address,
        method: &MethodDescriptor,
        args: &[AbiValue],
    ) -> Result<Vec<AbiValue>, RpcError> {
        let data = method.encode_call(args)?;
        let output = self.call_raw(address, data).await?;
        Ok(method.decode_output(&output)?)
    }
}

/// Ledger node able to submit state-changing transactions for a signer's account.
#[async_trait]
pub trait LedgerClient: LedgerReader {
    /// Submit a transaction and return its identifier once the node accepted it.
    async fn send_transaction(&self, request: &TransactionRequest) -> Result<Hash, RpcError>;
}

use async_trait::async_trait;
use thiserror::Error;
use tokenbank_common::{crypto::Address, rpc::TransactionRequest};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignerError {
    #[error("Request rejected: {0}")]
    Rejected(String),
}

/// Account holder in front of the node.
///
/// Keys stay with the node: a signer only exposes the sending account and
/// approves or declines each request before it is submitted.
#[async_trait]
pub trait Signer: Send + Sync {
    fn account(&self) -> Address;

    async fn approve(&self, request: &TransactionRequest) -> Result<(), SignerError>;
}

// Account unlocked on the node, every request is approved locally
// The node may still decline it (EIP-1193 code 4001)
#[derive(Debug, Clone, Copy)]
pub struct NodeAccountSigner {
    account: Address,
}

impl NodeAccountSigner {
    pub fn new(account: Address) -> Self {
        Self { account }
    }
}

#[async_trait]
impl Signer for NodeAccountSigner {
    fn account(&self) -> Address {
        self.account
    }

    async fn approve(&self, _: &TransactionRequest) -> Result<(), SignerError> {
        Ok(())
    }
}

use thiserror::Error;
use tokenbank_common::{abi::AbiError, rpc::RpcError, storage::ProjectionError};

#[derive(Error, Debug)]
pub enum BankError {
    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("No lock contract configured")]
    LocksNotConfigured,

    #[error("Method {0} returned no value")]
    MissingOutput(String),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Abi(#[from] AbiError),

    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

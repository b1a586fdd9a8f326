use crate::crypto::{Address, Hash};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

pub const JSON_RPC_VERSION: &str = "2.0";

/// State-changing call to submit through a signer-bound client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    #[serde(with = "hex::serde")]
    pub data: Vec<u8>,
    #[serde(default)]
    pub value: U256,
}

impl TransactionRequest {
    pub fn new(from: Address, to: Address, data: Vec<u8>) -> Self {
        Self {
            from,
            to,
            data,
            value: U256::zero(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    Success,
    Reverted,
    // Not included in a block yet
    Unknown,
}

/// Block in which a transaction got included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub number: u64,
    pub hash: Hash,
}

/// Answer of the idempotent "receipt by transaction id" query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub transaction_hash: Hash,
    pub status: ReceiptStatus,
    #[serde(default)]
    pub block: Option<BlockInfo>,
    #[serde(default)]
    pub gas_used: Option<U256>,
    #[serde(default)]
    pub contract_address: Option<Address>,
    // Only some nodes report it
    #[serde(default)]
    pub revert_reason: Option<String>,
}

impl Receipt {
    pub fn unknown(transaction_hash: Hash) -> Self {
        Self {
            transaction_hash,
            status: ReceiptStatus::Unknown,
            block: None,
            gas_used: None,
            contract_address: None,
            revert_reason: None,
        }
    }

    pub fn is_included(&self) -> bool {
        self.status != ReceiptStatus::Unknown
    }
}

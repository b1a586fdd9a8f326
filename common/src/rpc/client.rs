use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use log::{debug, trace};
use primitive_types::U256;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};

use super::{
    BlockInfo, LedgerClient, LedgerReader, Receipt, ReceiptStatus, RpcError, TransactionRequest,
    JSON_RPC_VERSION,
};
use crate::{
    crypto::{strip_hex_prefix, Address, Hash},
    storage::{Slot, Word},
};

const LATEST_BLOCK: &str = "latest";

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
}

/// Ledger node reached over HTTP JSON-RPC (`eth_*` namespace).
pub struct JsonRpcClient {
    http: reqwest::Client,
    url: String,
    id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            id: AtomicU64::new(0),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    // Send a request and return the raw `result` value, `Value::Null` included
    async fn request_value(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest {
            jsonrpc: JSON_RPC_VERSION,
            id,
            method,
            params,
        };

        trace!("Sending {} request #{} to {}", method, id, self.url);
        let response = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RpcError::Transport(format!(
                "HTTP status {} for {}",
                response.status(),
                method
            )));
        }

        let response: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| RpcError::InvalidResponse(e.to_string()))?;

        if let Some(error) = response.error {
            debug!("{} request #{} failed: {} {}", method, id, error.code, error.message);
            return Err(RpcError::from_node(error.code, error.message));
        }

        Ok(response.result.unwrap_or(Value::Null))
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let value = self.request_value(method, params).await?;
        serde_json::from_value(value).map_err(|e| RpcError::InvalidResponse(e.to_string()))
    }
}

fn invalid<E: ToString>(e: E) -> RpcError {
    RpcError::InvalidResponse(e.to_string())
}

// Parse a hex quantity such as `0x1a`
fn parse_quantity(value: &str) -> Result<U256, RpcError> {
    let digits = strip_hex_prefix(value);
    if digits.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_str_radix(digits, 16).map_err(|_| invalid(format!("invalid quantity '{}'", value)))
}

fn parse_data(value: &str) -> Result<Vec<u8>, RpcError> {
    hex::decode(strip_hex_prefix(value)).map_err(invalid)
}

fn field_str<'a>(object: &'a Value, name: &str) -> Option<&'a str> {
    object.get(name).and_then(Value::as_str)
}

// Decode an `eth_getTransactionReceipt` answer, `null` meaning not included yet
fn parse_receipt(transaction: &Hash, value: &Value) -> Result<Receipt, RpcError> {
    if value.is_null() {
        return Ok(Receipt::unknown(*transaction));
    }

    let status = match field_str(value, "status") {
        Some(status) if parse_quantity(status)?.is_zero() => ReceiptStatus::Reverted,
        Some(_) => ReceiptStatus::Success,
        // Pre-Byzantium receipts carry no status, inclusion means success
        None => ReceiptStatus::Success,
    };

    let block = match (field_str(value, "blockNumber"), field_str(value, "blockHash")) {
        (Some(number), Some(hash)) => Some(BlockInfo {
            number: parse_quantity(number)?.low_u64(),
            hash: hash.parse().map_err(invalid)?,
        }),
        _ => None,
    };

    let gas_used = field_str(value, "gasUsed").map(parse_quantity).transpose()?;
    let contract_address = field_str(value, "contractAddress")
        .map(|address| address.parse::<Address>().map_err(invalid))
        .transpose()?;

    let transaction_hash = match field_str(value, "transactionHash") {
        Some(hash) => hash.parse().map_err(invalid)?,
        None => *transaction,
    };

    Ok(Receipt {
        transaction_hash,
        status,
        block,
        gas_used,
        contract_address,
        revert_reason: field_str(value, "revertReason").map(str::to_owned),
    })
}

fn transaction_params(request: &TransactionRequest) -> Value {
    json!([{
        "from": request.from.to_hex(),
        "to": request.to.to_hex(),
        "data": format!("0x{}", hex::encode(&request.data)),
        "value": format!("0x{:x}", request.value),
    }])
}

#[async_trait]
impl LedgerReader for JsonRpcClient {
    async fn get_storage_at(&self, address: &Address, slot: Slot) -> Result<Word, RpcError> {
        let value: String = self
            .request(
                "eth_getStorageAt",
                json!([address.to_hex(), slot.to_hex(), LATEST_BLOCK]),
            )
            .await?;
        // Some nodes trim leading zeros, read it as a quantity
        parse_quantity(&value).map(Word::from_u256)
    }

    async fn call_raw(&self, address: &Address, data: Vec<u8>) -> Result<Vec<u8>, RpcError> {
        let value: String = self
            .request(
                "eth_call",
                json!([
                    { "to": address.to_hex(), "data": format!("0x{}", hex::encode(data)) },
                    LATEST_BLOCK
                ]),
            )
            .await?;
        parse_data(&value)
    }

    async fn get_receipt(&self, transaction: &Hash) -> Result<Receipt, RpcError> {
        let value = self
            .request_value("eth_getTransactionReceipt", json!([transaction.to_hex()]))
            .await?;
        parse_receipt(transaction, &value)
    }
}

#[async_trait]
impl LedgerClient for JsonRpcClient {
    async fn send_transaction(&self, request: &TransactionRequest) -> Result<Hash, RpcError> {
        let value: String = self
            .request("eth_sendTransaction", transaction_params(request))
            .await?;
        value.parse().map_err(invalid)
    }
}

// In-memory token + bank ledger used by the integration tests
#![allow(dead_code)]

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use primitive_types::U256;
use tokenbank_common::{
    crypto::{keccak256, Address, Hash},
    rpc::{LedgerClient, LedgerReader, Receipt, ReceiptStatus, RpcError, TransactionRequest},
    storage::{Slot, Word},
};
use tokenbank_wallet::{
    bank::{BankMethods, TokenBank},
    pipeline::{ConfirmationConfig, TransactionPipeline},
    signer::{Signer, SignerError},
};
use tokio::sync::Mutex;

pub const TOKEN: Address = Address::new([0x70; 20]);
pub const BANK: Address = Address::new([0xba; 20]);
pub const LOCKS: Address = Address::new([0x10; 20]);
pub const ALICE: Address = Address::new([0xa1; 20]);

pub fn tokens(amount: u64) -> U256 {
    U256::from(amount) * U256::exp10(18)
}

pub fn confirmation() -> ConfirmationConfig {
    ConfirmationConfig {
        poll_interval: Duration::from_secs(2),
        timeout: Duration::from_secs(60),
        max_poll_errors: 3,
    }
}

pub fn token_bank() -> TokenBank {
    TokenBank::new(TOKEN, BANK, TransactionPipeline::new(confirmation()))
}

#[derive(Default)]
pub struct State {
    pub balances: HashMap<Address, U256>,
    pub allowances: HashMap<(Address, Address), U256>,
    pub deposits: HashMap<Address, U256>,
    pub storage: HashMap<(Address, Slot), Word>,
    pub sent: Vec<TransactionRequest>,
    // Receipts and how many more polls answer "unknown"
    receipts: HashMap<Hash, (u32, Receipt)>,
    // Polls answering "unknown" after each submission
    pub inclusion_polls: u32,
    // Never include anything
    pub hold_receipts: bool,
    pub revert_approvals: bool,
}

#[derive(Default)]
pub struct InMemoryLedger {
    pub state: Mutex<State>,
    methods: BankMethods,
}

fn word_arg(data: &[u8], index: usize) -> U256 {
    let start = 4 + index * 32;
    U256::from_big_endian(&data[start..start + 32])
}

fn address_arg(data: &[u8], index: usize) -> Address {
    Address::from_u256(word_arg(data, index))
}

fn encode_uint(value: U256) -> Vec<u8> {
    value.to_big_endian().to_vec()
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fund(&self, account: Address, amount: U256) {
        self.state.lock().await.balances.insert(account, amount);
    }

    pub async fn set_allowance(&self, owner: Address, spender: Address, amount: U256) {
        self.state
            .lock()
            .await
            .allowances
            .insert((owner, spender), amount);
    }

    pub async fn set_word(&self, contract: Address, slot: Slot, word: Word) {
        self.state.lock().await.storage.insert((contract, slot), word);
    }

    pub async fn sent(&self) -> Vec<TransactionRequest> {
        self.state.lock().await.sent.clone()
    }

    // Apply a transaction, returning the revert reason if it fails
    fn execute(&self, state: &mut State, request: &TransactionRequest) -> Option<String> {
        let selector = &request.data[..4];
        let from = request.from;

        if request.to == TOKEN && selector == self.methods.approve.selector() {
            if state.revert_approvals {
                return Some("approvals paused".into());
            }
            let spender = address_arg(&request.data, 0);
            state
                .allowances
                .insert((from, spender), word_arg(&request.data, 1));
            return None;
        }

        if request.to == BANK && selector == self.methods.deposit.selector() {
            let amount = word_arg(&request.data, 0);
            let allowance = state.allowances.get(&(from, BANK)).copied().unwrap_or_default();
            if allowance < amount {
                return Some("ERC20: insufficient allowance".into());
            }
            let balance = state.balances.get(&from).copied().unwrap_or_default();
            if balance < amount {
                return Some("ERC20: transfer amount exceeds balance".into());
            }
            state.allowances.insert((from, BANK), allowance - amount);
            state.balances.insert(from, balance - amount);
            *state.deposits.entry(from).or_default() += amount;
            return None;
        }

        if request.to == BANK && selector == self.methods.withdraw.selector() {
            let amount = word_arg(&request.data, 0);
            let deposited = state.deposits.get(&from).copied().unwrap_or_default();
            if deposited < amount {
                return Some("insufficient bank balance".into());
            }
            state.deposits.insert(from, deposited - amount);
            *state.balances.entry(from).or_default() += amount;
            return None;
        }

        Some("unknown method".into())
    }
}

#[async_trait]
impl LedgerReader for InMemoryLedger {
    async fn get_storage_at(&self, address: &Address, slot: Slot) -> Result<Word, RpcError> {
        let state = self.state.lock().await;
        Ok(state.storage.get(&(*address, slot)).copied().unwrap_or_default())
    }

    async fn call_raw(&self, address: &Address, data: Vec<u8>) -> Result<Vec<u8>, RpcError> {
        let state = self.state.lock().await;
        let selector = &data[..4];

        let value = if *address == TOKEN && selector == self.methods.balance_of.selector() {
            state.balances.get(&address_arg(&data, 0)).copied()
        } else if *address == TOKEN && selector == self.methods.allowance.selector() {
            state
                .allowances
                .get(&(address_arg(&data, 0), address_arg(&data, 1)))
                .copied()
        } else if *address == BANK && selector == self.methods.balances.selector() {
            state.deposits.get(&address_arg(&data, 0)).copied()
        } else {
            return Err(RpcError::Node {
                code: -32000,
                message: "execution reverted".into(),
            });
        };

        Ok(encode_uint(value.unwrap_or_default()))
    }

    async fn get_receipt(&self, transaction: &Hash) -> Result<Receipt, RpcError> {
        let mut state = self.state.lock().await;
        if state.hold_receipts {
            return Ok(Receipt::unknown(*transaction));
        }

        match state.receipts.get_mut(transaction) {
            Some((polls, _)) if *polls > 0 => {
                *polls -= 1;
                Ok(Receipt::unknown(*transaction))
            }
            Some((_, receipt)) => Ok(receipt.clone()),
            None => Ok(Receipt::unknown(*transaction)),
        }
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn send_transaction(&self, request: &TransactionRequest) -> Result<Hash, RpcError> {
        let mut state = self.state.lock().await;
        state.sent.push(request.clone());
        let hash = keccak256(&(state.sent.len() as u64).to_be_bytes());

        let reason = self.execute(&mut state, request);
        let mut receipt = Receipt::unknown(hash);
        receipt.status = if reason.is_some() {
            ReceiptStatus::Reverted
        } else {
            ReceiptStatus::Success
        };
        receipt.revert_reason = reason;

        let polls = state.inclusion_polls;
        state.receipts.insert(hash, (polls, receipt));
        Ok(hash)
    }
}

pub struct DecliningSigner(pub Address);

#[async_trait]
impl Signer for DecliningSigner {
    fn account(&self) -> Address {
        self.0
    }

    async fn approve(&self, _: &TransactionRequest) -> Result<(), SignerError> {
        Err(SignerError::Rejected("user declined".into()))
    }
}

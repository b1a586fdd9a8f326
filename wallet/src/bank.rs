use std::ops::Range;

use log::{debug, info};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use tokenbank_common::{
    abi::{AbiType, AbiValue, MethodDescriptor},
    config::{DEFAULT_MAX_ARRAY_ELEMENTS, DEFAULT_READ_CONCURRENCY},
    crypto::Address,
    rpc::{LedgerClient, LedgerReader},
    storage::{LockRecord, ProjectionError, StorageProjector, StoredElement},
};

use crate::{
    error::BankError,
    pipeline::{PipelineRun, PipelineStep, TransactionPipeline},
    signer::Signer,
};

fn default_approve() -> MethodDescriptor {
    MethodDescriptor::new(
        "approve",
        vec![AbiType::Address, AbiType::Uint(256)],
        vec![AbiType::Bool],
    )
}

fn default_allowance() -> MethodDescriptor {
    MethodDescriptor::new(
        "allowance",
        vec![AbiType::Address, AbiType::Address],
        vec![AbiType::Uint(256)],
    )
}

fn default_balance_of() -> MethodDescriptor {
    MethodDescriptor::new("balanceOf", vec![AbiType::Address], vec![AbiType::Uint(256)])
}

fn default_balances() -> MethodDescriptor {
    MethodDescriptor::new("balances", vec![AbiType::Address], vec![AbiType::Uint(256)])
}

fn default_deposit() -> MethodDescriptor {
    MethodDescriptor::new("deposit", vec![AbiType::Uint(256)], vec![])
}

fn default_withdraw() -> MethodDescriptor {
    MethodDescriptor::new("withdraw", vec![AbiType::Uint(256)], vec![])
}

/// Method descriptors of the token and bank contracts.
/// Loaded from configuration so a different ABI only needs a new config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankMethods {
    // Token side
    #[serde(default = "default_approve")]
    pub approve: MethodDescriptor,
    #[serde(default = "default_allowance")]
    pub allowance: MethodDescriptor,
    #[serde(default = "default_balance_of")]
    pub balance_of: MethodDescriptor,
    // Bank side
    #[serde(default = "default_balances")]
    pub balances: MethodDescriptor,
    #[serde(default = "default_deposit")]
    pub deposit: MethodDescriptor,
    #[serde(default = "default_withdraw")]
    pub withdraw: MethodDescriptor,
}

impl Default for BankMethods {
    fn default() -> Self {
        Self {
            approve: default_approve(),
            allowance: default_allowance(),
            balance_of: default_balance_of(),
            balances: default_balances(),
            deposit: default_deposit(),
            withdraw: default_withdraw(),
        }
    }
}

// One element of the lock array, `None` for an unwritten slot
pub type LockEntry = (u64, Result<Option<LockRecord>, ProjectionError>);

/// Deposit/withdraw flows over a fungible token and the bank holding it.
pub struct TokenBank {
    token: Address,
    bank: Address,
    methods: BankMethods,
    pipeline: TransactionPipeline,
    // Lock array of the locking contract, when configured
    locks: Option<StorageProjector>,
    read_concurrency: usize,
    max_elements: u64,
}

impl TokenBank {
    pub fn new(token: Address, bank: Address, pipeline: TransactionPipeline) -> Self {
        Self {
            token,
            bank,
            methods: BankMethods::default(),
            pipeline,
            locks: None,
            read_concurrency: DEFAULT_READ_CONCURRENCY,
            max_elements: DEFAULT_MAX_ARRAY_ELEMENTS,
        }
    }

    pub fn with_methods(mut self, methods: BankMethods) -> Self {
        self.methods = methods;
        self
    }

    pub fn with_locks(mut self, locks: StorageProjector) -> Self {
        self.locks = Some(locks);
        self
    }

    pub fn with_read_concurrency(mut self, concurrency: usize) -> Self {
        self.read_concurrency = concurrency.max(1);
        self
    }

    // Largest number of lock entries read in a single listing
    pub fn with_max_elements(mut self, max_elements: u64) -> Self {
        self.max_elements = max_elements;
        self
    }

    pub fn token(&self) -> &Address {
        &self.token
    }

    pub fn bank(&self) -> &Address {
        &self.bank
    }

    pub fn methods(&self) -> &BankMethods {
        &self.methods
    }

    async fn read_uint<C: LedgerReader + ?Sized>(
        &self,
        client: &C,
        contract: &Address,
        method: &MethodDescriptor,
        args: &[AbiValue],
    ) -> Result<U256, BankError> {
        let output = client.call(contract, method, args).await?;
        let value = output
            .first()
            .ok_or_else(|| BankError::MissingOutput(method.signature()))?;
        Ok(value.to_uint()?)
    }

    /// Token balance held by `owner` outside the bank.
    pub async fn wallet_balance<C: LedgerReader + ?Sized>(
        &self,
        client: &C,
        owner: &Address,
    ) -> Result<U256, BankError> {
        self.read_uint(client, &self.token, &self.methods.balance_of, &[(*owner).into()])
            .await
    }

    /// Amount credited to `owner` by the bank.
    pub async fn bank_balance<C: LedgerReader + ?Sized>(
        &self,
        client: &C,
        owner: &Address,
    ) -> Result<U256, BankError> {
        self.read_uint(client, &self.bank, &self.methods.balances, &[(*owner).into()])
            .await
    }

    /// Amount the bank may currently move out of `owner`'s token balance.
    pub async fn allowance<C: LedgerReader + ?Sized>(
        &self,
        client: &C,
        owner: &Address,
    ) -> Result<U256, BankError> {
        self.read_uint(
            client,
            &self.token,
            &self.methods.allowance,
            &[(*owner).into(), self.bank.into()],
        )
        .await
    }

    pub fn approve_step(&self, amount: U256) -> PipelineStep {
        PipelineStep::new(
            self.token,
            self.methods.approve.clone(),
            vec![self.bank.into(), amount.into()],
        )
    }

    pub fn deposit_step(&self, amount: U256) -> PipelineStep {
        PipelineStep::new(self.bank, self.methods.deposit.clone(), vec![amount.into()])
    }

    pub fn withdraw_step(&self, amount: U256) -> PipelineStep {
        PipelineStep::new(self.bank, self.methods.withdraw.clone(), vec![amount.into()])
    }

    /// Steps of a deposit: `approve` then `deposit`.
    /// `approve` is left out when the current allowance already covers `amount`.
    pub async fn deposit_steps<C: LedgerReader + ?Sized>(
        &self,
        client: &C,
        owner: &Address,
        amount: U256,
    ) -> Result<Vec<PipelineStep>, BankError> {
        if amount.is_zero() {
            return Err(BankError::InvalidAmount);
        }

        let allowance = self.allowance(client, owner).await?;
        let mut steps = Vec::with_capacity(2);
        if allowance < amount {
            steps.push(self.approve_step(amount));
        } else {
            debug!("Allowance of {} covers {}, skipping approve", allowance, amount);
        }
        steps.push(self.deposit_step(amount));
        Ok(steps)
    }

    pub async fn deposit<C, S>(&self, client: &C, signer: &S, amount: U256) -> Result<PipelineRun, BankError>
    where
        C: LedgerClient + ?Sized,
        S: Signer + ?Sized,
    {
        let steps = self.deposit_steps(client, &signer.account(), amount).await?;
        info!("Depositing {} into {} in {} step(s)", amount, self.bank, steps.len());
        Ok(self.pipeline.run(client, signer, steps).await)
    }

    pub async fn withdraw<C, S>(&self, client: &C, signer: &S, amount: U256) -> Result<PipelineRun, BankError>
    where
        C: LedgerClient + ?Sized,
        S: Signer + ?Sized,
    {
        if amount.is_zero() {
            return Err(BankError::InvalidAmount);
        }

        info!("Withdrawing {} from {}", amount, self.bank);
        Ok(self
            .pipeline
            .run(client, signer, vec![self.withdraw_step(amount)])
            .await)
    }

    /// Read lock entries straight from storage, `range` defaulting to the whole array.
    pub async fn locks<C: LedgerReader + ?Sized>(
        &self,
        client: &C,
        range: Option<Range<u64>>,
    ) -> Result<Vec<LockEntry>, BankError> {
        let projector = self.locks.as_ref().ok_or(BankError::LocksNotConfigured)?;
        read_locks(
            client,
            projector,
            range,
            self.read_concurrency,
            self.max_elements,
        )
        .await
    }
}

/// Project lock array elements into `LockRecord`s.
///
/// Only a failure to read the array length, or a listing longer than
/// `max_elements`, aborts the whole read. Every element otherwise carries
/// its own result.
pub async fn read_locks<C: LedgerReader + ?Sized>(
    client: &C,
    projector: &StorageProjector,
    range: Option<Range<u64>>,
    concurrency: usize,
    max_elements: u64,
) -> Result<Vec<LockEntry>, BankError> {
    let elements = match range {
        Some(range) => {
            let length = range.end.saturating_sub(range.start);
            if length > max_elements {
                return Err(ProjectionError::TooManyElements {
                    length,
                    max: max_elements,
                }
                .into());
            }
            projector.read_range(client, range, concurrency).await
        }
        None => projector.read_all(client, concurrency, max_elements).await?,
    };

    Ok(elements
        .into_iter()
        .map(|(index, element)| {
            let lock = element.and_then(|element| match element {
                StoredElement::Record(record) => LockRecord::try_from(&record)
                    .map(Some)
                    .map_err(ProjectionError::from),
                StoredElement::Empty => Ok(None),
            });
            (index, lock)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_selectors() {
        let methods = BankMethods::default();
        assert_eq!(methods.approve.selector(), [0x09, 0x5e, 0xa7, 0xb3]);
        assert_eq!(methods.balance_of.selector(), [0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(methods.allowance.selector(), [0xdd, 0x62, 0xed, 0x3e]);
    }

    #[test]
    fn test_methods_from_partial_json() {
        let methods: BankMethods = serde_json::from_str(
            r#"{ "deposit": { "name": "depositTokens", "inputs": ["uint256"] } }"#,
        )
        .unwrap();
        assert_eq!(methods.deposit.signature(), "depositTokens(uint256)");
        assert_eq!(methods.withdraw, default_withdraw());
    }

    #[test]
    fn test_step_targets() {
        let token = Address::new([0x01; 20]);
        let bank_address = Address::new([0x02; 20]);
        let bank = TokenBank::new(token, bank_address, TransactionPipeline::default());

        let approve = bank.approve_step(U256::from(7));
        assert_eq!(approve.target, token);
        assert_eq!(approve.args, vec![AbiValue::Address(bank_address), AbiValue::Uint(U256::from(7))]);

        assert_eq!(bank.deposit_step(U256::one()).target, bank_address);
        assert_eq!(bank.withdraw_step(U256::one()).method.name, "withdraw");
    }
}

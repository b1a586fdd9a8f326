use crate::crypto::Address;
use lazy_static::lazy_static;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

use super::{DecodedRecord, FieldSpec, FieldValue, LayoutError, StructLayout, Word};

pub const LOCK_USER_FIELD: &str = "user";
pub const LOCK_START_TIME_FIELD: &str = "start_time";
pub const LOCK_AMOUNT_FIELD: &str = "amount";
pub const LOCK_START_TIME_BITS: usize = 96;

lazy_static! {
    // struct LockInfo { address user; uint96 startTime; uint256 amount; }
    // word 0: [ startTime (96) | user (160) ], word 1: [ amount (256) ]
    pub static ref LOCK_LAYOUT: StructLayout = StructLayout::new(vec![
        FieldSpec::address(LOCK_USER_FIELD),
        FieldSpec::uint(LOCK_START_TIME_FIELD, LOCK_START_TIME_BITS),
        FieldSpec::uint(LOCK_AMOUNT_FIELD, 256),
    ])
    .expect("lock layout tiles two whole words");
}

/// One entry of the `_locks` array kept by the locking contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    pub user: Address,
    // uint96 on chain
    pub start_time: u128,
    pub amount: U256,
}

impl LockRecord {
    pub fn layout() -> &'static StructLayout {
        &LOCK_LAYOUT
    }

    pub fn to_record(&self) -> DecodedRecord {
        let mut record = DecodedRecord::with_capacity(3);
        record.insert(LOCK_USER_FIELD, FieldValue::Address(self.user));
        record.insert(
            LOCK_START_TIME_FIELD,
            FieldValue::Uint(U256::from(self.start_time)),
        );
        record.insert(LOCK_AMOUNT_FIELD, FieldValue::Uint(self.amount));
        record
    }

    /// Pack into the two storage words the contract would write.
    pub fn encode_words(&self) -> Result<Vec<Word>, LayoutError> {
        LOCK_LAYOUT.encode(&self.to_record())
    }
}

impl TryFrom<&DecodedRecord> for LockRecord {
    type Error = LayoutError;

    fn try_from(record: &DecodedRecord) -> Result<Self, Self::Error> {
        let user = record
            .address(LOCK_USER_FIELD)
            .ok_or_else(|| LayoutError::MissingField(LOCK_USER_FIELD.to_string()))?;
        let start_time = record
            .uint(LOCK_START_TIME_FIELD)
            .ok_or_else(|| LayoutError::MissingField(LOCK_START_TIME_FIELD.to_string()))?;
        let amount = record
            .uint(LOCK_AMOUNT_FIELD)
            .ok_or_else(|| LayoutError::MissingField(LOCK_AMOUNT_FIELD.to_string()))?;

        if start_time.bits() > LOCK_START_TIME_BITS {
            return Err(LayoutError::ValueTooWide {
                field: LOCK_START_TIME_FIELD.to_string(),
                bits: LOCK_START_TIME_BITS,
            });
        }

        Ok(Self {
            user,
            start_time: start_time.low_u128(),
            amount,
        })
    }
}

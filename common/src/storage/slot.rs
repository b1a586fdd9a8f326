use crate::crypto::keccak256;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Error, Formatter};

use super::WORD_SIZE;

/// Address of one storage word on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Slot(U256);

impl Slot {
    pub const fn new(value: U256) -> Self {
        Slot(value)
    }

    pub fn value(&self) -> U256 {
        self.0
    }

    // 32-byte big-endian encoding, the form hashed and sent on the wire
    pub fn to_bytes(&self) -> [u8; WORD_SIZE] {
        self.0.to_big_endian()
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    // Slot `offset` words after this one, wrapping at 2^256 like the ledger does
    pub fn wrapping_add(&self, offset: U256) -> Slot {
        Slot(self.0.overflowing_add(offset).0)
    }
}

impl From<u64> for Slot {
    fn from(value: u64) -> Self {
        Slot(U256::from(value))
    }
}

impl From<U256> for Slot {
    fn from(value: U256) -> Self {
        Slot(value)
    }
}

impl Display for Slot {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}", self.to_hex())
    }
}

/// First slot of a dynamic array's data: `keccak256(encode32(declaration_slot))`.
pub fn base_slot(declaration_slot: Slot) -> Slot {
    Slot(keccak256(&declaration_slot.to_bytes()).to_u256())
}

/// First slot of element `index`: `base + index * words_per_element`.
///
/// Arithmetic wraps modulo 2^256, matching the ledger's own integer semantics.
/// Real arrays never get close to that boundary, so no error is raised.
pub fn element_slot(base: Slot, index: u64, words_per_element: u64) -> Slot {
    let (offset, _) = U256::from(index).overflowing_mul(U256::from(words_per_element));
    base.wrapping_add(offset)
}

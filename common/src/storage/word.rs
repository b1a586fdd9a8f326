use crate::crypto::{decode_fixed_hex, CryptoError};
use primitive_types::U256;
use serde::de::Error as SerdeError;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Debug, Display, Error, Formatter},
    str::FromStr,
};

pub const WORD_SIZE: usize = 32;
pub const WORD_BITS: usize = WORD_SIZE * 8;

/// Raw 32-byte value stored at a slot, big-endian.
///
/// An unwritten slot reads back as the zero word.
#[derive(Eq, PartialEq, Clone, Copy, Hash, Default)]
pub struct Word([u8; WORD_SIZE]);

// Mask keeping the `bits` least significant bits
fn low_mask(bits: usize) -> U256 {
    if bits >= WORD_BITS {
        U256::max_value()
    } else {
        (U256::one() << bits) - U256::one()
    }
}

impl Word {
    pub const fn new(bytes: [u8; WORD_SIZE]) -> Self {
        Word(bytes)
    }

    pub const fn zero() -> Self {
        Word([0; WORD_SIZE])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; WORD_SIZE]
    }

    pub fn as_bytes(&self) -> &[u8; WORD_SIZE] {
        &self.0
    }

    pub fn to_u256(&self) -> U256 {
        U256::from_big_endian(&self.0)
    }

    pub fn from_u256(value: U256) -> Self {
        Word(value.to_big_endian())
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Extract `bits` bits located `offset` bits above the least significant bit.
    ///
    /// The lower neighbour is shifted out first, then the field's own width is masked.
    pub fn extract(&self, offset: usize, bits: usize) -> U256 {
        let shifted = if offset == 0 {
            self.to_u256()
        } else {
            self.to_u256() >> offset
        };
        shifted & low_mask(bits)
    }

    /// Return a copy of this word with `bits` bits at `offset` replaced by `value`.
    ///
    /// Bits of `value` beyond the field width are discarded.
    pub fn insert(&self, offset: usize, bits: usize, value: U256) -> Word {
        let mask = low_mask(bits) << offset;
        let cleared = self.to_u256() & !mask;
        Word::from_u256(cleared | ((value & low_mask(bits)) << offset))
    }
}

impl From<U256> for Word {
    fn from(value: U256) -> Self {
        Word::from_u256(value)
    }
}

impl FromStr for Word {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed_hex::<WORD_SIZE>(s).map(Word::new)
    }
}

impl Display for Word {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}", self.to_hex())
    }
}

impl Debug for Word {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "Word({})", self.to_hex())
    }
}

impl Serialize for Word {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'a> Deserialize<'a> for Word {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'a>,
    {
        let hex = String::deserialize(deserializer)?;
        Word::from_str(&hex).map_err(SerdeError::custom)
    }
}

// Static ABI encoding
//
// Only the fixed-size types the bank and token contracts use are supported:
// every argument and return value occupies exactly one 32-byte slot.
// Method descriptors are plain configuration values, not generated bindings.

use crate::crypto::{keccak256, Address, ADDRESS_BITS};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter},
    str::FromStr,
};
use thiserror::Error;

pub const SELECTOR_SIZE: usize = 4;
const SLOT_SIZE: usize = 32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error("Unsupported ABI type '{0}'")]
    UnsupportedType(String),

    #[error("Method '{method}' expects {expected} arguments, got {got}")]
    ArityMismatch {
        method: String,
        expected: usize,
        got: usize,
    },

    #[error("Argument {index} should be of type {expected}")]
    TypeMismatch { index: usize, expected: AbiType },

    #[error("Value does not fit in {0}")]
    ValueOutOfRange(AbiType),

    #[error("Expected {expected} bytes of return data, got {got}")]
    InvalidOutputLength { expected: usize, got: usize },

    #[error("Invalid value type")]
    InvalidType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AbiType {
    Address,
    // uint<N>, N multiple of 8 up to 256
    Uint(usize),
    Bool,
    Bytes32,
}

impl AbiType {
    pub fn canonical_name(&self) -> String {
        match self {
            AbiType::Address => "address".to_string(),
            AbiType::Uint(bits) => format!("uint{}", bits),
            AbiType::Bool => "bool".to_string(),
            AbiType::Bytes32 => "bytes32".to_string(),
        }
    }
}

impl Display for AbiType {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "{}", self.canonical_name())
    }
}

impl FromStr for AbiType {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "address" => Ok(AbiType::Address),
            "bool" => Ok(AbiType::Bool),
            "bytes32" => Ok(AbiType::Bytes32),
            // `uint` is an alias of `uint256`
            "uint" => Ok(AbiType::Uint(256)),
            _ => {
                let bits = s
                    .strip_prefix("uint")
                    .and_then(|bits| bits.parse::<usize>().ok())
                    .filter(|bits| *bits > 0 && *bits <= 256 && bits % 8 == 0)
                    .ok_or_else(|| AbiError::UnsupportedType(s.to_string()))?;
                Ok(AbiType::Uint(bits))
            }
        }
    }
}

impl TryFrom<String> for AbiType {
    type Error = AbiError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AbiType> for String {
    fn from(value: AbiType) -> Self {
        value.canonical_name()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AbiValue {
    Address(Address),
    Uint(U256),
    Bool(bool),
    Bytes32([u8; 32]),
}

impl AbiValue {
    pub fn to_address(&self) -> Result<Address, AbiError> {
        match self {
            AbiValue::Address(address) => Ok(*address),
            _ => Err(AbiError::InvalidType),
        }
    }

    pub fn to_uint(&self) -> Result<U256, AbiError> {
        match self {
            AbiValue::Uint(value) => Ok(*value),
            _ => Err(AbiError::InvalidType),
        }
    }

    pub fn to_bool(&self) -> Result<bool, AbiError> {
        match self {
            AbiValue::Bool(value) => Ok(*value),
            _ => Err(AbiError::InvalidType),
        }
    }

    // Left-padded 32-byte head encoding, after checking the value matches `ty`
    fn encode(&self, ty: AbiType, index: usize) -> Result<[u8; SLOT_SIZE], AbiError> {
        let word = match (ty, self) {
            (AbiType::Address, AbiValue::Address(address)) => address.to_u256(),
            (AbiType::Uint(bits), AbiValue::Uint(value)) => {
                if value.bits() > bits {
                    return Err(AbiError::ValueOutOfRange(ty));
                }
                *value
            }
            (AbiType::Bool, AbiValue::Bool(value)) => U256::from(*value as u8),
            (AbiType::Bytes32, AbiValue::Bytes32(bytes)) => return Ok(*bytes),
            _ => {
                return Err(AbiError::TypeMismatch {
                    index,
                    expected: ty,
                })
            }
        };
        Ok(word.to_big_endian())
    }

    fn decode(ty: AbiType, slot: &[u8]) -> Result<Self, AbiError> {
        let word = U256::from_big_endian(slot);
        match ty {
            AbiType::Address => {
                if word.bits() > ADDRESS_BITS {
                    return Err(AbiError::ValueOutOfRange(ty));
                }
                Ok(AbiValue::Address(Address::from_u256(word)))
            }
            AbiType::Uint(bits) => {
                if word.bits() > bits {
                    return Err(AbiError::ValueOutOfRange(ty));
                }
                Ok(AbiValue::Uint(word))
            }
            AbiType::Bool => match word.low_u64() {
                0 if word.is_zero() => Ok(AbiValue::Bool(false)),
                1 if word.bits() == 1 => Ok(AbiValue::Bool(true)),
                _ => Err(AbiError::ValueOutOfRange(ty)),
            },
            AbiType::Bytes32 => {
                let mut bytes = [0u8; SLOT_SIZE];
                bytes.copy_from_slice(slot);
                Ok(AbiValue::Bytes32(bytes))
            }
        }
    }
}

impl From<Address> for AbiValue {
    fn from(value: Address) -> Self {
        AbiValue::Address(value)
    }
}

impl From<U256> for AbiValue {
    fn from(value: U256) -> Self {
        AbiValue::Uint(value)
    }
}

impl From<bool> for AbiValue {
    fn from(value: bool) -> Self {
        AbiValue::Bool(value)
    }
}

/// Name and signature of a contract method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    pub inputs: Vec<AbiType>,
    #[serde(default)]
    pub outputs: Vec<AbiType>,
}

impl MethodDescriptor {
    pub fn new<S: Into<String>>(name: S, inputs: Vec<AbiType>, outputs: Vec<AbiType>) -> Self {
        Self {
            name: name.into(),
            inputs,
            outputs,
        }
    }

    // Canonical signature, e.g. `approve(address,uint256)`
    pub fn signature(&self) -> String {
        let inputs: Vec<String> = self.inputs.iter().map(AbiType::canonical_name).collect();
        format!("{}({})", self.name, inputs.join(","))
    }

    /// First four bytes of the Keccak-256 hash of the signature.
    pub fn selector(&self) -> [u8; SELECTOR_SIZE] {
        let hash = keccak256(self.signature().as_bytes());
        let mut selector = [0u8; SELECTOR_SIZE];
        selector.copy_from_slice(&hash.as_bytes()[..SELECTOR_SIZE]);
        selector
    }

    pub fn encode_call(&self, args: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
        if args.len() != self.inputs.len() {
            return Err(AbiError::ArityMismatch {
                method: self.name.clone(),
                expected: self.inputs.len(),
                got: args.len(),
            });
        }

        let mut data = Vec::with_capacity(SELECTOR_SIZE + args.len() * SLOT_SIZE);
        data.extend_from_slice(&self.selector());
        for (index, (ty, arg)) in self.inputs.iter().zip(args.iter()).enumerate() {
            data.extend_from_slice(&arg.encode(*ty, index)?);
        }
        Ok(data)
    }

    pub fn decode_output(&self, data: &[u8]) -> Result<Vec<AbiValue>, AbiError> {
        let expected = self.outputs.len() * SLOT_SIZE;
        // Trailing bytes are tolerated, missing ones are not
        if data.len() < expected {
            return Err(AbiError::InvalidOutputLength {
                expected,
                got: data.len(),
            });
        }

        self.outputs
            .iter()
            .zip(data.chunks_exact(SLOT_SIZE))
            .map(|(ty, slot)| AbiValue::decode(*ty, slot))
            .collect()
    }
}

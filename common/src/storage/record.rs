use crate::crypto::Address;
use indexmap::IndexMap;
use primitive_types::U256;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Address(Address),
    Uint(U256),
    Bool(bool),
    Bytes(Vec<u8>),
}

impl FieldValue {
    pub fn as_address(&self) -> Option<Address> {
        match self {
            FieldValue::Address(address) => Some(*address),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<U256> {
        match self {
            FieldValue::Uint(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// Typed fields of one decoded element, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct DecodedRecord {
    fields: IndexMap<String, FieldValue>,
}

impl DecodedRecord {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: IndexMap::with_capacity(capacity),
        }
    }

    pub fn insert<S: Into<String>>(&mut self, name: S, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn address(&self, name: &str) -> Option<Address> {
        self.get(name).and_then(FieldValue::as_address)
    }

    pub fn uint(&self, name: &str) -> Option<U256> {
        self.get(name).and_then(FieldValue::as_uint)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(FieldValue::as_bool)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }
}

/// Outcome of reading one array element.
///
/// `Empty` is a normal result: the ledger reports unwritten storage as zero,
/// so an element whose every word is zero was never stored. It is kept
/// distinct from a record that happens to hold zero-valued fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "record", rename_all = "snake_case")]
pub enum StoredElement {
    Record(DecodedRecord),
    Empty,
}

impl StoredElement {
    pub fn is_empty(&self) -> bool {
        matches!(self, StoredElement::Empty)
    }

    pub fn as_record(&self) -> Option<&DecodedRecord> {
        match self {
            StoredElement::Record(record) => Some(record),
            StoredElement::Empty => None,
        }
    }

    pub fn into_record(self) -> Option<DecodedRecord> {
        match self {
            StoredElement::Record(record) => Some(record),
            StoredElement::Empty => None,
        }
    }
}

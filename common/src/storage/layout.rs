use crate::crypto::ADDRESS_BITS;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{DecodedRecord, FieldValue, LayoutError, StoredElement, Word, WORD_BITS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Address,
    Uint,
    Bool,
    // Fixed-size byte string (bytes1..bytes32)
    Bytes,
}

/// One declared member of a stored struct, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub bits: usize,
}

impl FieldSpec {
    pub fn new<S: Into<String>>(name: S, kind: FieldKind, bits: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            bits,
        }
    }

    pub fn address<S: Into<String>>(name: S) -> Self {
        Self::new(name, FieldKind::Address, ADDRESS_BITS)
    }

    pub fn uint<S: Into<String>>(name: S, bits: usize) -> Self {
        Self::new(name, FieldKind::Uint, bits)
    }

    pub fn bool<S: Into<String>>(name: S) -> Self {
        Self::new(name, FieldKind::Bool, 8)
    }

    pub fn bytes<S: Into<String>>(name: S, len: usize) -> Self {
        Self::new(name, FieldKind::Bytes, len * 8)
    }

    fn validate(&self) -> Result<(), LayoutError> {
        if self.bits == 0 || self.bits > WORD_BITS || self.bits % 8 != 0 {
            return Err(LayoutError::InvalidWidth {
                field: self.name.clone(),
                bits: self.bits,
            });
        }

        let valid = match self.kind {
            FieldKind::Address => self.bits == ADDRESS_BITS,
            FieldKind::Bool => self.bits == 8,
            FieldKind::Uint | FieldKind::Bytes => true,
        };

        if !valid {
            return Err(LayoutError::KindWidthMismatch {
                field: self.name.clone(),
                kind: self.kind,
                bits: self.bits,
            });
        }

        Ok(())
    }

    // Turn the raw bits extracted from a word into a typed value
    fn to_value(&self, raw: U256) -> FieldValue {
        match self.kind {
            FieldKind::Address => FieldValue::Address(crate::crypto::Address::from_u256(raw)),
            FieldKind::Uint => FieldValue::Uint(raw),
            FieldKind::Bool => FieldValue::Bool(!raw.is_zero()),
            FieldKind::Bytes => {
                let len = self.bits / 8;
                let bytes = raw.to_big_endian();
                FieldValue::Bytes(bytes[bytes.len() - len..].to_vec())
            }
        }
    }

    // Inverse of `to_value`, rejecting values of the wrong kind or width
    fn to_raw(&self, value: &FieldValue) -> Result<U256, LayoutError> {
        let mismatch = || LayoutError::ValueKindMismatch {
            field: self.name.clone(),
            expected: self.kind,
        };
        let too_wide = || LayoutError::ValueTooWide {
            field: self.name.clone(),
            bits: self.bits,
        };

        match (self.kind, value) {
            (FieldKind::Address, FieldValue::Address(address)) => Ok(address.to_u256()),
            (FieldKind::Uint, FieldValue::Uint(value)) => {
                if value.bits() > self.bits {
                    return Err(too_wide());
                }
                Ok(*value)
            }
            (FieldKind::Bool, FieldValue::Bool(value)) => Ok(U256::from(*value as u8)),
            (FieldKind::Bytes, FieldValue::Bytes(bytes)) => {
                if bytes.len() != self.bits / 8 {
                    return Err(too_wide());
                }
                Ok(U256::from_big_endian(bytes))
            }
            _ => Err(mismatch()),
        }
    }
}

/// Where a field lives inside an element: which word, and how many bits
/// above that word's least significant bit it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPosition {
    pub word: usize,
    pub offset: usize,
    pub bits: usize,
}

/// Bit-packing descriptor for one array element.
///
/// Fields are packed right-to-left in declaration order; a field that does
/// not fit in what remains of the current word starts a new word. Every word
/// must end up fully used.
///
/// This is stricter than only requiring the total width to be a multiple of
/// 256 bits: `{uint128, uint256, uint128}` adds up to two words but leaves
/// holes once the middle field moves to its own word, so it is rejected with
/// `PartialWord`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FieldSpec>", into = "Vec<FieldSpec>")]
pub struct StructLayout {
    fields: Vec<FieldSpec>,
    positions: Vec<FieldPosition>,
    words: usize,
}

impl StructLayout {
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self, LayoutError> {
        if fields.is_empty() {
            return Err(LayoutError::Empty);
        }

        let mut names = HashSet::with_capacity(fields.len());
        let mut positions = Vec::with_capacity(fields.len());
        let mut word = 0;
        let mut used = 0;

        for field in fields.iter() {
            field.validate()?;
            if !names.insert(field.name.as_str()) {
                return Err(LayoutError::DuplicateField(field.name.clone()));
            }

            if used + field.bits > WORD_BITS {
                if used != WORD_BITS {
                    return Err(LayoutError::PartialWord { word, used });
                }
                word += 1;
                used = 0;
            }

            positions.push(FieldPosition {
                word,
                offset: used,
                bits: field.bits,
            });
            used += field.bits;
        }

        if used != WORD_BITS {
            return Err(LayoutError::PartialWord { word, used });
        }

        Ok(Self {
            fields,
            positions,
            words: word + 1,
        })
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn positions(&self) -> &[FieldPosition] {
        &self.positions
    }

    pub fn field(&self, name: &str) -> Option<(&FieldSpec, FieldPosition)> {
        self.fields
            .iter()
            .zip(self.positions.iter())
            .find(|(field, _)| field.name == name)
            .map(|(field, position)| (field, *position))
    }

    pub fn words_per_element(&self) -> usize {
        self.words
    }

    /// Decode the words of one element.
    ///
    /// All-zero words mean the element was never written and yield
    /// `StoredElement::Empty`, which is not an error.
    pub fn decode(&self, words: &[Word]) -> Result<StoredElement, LayoutError> {
        if words.len() != self.words {
            return Err(LayoutError::WordCount {
                expected: self.words,
                got: words.len(),
            });
        }

        if words.iter().all(Word::is_zero) {
            return Ok(StoredElement::Empty);
        }

        let mut record = DecodedRecord::with_capacity(self.fields.len());
        for (field, position) in self.fields.iter().zip(self.positions.iter()) {
            let raw = words[position.word].extract(position.offset, position.bits);
            record.insert(field.name.clone(), field.to_value(raw));
        }

        Ok(StoredElement::Record(record))
    }

    /// Pack a record into the words it occupies in storage.
    pub fn encode(&self, record: &DecodedRecord) -> Result<Vec<Word>, LayoutError> {
        let mut words = vec![Word::zero(); self.words];
        for (field, position) in self.fields.iter().zip(self.positions.iter()) {
            let value = record
                .get(&field.name)
                .ok_or_else(|| LayoutError::MissingField(field.name.clone()))?;
            let raw = field.to_raw(value)?;
            words[position.word] = words[position.word].insert(position.offset, position.bits, raw);
        }

        Ok(words)
    }
}

impl TryFrom<Vec<FieldSpec>> for StructLayout {
    type Error = LayoutError;

    fn try_from(fields: Vec<FieldSpec>) -> Result<Self, Self::Error> {
        StructLayout::new(fields)
    }
}

impl From<StructLayout> for Vec<FieldSpec> {
    fn from(layout: StructLayout) -> Self {
        layout.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Address;

    fn lock_layout() -> StructLayout {
        StructLayout::new(vec![
            FieldSpec::address("user"),
            FieldSpec::uint("start_time", 96),
            FieldSpec::uint("amount", 256),
        ])
        .unwrap()
    }

    #[test]
    fn test_lock_layout_spans_two_words() {
        let layout = lock_layout();
        assert_eq!(layout.words_per_element(), 2);
        assert_eq!(
            layout.positions(),
            &[
                FieldPosition { word: 0, offset: 0, bits: 160 },
                FieldPosition { word: 0, offset: 160, bits: 96 },
                FieldPosition { word: 1, offset: 0, bits: 256 },
            ]
        );
    }

    #[test]
    fn test_partial_word_is_rejected() {
        let err = StructLayout::new(vec![FieldSpec::address("user"), FieldSpec::bool("active")])
            .unwrap_err();
        assert_eq!(err, LayoutError::PartialWord { word: 0, used: 168 });
    }

    #[test]
    fn test_gap_before_new_word_is_rejected() {
        // 200 bits leave a 56-bit hole once the 104-bit field moves to the next word
        let err = StructLayout::new(vec![
            FieldSpec::uint("a", 200),
            FieldSpec::uint("b", 104),
            FieldSpec::uint("c", 152),
        ])
        .unwrap_err();
        assert_eq!(err, LayoutError::PartialWord { word: 0, used: 200 });
    }

    #[test]
    fn test_word_multiple_total_with_holes_is_rejected() {
        // 512 bits in total, but the full-width field cannot share the first word
        let err = StructLayout::new(vec![
            FieldSpec::uint("a", 128),
            FieldSpec::uint("b", 256),
            FieldSpec::uint("c", 128),
        ])
        .unwrap_err();
        assert_eq!(err, LayoutError::PartialWord { word: 0, used: 128 });
    }

    #[test]
    fn test_invalid_fields_are_rejected() {
        assert_eq!(StructLayout::new(vec![]).unwrap_err(), LayoutError::Empty);
        assert!(matches!(
            StructLayout::new(vec![FieldSpec::uint("x", 0)]),
            Err(LayoutError::InvalidWidth { .. })
        ));
        assert!(matches!(
            StructLayout::new(vec![FieldSpec::uint("x", 257)]),
            Err(LayoutError::InvalidWidth { .. })
        ));
        assert!(matches!(
            StructLayout::new(vec![FieldSpec::new("x", FieldKind::Address, 256)]),
            Err(LayoutError::KindWidthMismatch { .. })
        ));
        assert_eq!(
            StructLayout::new(vec![FieldSpec::uint("x", 128), FieldSpec::uint("x", 128)])
                .unwrap_err(),
            LayoutError::DuplicateField("x".to_string())
        );
    }

    #[test]
    fn test_decode_packed_address_and_timestamp() {
        let layout = StructLayout::new(vec![
            FieldSpec::address("user"),
            FieldSpec::uint("start_time", 96),
        ])
        .unwrap();

        let user: Address = "0xb726a48ab23bc4c40fba9d99f034b4132e0f551e".parse().unwrap();
        let start_time = U256::from(1_700_000_000u64);
        let word = Word::from_u256((start_time << 160) | user.to_u256());

        let record = layout.decode(&[word]).unwrap().into_record().unwrap();
        assert_eq!(record.address("user"), Some(user));
        assert_eq!(record.uint("start_time"), Some(start_time));
    }

    #[test]
    fn test_decode_all_zero_is_empty() {
        let layout = lock_layout();
        let element = layout.decode(&[Word::zero(), Word::zero()]).unwrap();
        assert_eq!(element, StoredElement::Empty);
    }

    #[test]
    fn test_decode_zero_fields_with_one_nonzero_word_is_record() {
        let layout = lock_layout();
        let element = layout
            .decode(&[Word::zero(), Word::from_u256(U256::from(5))])
            .unwrap();
        let record = element.into_record().unwrap();
        assert_eq!(record.address("user"), Some(Address::zero()));
        assert_eq!(record.uint("start_time"), Some(U256::zero()));
        assert_eq!(record.uint("amount"), Some(U256::from(5)));
    }

    #[test]
    fn test_decode_rejects_wrong_word_count() {
        let err = lock_layout().decode(&[Word::zero()]).unwrap_err();
        assert_eq!(err, LayoutError::WordCount { expected: 2, got: 1 });
    }

    #[test]
    fn test_encode_rejects_too_wide_value() {
        let layout = lock_layout();
        let mut record = DecodedRecord::default();
        record.insert("user", FieldValue::Address(Address::zero()));
        record.insert("start_time", FieldValue::Uint(U256::one() << 96));
        record.insert("amount", FieldValue::Uint(U256::one()));
        assert_eq!(
            layout.encode(&record).unwrap_err(),
            LayoutError::ValueTooWide {
                field: "start_time".to_string(),
                bits: 96
            }
        );
    }

    #[test]
    fn test_bytes_and_bool_fields() {
        let layout = StructLayout::new(vec![
            FieldSpec::bool("active"),
            FieldSpec::bytes("tag", 31),
        ])
        .unwrap();

        let mut record = DecodedRecord::default();
        record.insert("active", FieldValue::Bool(true));
        record.insert("tag", FieldValue::Bytes(vec![0xaa; 31]));

        let words = layout.encode(&record).unwrap();
        let decoded = layout.decode(&words).unwrap().into_record().unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_layout_serde_validates() {
        let json = r#"[{"name":"user","kind":"address","bits":160},{"name":"start_time","kind":"uint","bits":96},{"name":"amount","kind":"uint","bits":256}]"#;
        let layout: StructLayout = serde_json::from_str(json).unwrap();
        assert_eq!(layout, lock_layout());

        let bad = r#"[{"name":"user","kind":"address","bits":160}]"#;
        assert!(serde_json::from_str::<StructLayout>(bad).is_err());
    }
}

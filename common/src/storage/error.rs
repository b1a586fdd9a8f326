use crate::rpc::RpcError;
use thiserror::Error;

use super::FieldKind;

/// Static misconfiguration of a struct layout. Never worth retrying.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Layout has no fields")]
    Empty,

    #[error("Field '{field}' has invalid width of {bits} bits")]
    InvalidWidth { field: String, bits: usize },

    #[error("Field '{field}' of kind {kind:?} cannot be {bits} bits wide")]
    KindWidthMismatch {
        field: String,
        kind: FieldKind,
        bits: usize,
    },

    #[error("Field '{0}' is declared more than once")]
    DuplicateField(String),

    #[error("Word {word} only uses {used} of 256 bits, fields must tile whole words")]
    PartialWord { word: usize, used: usize },

    #[error("Expected {expected} words for one element, got {got}")]
    WordCount { expected: usize, got: usize },

    #[error("Field '{0}' is missing from the record")]
    MissingField(String),

    #[error("Field '{field}' does not hold a {expected:?} value")]
    ValueKindMismatch { field: String, expected: FieldKind },

    #[error("Value of field '{field}' does not fit in {bits} bits")]
    ValueTooWide { field: String, bits: usize },
}

#[derive(Error, Debug)]
pub enum ProjectionError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    // Aborts the read of one element only, the caller decides whether to retry
    #[error("Transport error while reading {slot}: {source}")]
    Transport {
        slot: String,
        #[source]
        source: RpcError,
    },

    #[error("Array length {0} does not fit in 64 bits")]
    LengthOverflow(String),

    #[error("Array length {length} exceeds the limit of {max} elements")]
    TooManyElements { length: u64, max: u64 },
}

impl ProjectionError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

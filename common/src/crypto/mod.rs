mod address;
mod hash;

pub mod error;

pub use address::*;
pub use error::CryptoError;
pub use hash::*;

// Accept both `0x`-prefixed and bare hex strings
pub(crate) fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

// Decode a hex string into exactly N bytes
pub(crate) fn decode_fixed_hex<const N: usize>(value: &str) -> Result<[u8; N], CryptoError> {
    let hex = strip_hex_prefix(value);
    if hex.len() != N * 2 {
        return Err(CryptoError::InvalidLength {
            len: hex.len() / 2,
            expected: N,
        });
    }

    let bytes = hex::decode(hex).map_err(|e| CryptoError::InvalidHex(e.to_string()))?;
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}

// Conversion between human decimal amounts ("1.5") and the integer base
// units the contracts work with (1.5 * 10^decimals).

use crate::config::MAX_DECIMALS;
use primitive_types::U256;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitsError {
    #[error("Amount is empty")]
    Empty,

    #[error("Invalid amount '{0}'")]
    InvalidNumber(String),

    #[error("Too many decimals, at most {0} are allowed")]
    TooManyDecimals(u8),

    #[error("Unsupported number of decimals: {0}")]
    UnsupportedDecimals(u8),

    #[error("Amount does not fit in 256 bits")]
    Overflow,
}

fn is_digits(value: &str) -> bool {
    value.bytes().all(|b| b.is_ascii_digit())
}

fn parse_digits(value: &str) -> Result<U256, UnitsError> {
    if value.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_dec_str(value).map_err(|_| UnitsError::Overflow)
}

/// Parse a decimal string into base units, e.g. `parse_units("1.5", 18)`.
pub fn parse_units(value: &str, decimals: u8) -> Result<U256, UnitsError> {
    if decimals > MAX_DECIMALS {
        return Err(UnitsError::UnsupportedDecimals(decimals));
    }

    let value = value.trim();
    if value.is_empty() {
        return Err(UnitsError::Empty);
    }

    let (integer, fraction) = match value.split_once('.') {
        Some((integer, fraction)) => (integer, fraction),
        None => (value, ""),
    };

    if (integer.is_empty() && fraction.is_empty()) || !is_digits(integer) || !is_digits(fraction) {
        return Err(UnitsError::InvalidNumber(value.to_string()));
    }

    if fraction.len() > decimals as usize {
        return Err(UnitsError::TooManyDecimals(decimals));
    }

    let unit = U256::exp10(decimals as usize);
    let fraction_scale = U256::exp10(decimals as usize - fraction.len());

    parse_digits(integer)?
        .checked_mul(unit)
        .and_then(|whole| {
            parse_digits(fraction)
                .ok()?
                .checked_mul(fraction_scale)
                .and_then(|part| whole.checked_add(part))
        })
        .ok_or(UnitsError::Overflow)
}

/// Format base units as the shortest decimal string, e.g. `1.5` or `0`.
pub fn format_units(value: U256, decimals: u8) -> String {
    let decimals = decimals.min(MAX_DECIMALS) as usize;
    let unit = U256::exp10(decimals);
    let integer = value / unit;
    let fraction = value % unit;

    if fraction.is_zero() {
        return integer.to_string();
    }

    let fraction = format!("{:0>width$}", fraction.to_string(), width = decimals);
    format!("{}.{}", integer, fraction.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!(
            parse_units("1.5", 18).unwrap(),
            U256::from(1_500_000_000_000_000_000u64)
        );
        assert_eq!(parse_units("42", 0).unwrap(), U256::from(42));
        assert_eq!(parse_units(".25", 2).unwrap(), U256::from(25));
        assert_eq!(parse_units("3.", 2).unwrap(), U256::from(300));
        assert_eq!(parse_units(" 0.000000000000000001 ", 18).unwrap(), U256::one());
    }

    #[test]
    fn test_parse_units_rejects_bad_input() {
        assert_eq!(parse_units("", 18), Err(UnitsError::Empty));
        assert_eq!(parse_units(".", 18), Err(UnitsError::InvalidNumber(".".into())));
        assert_eq!(parse_units("-1", 18), Err(UnitsError::InvalidNumber("-1".into())));
        assert_eq!(parse_units("1.2.3", 18), Err(UnitsError::InvalidNumber("1.2.3".into())));
        assert_eq!(parse_units("1.234", 2), Err(UnitsError::TooManyDecimals(2)));
        assert_eq!(parse_units("1", 78), Err(UnitsError::UnsupportedDecimals(78)));

        let huge = "1".repeat(80);
        assert_eq!(parse_units(&huge, 0), Err(UnitsError::Overflow));
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(U256::zero(), 18), "0");
        assert_eq!(format_units(U256::from(1_500_000_000_000_000_000u64), 18), "1.5");
        assert_eq!(format_units(U256::one(), 18), "0.000000000000000001");
        assert_eq!(format_units(U256::from(1234), 2), "12.34");
        assert_eq!(format_units(U256::from(1234), 0), "1234");
    }
}

//! Path parameter validation

use alloy_primitives::{Address, U256};
use std::str::FromStr;

use super::types::FieldError;
use crate::utils::constants::is_hex_address;

/// `0x` followed by exactly 40 hex digits, any case
pub fn parse_address(field: &str, raw: &str) -> Result<Address, FieldError> {
    if !is_hex_address(raw) {
        return Err(FieldError::new(
            field,
            format!("{} must match /^0x[a-fA-F0-9]{{40}}$/", field),
        ));
    }
    Address::from_str(raw).map_err(|e| FieldError::new(field, e.to_string()))
}

/// Base-10 digits only, fits in 256 bits, strictly positive
pub fn parse_amount(field: &str, raw: &str) -> Result<U256, FieldError> {
    let invalid = || FieldError::new(field, format!("{} must be a positive integer string", field));

    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let amount = U256::from_str_radix(raw, 10).map_err(|_| {
        FieldError::new(field, format!("{} does not fit in 256 bits", field))
    })?;

    if amount.is_zero() {
        return Err(invalid());
    }
    Ok(amount)
}

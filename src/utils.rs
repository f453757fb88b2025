// Utility helpers shared by the API and services

use ethers::types::{Address, U256};
use std::str::FromStr;

use crate::{
    constants::TOKEN_DECIMALS,
    error::{AppError, Result},
};

/// Truthy env flag values: 1, true, yes, y, on.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

/// Parses a 0x-prefixed, 20-byte hex address.
pub fn parse_address(raw: &str) -> Result<Address> {
    let trimmed = raw.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| AppError::InvalidAddress(trimmed.to_string()))?;
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AppError::InvalidAddress(trimmed.to_string()));
    }
    Address::from_str(hex).map_err(|_| AppError::InvalidAddress(trimmed.to_string()))
}

/// Lowercase 0x-hex key used for the in-memory per-address maps.
pub fn address_key(address: &Address) -> String {
    format!("{:#x}", address)
}

/// Whole tokens to base units (18 decimals).
pub fn tokens_to_base_units(tokens: u64) -> U256 {
    U256::from(tokens) * U256::exp10(TOKEN_DECIMALS as usize)
}

/// Base units to a decimal string with the fractional part trimmed, e.g. `1000.5`.
pub fn format_token_amount(amount: U256, decimals: u32) -> String {
    let base = U256::exp10(decimals as usize);
    let whole = amount / base;
    let frac = amount % base;
    if frac.is_zero() {
        return whole.to_string();
    }
    let frac_str = format!("{:0>width$}", frac.to_string(), width = decimals as usize);
    format!("{}.{}", whole, frac_str.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_address_accepts_checksummed_and_lowercase() {
        let a = parse_address("0xa33239e13303Fe9586C25b70ABd4D5d65E7B368f").unwrap();
        let b = parse_address("0xa33239e13303fe9586c25b70abd4d5d65e7b368f").unwrap();
        assert_eq!(a, b);
        assert_eq!(address_key(&a), "0xa33239e13303fe9586c25b70abd4d5d65e7b368f");
    }

    #[test]
    fn parse_address_rejects_garbage() {
        assert!(parse_address("").is_err());
        assert!(parse_address("a33239e13303Fe9586C25b70ABd4D5d65E7B368f").is_err());
        assert!(parse_address("0x1234").is_err());
        assert!(parse_address("0xzz3239e13303Fe9586C25b70ABd4D5d65E7B368f").is_err());
    }

    #[test]
    fn tokens_to_base_units_scales_by_decimals() {
        assert_eq!(
            tokens_to_base_units(10),
            U256::from_dec_str("10000000000000000000").unwrap()
        );
    }

    #[test]
    fn format_token_amount_trims_fraction() {
        let amount = U256::from_dec_str("1000500000000000000000").unwrap();
        assert_eq!(format_token_amount(amount, 18), "1000.5");
        assert_eq!(format_token_amount(tokens_to_base_units(7), 18), "7");
        assert_eq!(format_token_amount(U256::from(1u64), 18), "0.000000000000000001");
    }

    #[test]
    fn truthy_flags() {
        assert!(is_truthy(" YES "));
        assert!(is_truthy("1"));
        assert!(!is_truthy("off"));
    }
}

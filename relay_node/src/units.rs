//! Native-unit formatting

use ethers::types::U256;

/// Decimals of the native currency (AVAX)
pub const NATIVE_DECIMALS: usize = 18;

/// Render a wei-denominated amount as a decimal AVAX string.
///
/// Trailing fractional zeros are dropped but one fractional digit is
/// always kept, so `10^18` renders as `1.0` and `25 * 10^16` as `0.25`.
pub fn format_native(value: U256) -> String {
    let (whole, fraction) = value.div_mod(U256::exp10(NATIVE_DECIMALS));
    let fraction = format!("{:0>width$}", fraction.to_string(), width = NATIVE_DECIMALS);
    let trimmed = fraction.trim_end_matches('0');
    if trimmed.is_empty() {
        format!("{}.0", whole)
    } else {
        format!("{}.{}", whole, trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_amounts() {
        assert_eq!(format_native(U256::zero()), "0.0");
        assert_eq!(format_native(U256::exp10(18)), "1.0");
        assert_eq!(format_native(U256::from(12u64) * U256::exp10(18)), "12.0");
    }

    #[test]
    fn test_fractional_amounts() {
        assert_eq!(format_native(U256::from(250_000_000_000_000_000u64)), "0.25");
        assert_eq!(format_native(U256::one()), "0.000000000000000001");
        assert_eq!(
            format_native(U256::from_dec_str("1500000000000000001").unwrap()),
            "1.500000000000000001"
        );
    }
}

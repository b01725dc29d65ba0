use bigdecimal::{num_bigint::BigInt, BigDecimal, Zero};

/// Decimals of the chain's native currency
pub const NATIVE_DECIMALS: u32 = 18;

/// Convert a raw integer amount into human-readable units (raw / 10^decimals).
/// Exact; no rounding. Trailing fractional zeros are dropped.
pub fn scale_amount(raw: &BigInt, decimals: u32) -> BigDecimal {
    let scaled = BigDecimal::new(raw.clone(), i64::from(decimals)).normalized();
    let (_, scale) = scaled.as_bigint_and_exponent();
    if scale < 0 {
        // Keep whole numbers in plain notation
        scaled.with_scale(0)
    } else {
        scaled
    }
}

/// Convert wei into native units
pub fn wei_to_native(wei: &BigInt) -> BigDecimal {
    scale_amount(wei, NATIVE_DECIMALS)
}

/// `value - amount`, floored at zero
pub fn saturating_sub(value: &BigDecimal, amount: &BigDecimal) -> BigDecimal {
    let difference = value - amount;
    if difference < BigDecimal::zero() {
        BigDecimal::zero()
    } else {
        difference
    }
}

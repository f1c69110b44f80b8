use rust_decimal::Decimal;
use web3::types::U256;

/// Largest token precision accepted by the conversions below
pub const MAX_DECIMALS: u32 = 18;

fn compute_base(num_decimals: u32) -> Decimal {
    if num_decimals == 18 {
        Decimal::new(1000000000000000000, 0)
    } else if num_decimals == 6 {
        Decimal::new(1000000, 0)
    } else {
        Decimal::from(10_u128.pow(num_decimals))
    }
}

/// None when decimals exceed [`MAX_DECIMALS`] or the amount does not fit rust_decimal
fn u256_to_rust_dec(amount: U256, num_decimals: u32) -> Option<Decimal> {
    if num_decimals > MAX_DECIMALS {
        return None;
    }

    //max value supported by rust_decimal
    if amount >= U256::from(79228162514264337593543950336_u128) {
        return None;
    }

    Some(Decimal::from(amount.as_u128()) / compute_base(num_decimals))
}

/// Rounds a raw token amount to `precision` fractional digits (half away from zero).
/// Result is expressed in units of 10^-precision.
pub fn u256_round_to_precision(amount: U256, decimals: u32, precision: u32) -> U256 {
    if precision >= decimals {
        return amount.saturating_mul(U256::exp10((precision - decimals) as usize));
    }
    let base = U256::exp10((decimals - precision) as usize);
    let (quotient, remainder) = amount.div_mod(base);
    if remainder * U256::from(2) >= base {
        quotient.saturating_add(U256::one())
    } else {
        quotient
    }
}

/// precision cannot be greater than decimals (it is capped automatically)
pub fn u256_to_decimal_string(amount: U256, decimals: u32, precision: Option<usize>) -> String {
    let str = &amount.to_string();
    let mut str_rev: Vec<char> = str.chars().rev().collect();
    let precision = precision.map(|p| std::cmp::min(p, decimals as usize));

    #[allow(clippy::same_item_push)]
    for _ in 0..(decimals as usize) {
        str_rev.push('0');
    }

    str_rev.insert(decimals as usize, '.');

    let str: String = str_rev.iter().rev().collect();
    let str = str.trim_matches('0').to_string();
    let mut str = if str.starts_with('.') {
        "0".to_string() + &str
    } else {
        str
    };

    let idx_of_dot = str.find('.').unwrap_or(str.len()) as i64;
    let number_of_digit_at_right = str.len() as i64 - idx_of_dot - 1;

    if let Some(precision) = precision {
        let add_zeroes = precision as i64 - number_of_digit_at_right;
        if add_zeroes > 0 {
            for _ in 0..add_zeroes {
                str.push('0');
            }
        } else {
            for _ in 0..(-add_zeroes) {
                str.pop();
            }
        }
    }

    str = str.trim_end_matches('.').to_string();

    str
}

pub trait U256ConvExt {
    fn to_decimal_saturate(&self, decimals: u32) -> Decimal;
    fn to_rounded_str(&self, decimals: u32, precision: u32) -> String;
}

impl U256ConvExt for U256 {
    fn to_decimal_saturate(&self, decimals: u32) -> Decimal {
        u256_to_rust_dec(*self, decimals).unwrap_or(Decimal::MAX)
    }
    fn to_rounded_str(&self, decimals: u32, precision: u32) -> String {
        let rounded = u256_round_to_precision(*self, decimals, precision);
        u256_to_decimal_string(rounded, precision, Some(precision as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    #[rustfmt::skip]
    fn test_rust_u256_to_str() {
        assert_eq!(u256_to_decimal_string(U256::from(0), 0, None), "0");
        assert_eq!(u256_to_decimal_string(U256::from(0), 6, None), "0");
        assert_eq!(u256_to_decimal_string(U256::from(0), 18, None), "0");
        assert_eq!(u256_to_decimal_string(U256::from(1), 0, None), "1");
        assert_eq!(u256_to_decimal_string(U256::from(1), 6, None), "0.000001");
        assert_eq!(u256_to_decimal_string(U256::from(1), 18, None), "0.000000000000000001");
        assert_eq!(u256_to_decimal_string(U256::from(1), 6, Some(0)), "0");
        assert_eq!(u256_to_decimal_string(U256::from(1), 6, Some(3)), "0.000");
        assert_eq!(u256_to_decimal_string(U256::from(1), 6, Some(9)), "0.000001");

        let max_u256_str = "115792089237316195423570985008687907853269984665640564039457584007913129639935";
        assert_eq!(u256_to_decimal_string(U256::from_dec_str(max_u256_str).unwrap(), 18, Some(2)),
            "115792089237316195423570985008687907853269984665640564039457.58");

        assert_eq!(u256_to_decimal_string(U256::from(1000000000000000000_u128), 18, None), "1");
        assert_eq!(u256_to_decimal_string(U256::from(1000000000000000000660000000000000000_u128), 18, None), "1000000000000000000.66");
    }

    #[test]
    #[rustfmt::skip]
    fn test_rounded_str() {
        let one_eth = U256::exp10(18);
        assert_eq!((one_eth * U256::from(100)).to_rounded_str(18, 2), "100.00");
        assert_eq!((one_eth * U256::from(50)).to_rounded_str(18, 2), "50.00");
        assert_eq!(U256::zero().to_rounded_str(18, 2), "0.00");
        assert_eq!(U256::zero().to_rounded_str(6, 2), "0.00");
        assert_eq!(U256::from(25_000_000_u64).to_rounded_str(6, 2), "25.00");
        // 1.234999 -> 1.23, 1.235 -> 1.24
        assert_eq!(U256::from(1_234_999_u64).to_rounded_str(6, 2), "1.23");
        assert_eq!(U256::from(1_235_000_u64).to_rounded_str(6, 2), "1.24");
        assert_eq!(U256::from(4_999_u64).to_rounded_str(6, 2), "0.00");
        assert_eq!(U256::from(5_000_u64).to_rounded_str(6, 2), "0.01");
        assert_eq!(U256::from(7_u64).to_rounded_str(0, 2), "7.00");

        // unlimited approvals must still render
        assert_eq!(U256::MAX.to_rounded_str(18, 2),
            "115792089237316195423570985008687907853269984665640564039457.58");
    }

    #[test]
    fn test_rounding_keeps_order() {
        let amounts = [
            U256::from(1_234_999_u64),
            U256::from(1_235_000_u64),
            U256::from(1_235_001_u64),
            U256::from(99_999_999_u64),
        ];
        for a in amounts {
            for b in amounts {
                if a <= b {
                    assert!(u256_round_to_precision(a, 6, 2) <= u256_round_to_precision(b, 6, 2));
                }
            }
        }
    }

    #[test]
    fn test_decimal_saturate() {
        let res = U256::from(25_500_000_u64).to_decimal_saturate(6);
        assert_eq!(res, Decimal::from_str("25.5").unwrap());
        assert_eq!(U256::exp10(20).to_decimal_saturate(18), Decimal::from(100));
        assert_eq!(U256::MAX.to_decimal_saturate(18), Decimal::MAX);
    }
}

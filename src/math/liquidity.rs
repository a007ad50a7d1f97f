// Amount <-> liquidity relationships for a tick range, with the reference
// rounding semantics (two-step ceil for token0 when rounding up, floor
// otherwise). All sqrt prices are Q64.96 BigInts.

use num_bigint::BigInt;
use num_traits::Zero;

use super::tick::q96;

#[inline]
pub(crate) fn ceil_div(a: &BigInt, b: &BigInt) -> BigInt {
    // assumes a >= 0, b > 0
    if a.is_zero() {
        return BigInt::zero();
    }
    (a + (b - 1)) / b
}

fn sorted(a: &BigInt, b: &BigInt) -> (BigInt, BigInt) {
    if a < b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

/// Token0 owed for `liquidity` between two sqrt prices.
///
/// round_up: ceil(ceil(L<<96 * (sb - sa) / sb) / sa), else the floor of both
/// divisions.
pub fn amount0_for_liquidity(
    sqrt_a_x96: &BigInt,
    sqrt_b_x96: &BigInt,
    liquidity: &BigInt,
    round_up: bool,
) -> BigInt {
    if liquidity.is_zero() {
        return BigInt::zero();
    }
    let (sa, sb) = sorted(sqrt_a_x96, sqrt_b_x96);
    if sa.is_zero() || sa == sb {
        return BigInt::zero();
    }

    let numerator1 = liquidity << 96;
    let numerator2 = &sb - &sa;

    if round_up {
        let t = ceil_div(&(&numerator1 * &numerator2), &sb);
        ceil_div(&t, &sa)
    } else {
        ((&numerator1 * &numerator2) / &sb) / &sa
    }
}

/// Token1 owed for `liquidity` between two sqrt prices.
pub fn amount1_for_liquidity(
    sqrt_a_x96: &BigInt,
    sqrt_b_x96: &BigInt,
    liquidity: &BigInt,
    round_up: bool,
) -> BigInt {
    if liquidity.is_zero() {
        return BigInt::zero();
    }
    let (sa, sb) = sorted(sqrt_a_x96, sqrt_b_x96);
    if sa == sb {
        return BigInt::zero();
    }

    let num = liquidity * (sb - sa);
    let den = q96();
    if round_up {
        ceil_div(&num, &den)
    } else {
        num / den
    }
}

/// Liquidity purchasable with `amount0` alone across [sa, sb].
/// L = amount0 * (sa * sb / 2^96) / (sb - sa), floored.
pub fn liquidity_from_amount0(
    sqrt_a_x96: &BigInt,
    sqrt_b_x96: &BigInt,
    amount0: &BigInt,
) -> BigInt {
    let (sa, sb) = sorted(sqrt_a_x96, sqrt_b_x96);
    let spread = &sb - &sa;
    if spread.is_zero() {
        return BigInt::zero();
    }
    let intermediate = (&sa * &sb) / q96();
    (amount0 * intermediate) / spread
}

/// Liquidity purchasable with `amount1` alone across [sa, sb].
/// L = amount1 * 2^96 / (sb - sa), floored.
pub fn liquidity_from_amount1(
    sqrt_a_x96: &BigInt,
    sqrt_b_x96: &BigInt,
    amount1: &BigInt,
) -> BigInt {
    let (sa, sb) = sorted(sqrt_a_x96, sqrt_b_x96);
    let spread = &sb - &sa;
    if spread.is_zero() {
        return BigInt::zero();
    }
    (amount1 * q96()) / spread
}

/// Maximum liquidity mintable from both balances at the current price.
/// In range, the limiting side wins so neither balance is overdrawn.
pub fn liquidity_from_amounts(
    sqrt_p_x96: &BigInt,
    sqrt_a_x96: &BigInt,
    sqrt_b_x96: &BigInt,
    amount0: &BigInt,
    amount1: &BigInt,
) -> BigInt {
    let (sa, sb) = sorted(sqrt_a_x96, sqrt_b_x96);

    if *sqrt_p_x96 <= sa {
        liquidity_from_amount0(&sa, &sb, amount0)
    } else if *sqrt_p_x96 >= sb {
        liquidity_from_amount1(&sa, &sb, amount1)
    } else {
        let l0 = liquidity_from_amount0(sqrt_p_x96, &sb, amount0);
        let l1 = liquidity_from_amount1(&sa, sqrt_p_x96, amount1);
        if l0 < l1 {
            l0
        } else {
            l1
        }
    }
}

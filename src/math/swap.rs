// Exact-input fill math for a swap that stays inside the active liquidity
// range. Rebalancing swaps are small relative to pool depth, so a single
// price segment is enough to quote them; the realized-output check against
// the order's minimum catches the cases where it is not.

use num_bigint::BigInt;
use num_traits::Zero;

use super::liquidity::{amount0_for_liquidity, amount1_for_liquidity, ceil_div};
use super::tick::{q96, tick_at_sqrt_price};

const FEE_DENOMINATOR_PPM: u32 = 1_000_000;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SwapDirection {
    /// Sell token0 for token1; the sqrt price moves down.
    ZeroForOne,
    /// Sell token1 for token0; the sqrt price moves up.
    OneForZero,
}

/// Result of quoting an exact-input swap.
#[derive(Clone, Debug)]
pub struct SwapFill {
    pub amount_in: BigInt,
    pub amount_out: BigInt,
    pub fee_paid: BigInt,
    pub sqrt_price_after_x96: BigInt,
    pub tick_after: i32,
}

/// sqrtQ = ceil((L<<96) * sqrtP / ((L<<96) + amountIn * sqrtP)), the
/// reference rounding for a token0 input.
fn next_sqrt_price_from_amount0(
    liquidity: &BigInt,
    sqrt_p_x96: &BigInt,
    amount_in_net: &BigInt,
) -> BigInt {
    if amount_in_net.is_zero() || liquidity.is_zero() {
        return sqrt_p_x96.clone();
    }
    let numerator1 = liquidity << 96;
    let numerator = &numerator1 * sqrt_p_x96;
    let denominator = &numerator1 + amount_in_net * sqrt_p_x96;
    ceil_div(&numerator, &denominator)
}

/// sqrtQ = P + floor(amountIn * 2^96 / L) for a token1 input.
fn next_sqrt_price_from_amount1(
    liquidity: &BigInt,
    sqrt_p_x96: &BigInt,
    amount_in_net: &BigInt,
) -> BigInt {
    if amount_in_net.is_zero() || liquidity.is_zero() {
        return sqrt_p_x96.clone();
    }
    sqrt_p_x96 + (amount_in_net * q96()) / liquidity
}

/// Quote an exact-input swap against in-range liquidity.
///
/// The pool fee (ppm) is taken off the input before it moves the price,
/// mirroring the reference step math. Zero input or zero liquidity quotes
/// a zero fill at the unchanged price.
pub fn quote_exact_in(
    sqrt_price_x96: &BigInt,
    liquidity: &BigInt,
    direction: SwapDirection,
    amount_in: &BigInt,
    fee_ppm: u32,
) -> SwapFill {
    let fee_ppm = fee_ppm.min(FEE_DENOMINATOR_PPM - 1);
    let denom = BigInt::from(FEE_DENOMINATOR_PPM);
    let fee_complement = BigInt::from(FEE_DENOMINATOR_PPM - fee_ppm);

    if amount_in.is_zero() || liquidity.is_zero() {
        return SwapFill {
            amount_in: BigInt::zero(),
            amount_out: BigInt::zero(),
            fee_paid: BigInt::zero(),
            sqrt_price_after_x96: sqrt_price_x96.clone(),
            tick_after: tick_at_sqrt_price(sqrt_price_x96),
        };
    }

    let amount_in_net = (amount_in * &fee_complement) / &denom;
    let fee_paid = amount_in - &amount_in_net;

    let (sqrt_after, amount_out) = match direction {
        SwapDirection::ZeroForOne => {
            let sqrt_after =
                next_sqrt_price_from_amount0(liquidity, sqrt_price_x96, &amount_in_net);
            let out = amount1_for_liquidity(&sqrt_after, sqrt_price_x96, liquidity, false);
            (sqrt_after, out)
        }
        SwapDirection::OneForZero => {
            let sqrt_after =
                next_sqrt_price_from_amount1(liquidity, sqrt_price_x96, &amount_in_net);
            let out = amount0_for_liquidity(sqrt_price_x96, &sqrt_after, liquidity, false);
            (sqrt_after, out)
        }
    };

    SwapFill {
        amount_in: amount_in.clone(),
        amount_out,
        fee_paid,
        tick_after: tick_at_sqrt_price(&sqrt_after),
        sqrt_price_after_x96: sqrt_after,
    }
}

// Ratio solver: decides which token is in relative excess for a target tick
// range and how much of it to swap so the post-swap balances sit on the
// range's liquidity-optimal ratio.
//
// For in-range liquidity, one unit of L needs n0 token0 across [P, upper]
// and n1 token1 across [lower, P]. Balances (a0, a1) are on-ratio when
// a0 * n1 == a1 * n0. Selling dx of token0 at the spot price p moves the
// balances to (a0 - dx, a1 + p*dx); solving for the on-ratio point gives
//
//   dx = (a0*n1 - a1*n0) / (n1 + p*n0)
//
// and symmetrically for a token1 excess. p is the raw spot price sp^2/2^192,
// so everything stays in integer cross-multiplied form.

use num_bigint::BigInt;
use num_traits::Zero;

use crate::engine::errors::ProvisionError;

use super::liquidity::{amount0_for_liquidity, amount1_for_liquidity};
use super::range::{TickRange, WIDTH_SCALE};
use super::swap::SwapDirection;
use super::tick::{q96, q192, sqrt_price_at_tick};

/// A bounded swap the executor must fill at or above `min_amount_out`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOrder {
    pub direction: SwapDirection,
    pub amount_in: BigInt,
    pub min_amount_out: BigInt,
}

/// Policy knobs for the solver. The thresholds are deliberate policy, not
/// constants of the math: callers tune them per deployment.
#[derive(Debug, Clone, Copy)]
pub struct RebalancePolicy {
    /// Residual imbalance accepted without swapping, in bps of the
    /// counterpart balance, value-normalized at the spot price.
    pub rebalance_tolerance_bps: u32,
    /// Haircut applied to the spot-expected output when setting the swap's
    /// minimum-output bound, in bps.
    pub max_swap_slippage_bps: u32,
}

impl Default for RebalancePolicy {
    fn default() -> Self {
        RebalancePolicy {
            rebalance_tolerance_bps: 300,
            max_swap_slippage_bps: 100,
        }
    }
}

/// Solve for the swap that rebalances (amount0, amount1) onto the optimal
/// ratio for `range`. `Ok(None)` means the balances are already within
/// tolerance. Errors with `RangeOutOfCurrentPrice` when the pool price sits
/// outside the range: no split makes sense there, the caller must widen or
/// re-center.
pub fn solve_rebalance(
    current_tick: i32,
    sqrt_price_x96: &BigInt,
    range: &TickRange,
    amount0: &BigInt,
    amount1: &BigInt,
    policy: &RebalancePolicy,
) -> Result<Option<SwapOrder>, ProvisionError> {
    let sqrt_lower = sqrt_price_at_tick(range.lower);
    let sqrt_upper = sqrt_price_at_tick(range.upper);

    if !range.contains(current_tick)
        || *sqrt_price_x96 <= sqrt_lower
        || *sqrt_price_x96 >= sqrt_upper
    {
        return Err(ProvisionError::RangeOutOfCurrentPrice {
            tick: current_tick,
            lower: range.lower,
            upper: range.upper,
        });
    }

    // Required amounts per reference unit of liquidity (2^96).
    let unit = q96();
    let need0 = amount0_for_liquidity(sqrt_price_x96, &sqrt_upper, &unit, false);
    let need1 = amount1_for_liquidity(&sqrt_lower, sqrt_price_x96, &unit, false);

    let side0 = &need1 * amount0;
    let side1 = &need0 * amount1;

    let scale = BigInt::from(WIDTH_SCALE);
    let tolerance = BigInt::from(policy.rebalance_tolerance_bps);
    let keep = &scale - BigInt::from(policy.max_swap_slippage_bps);
    let sp_squared = sqrt_price_x96 * sqrt_price_x96;

    let order = if side0 > side1 {
        // Token0 in excess: sell token0. Dust suppression compares the
        // excess against the counterpart balance converted to token0 units.
        let surplus = &side0 - &side1;
        let excess0 = &surplus / &need1;
        if &excess0 * &scale * &sp_squared <= &tolerance * amount1 * q192() {
            return Ok(None);
        }
        let amount_in = (&surplus * q192()) / (&need1 * q192() + &need0 * &sp_squared);
        if amount_in.is_zero() {
            return Ok(None);
        }
        let expected_out = (&amount_in * &sp_squared) >> 192;
        SwapOrder {
            direction: SwapDirection::ZeroForOne,
            min_amount_out: (expected_out * &keep) / &scale,
            amount_in,
        }
    } else if side1 > side0 {
        // Token1 in excess: sell token1.
        let surplus = &side1 - &side0;
        let excess1 = &surplus / &need0;
        if &excess1 * &scale * q192() <= &tolerance * amount0 * &sp_squared {
            return Ok(None);
        }
        let amount_in = (&surplus * &sp_squared) / (&need0 * &sp_squared + &need1 * q192());
        if amount_in.is_zero() {
            return Ok(None);
        }
        let expected_out = (&amount_in << 192) / &sp_squared;
        SwapOrder {
            direction: SwapDirection::OneForZero,
            min_amount_out: (expected_out * &keep) / &scale,
            amount_in,
        }
    } else {
        return Ok(None);
    };

    Ok(Some(order))
}

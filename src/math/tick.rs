// Canonical tick <-> Q64.96 sqrt-price conversions for concentrated-liquidity
// pools. BigInt end-to-end so the fixed-point rounding matches the reference
// implementation exactly; price = 1.0001^tick, sqrt prices carry 96 fractional
// bits.

use num_bigint::BigInt;
use num_traits::One;

pub const MIN_TICK: i32 = -887_272;
pub const MAX_TICK: i32 = 887_272;

/// 2^96, the Q64.96 scale factor.
pub fn q96() -> BigInt {
    BigInt::one() << 96
}

/// 2^192, the scale of a squared Q64.96 price.
pub fn q192() -> BigInt {
    BigInt::one() << 192
}

// Per-bit multipliers for sqrt(1.0001)^(-2^n), n = 1..=19, in Q128.128.
// Bit 0 is folded into the initial ratio below.
const SQRT_RATIO_FACTORS: [&[u8]; 19] = [
    b"fff97272373d413259a46990580e213a",
    b"fff2e50f5f656932ef12357cf3c7fdcc",
    b"ffe5caca7e10e4e61c3624eaa0941cd0",
    b"ffcb9843d60f6159c9db58835c926644",
    b"ff973b41fa98c081472e6896dfb254c0",
    b"ff2ea16466c96a3843ec78b326b52861",
    b"fe5dee046a99a2a811c461f1969c3053",
    b"fcbe86c7900a88aedcffc83b479aa3a4",
    b"f987a7253ac413176f2b074cf7815e54",
    b"f3392b0822b70005940c7a398e4b70f3",
    b"e7159475a2c29b7443b29c7fa6e889d9",
    b"d097f3bdfd2022b8845ad8f792aa5825",
    b"a9f746462d870fdf8a65dc1f90e061e5",
    b"70d869a156d2a1b890bb3df62baf32f7",
    b"31be135f97d08fd981231505542fcfa6",
    b"09aa508b5b7a84e1c677de54f3e99bc9",
    b"05d6af8dedb81196699c329225ee604",
    b"2216e584f5fa1ea926041bedfe98",
    b"48a170391f7dc42444e8fa2",
];

/// Exact sqrt(1.0001^tick) in Q64.96, ported with the canonical constants.
///
/// Panics if `tick` is outside the usable grid; callers snap and clamp
/// before converting.
pub fn sqrt_price_at_tick(tick: i32) -> BigInt {
    assert!(
        (MIN_TICK..=MAX_TICK).contains(&tick),
        "tick {} out of range",
        tick
    );
    let abs_tick = tick.unsigned_abs();

    // Q128.128 running product.
    let mut ratio = if abs_tick & 0x1 != 0 {
        BigInt::parse_bytes(b"fffcb933bd6fad37aa2d162d1a594001", 16)
            .expect("malformed sqrt ratio constant")
    } else {
        BigInt::one() << 128
    };

    for (bit, factor_hex) in SQRT_RATIO_FACTORS.iter().enumerate() {
        if abs_tick & (1u32 << (bit + 1)) != 0 {
            let factor = BigInt::parse_bytes(factor_hex, 16)
                .expect("malformed sqrt ratio constant");
            ratio = (&ratio * factor) >> 128;
        }
    }

    if tick > 0 {
        let max = (BigInt::one() << 256) - 1;
        ratio = max / ratio;
    }

    // Round-up shift from Q128.128 down to Q64.96.
    (&ratio + ((BigInt::one() << 32) - 1)) >> 32
}

/// Largest tick whose sqrt price is <= the given value (binary search over
/// the grid; exact for on-grid inputs).
pub fn tick_at_sqrt_price(sqrt_price_x96: &BigInt) -> i32 {
    let mut lo = MIN_TICK;
    let mut hi = MAX_TICK;
    while lo < hi {
        let mid = lo + (hi - lo + 1) / 2;
        if sqrt_price_at_tick(mid) <= *sqrt_price_x96 {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    lo
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::ToPrimitive;

    #[test]
    fn sqrt_price_at_zero_tick_is_q96() {
        assert_eq!(sqrt_price_at_tick(0), q96());
    }

    #[test]
    fn sqrt_price_is_monotonic() {
        let ticks = [-887_272, -100_000, -60, -1, 0, 1, 60, 100_000, 887_272];
        for pair in ticks.windows(2) {
            assert!(
                sqrt_price_at_tick(pair[0]) < sqrt_price_at_tick(pair[1]),
                "not monotonic between {} and {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn sqrt_price_tracks_float_reference() {
        // sqrt(1.0001^t) * 2^96, compared loosely against f64.
        for &tick in &[-67_455, -12_345, -60, 60, 12_345, 67_455] {
            let exact = sqrt_price_at_tick(tick).to_f64().unwrap();
            let float = 1.0001_f64.powi(tick).sqrt() * (1u128 << 96) as f64;
            let rel = (exact - float).abs() / float;
            assert!(rel < 1e-9, "tick {}: rel error {}", tick, rel);
        }
    }

    #[test]
    fn tick_at_sqrt_price_inverts_on_grid() {
        for &tick in &[MIN_TICK, -67_455, -1, 0, 1, 67_455, MAX_TICK - 1] {
            let sqrt = sqrt_price_at_tick(tick);
            assert_eq!(tick_at_sqrt_price(&sqrt), tick);
        }
    }

    #[test]
    fn tick_at_sqrt_price_rounds_down_between_ticks() {
        let between = (sqrt_price_at_tick(100) + sqrt_price_at_tick(101)) / 2;
        assert_eq!(tick_at_sqrt_price(&between), 100);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn sqrt_price_rejects_out_of_range_tick() {
        sqrt_price_at_tick(MAX_TICK + 1);
    }
}

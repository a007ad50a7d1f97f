// Property sweeps over the range and tick math. Tolerance on the spread
// metric is only meaningful when the requested band is wide relative to
// the spacing grid; narrow bands are still checked for structural
// validity.

use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};

use range_provisioner::engine::errors::ProvisionError;
use range_provisioner::math::range::{range_for_width, TickRange};
use range_provisioner::math::ratio::{solve_rebalance, RebalancePolicy};
use range_provisioner::math::swap::SwapDirection;
use range_provisioner::math::tick::{sqrt_price_at_tick, tick_at_sqrt_price, MAX_TICK, MIN_TICK};

fn spread_metric(range: &TickRange) -> f64 {
    let lower_price = 1.0001_f64.powi(range.lower);
    let upper_price = 1.0001_f64.powi(range.upper);
    10_000.0 * (upper_price - lower_price) / (lower_price + upper_price)
}

fn nominal_half_ticks(width: i64) -> f64 {
    let r = width as f64 / 10_000.0;
    (((1.0 + r) / (1.0 - r)).ln()) / (2.0 * 1.0001_f64.ln())
}

#[test]
fn range_sweep_structural_and_tolerance() {
    let widths = [100i64, 500, 1_000, 2_500, 5_000, 6_000, 7_500, 9_000, 9_950];
    let ticks = [-200_000, -67_455, -1, 0, 1, 887, 67_455, 200_000];
    let spacings = [1, 10, 60, 200];

    for &width in &widths {
        for &tick in &ticks {
            for &spacing in &spacings {
                let range = match range_for_width(tick, width, spacing) {
                    Ok(range) => range,
                    Err(ProvisionError::InvalidWidth { .. }) => {
                        // Only legitimate when snapping eats the band.
                        assert!(
                            nominal_half_ticks(width) < spacing as f64,
                            "width {} spacing {} collapsed unexpectedly",
                            width,
                            spacing
                        );
                        continue;
                    }
                    Err(other) => panic!("unexpected error: {:?}", other),
                };

                assert!(range.lower < range.upper);
                assert_eq!(range.lower.rem_euclid(spacing), 0);
                assert_eq!(range.upper.rem_euclid(spacing), 0);
                assert!(range.contains(tick), "tick {} outside {:?}", tick, range);
                assert!(range.lower >= MIN_TICK && range.upper <= MAX_TICK);

                // Snapping error is up to half a spacing per bound; only
                // hold the metric to tolerance when that error is small
                // against the band itself.
                if nominal_half_ticks(width) >= 5.0 * spacing as f64 {
                    let metric = spread_metric(&range);
                    assert!(
                        (metric - width as f64).abs() <= 0.1 * width as f64,
                        "width {} tick {} spacing {}: metric {:.1}",
                        width,
                        tick,
                        spacing,
                        metric
                    );
                }
            }
        }
    }
}

#[test]
fn range_is_deterministic_and_monotone() {
    for &width in &[1_000i64, 5_000, 9_000] {
        let first = range_for_width(67_455, width, 60).unwrap();
        let second = range_for_width(67_455, width, 60).unwrap();
        assert_eq!(first, second);
    }

    let mut previous = 0i32;
    for &width in &[500i64, 1_000, 2_500, 5_000, 7_500, 9_000, 9_950] {
        let range = range_for_width(0, width, 10).unwrap();
        assert!(range.width_ticks() > previous, "width {} did not widen", width);
        previous = range.width_ticks();
    }
}

#[test]
fn tick_price_inversion_on_grid() {
    for tick in (-600_000..=600_000).step_by(30_000) {
        let sqrt_price = sqrt_price_at_tick(tick);
        assert_eq!(tick_at_sqrt_price(&sqrt_price), tick);
    }
}

#[test]
fn sqrt_price_tracks_reference_curve() {
    for &tick in &[-391_440i32, -67_455, 0, 67_455, 391_440] {
        let sqrt_price = sqrt_price_at_tick(tick).to_f64().unwrap() / (1u128 << 96) as f64;
        let reference = 1.0001_f64.powf(tick as f64 / 2.0);
        let rel = (sqrt_price - reference).abs() / reference;
        assert!(rel < 1e-9, "tick {}: rel error {}", tick, rel);
    }
}

#[test]
fn solver_residual_inside_tolerance_across_fundings() {
    let tick = 67_455;
    let sqrt_price = sqrt_price_at_tick(tick);
    let spot = {
        let s = sqrt_price.to_f64().unwrap() / (1u128 << 96) as f64;
        s * s
    };
    let policy = RebalancePolicy::default();

    for &width in &[2_500i64, 5_000, 9_000] {
        let range = range_for_width(tick, width, 60).unwrap();
        for &amount0 in &[0u64, 50_000_000, 100_000_000, 1_000_000_000] {
            for &amount1 in &[0u64, 40_000_000_000, 85_000_000_000, 500_000_000_000] {
                if amount0 == 0 && amount1 == 0 {
                    continue;
                }
                let a0 = BigInt::from(amount0);
                let a1 = BigInt::from(amount1);
                let order =
                    match solve_rebalance(tick, &sqrt_price, &range, &a0, &a1, &policy).unwrap() {
                        Some(order) => order,
                        None => continue,
                    };
                assert!(order.amount_in > BigInt::zero());
                assert!(order.min_amount_out >= BigInt::zero());

                // Replay the swap at spot and confirm the solver is done.
                let (new0, new1) = match order.direction {
                    SwapDirection::ZeroForOne => {
                        let out = (order.amount_in.to_f64().unwrap() * spot) as u64;
                        (&a0 - &order.amount_in, &a1 + BigInt::from(out))
                    }
                    SwapDirection::OneForZero => {
                        let out = (order.amount_in.to_f64().unwrap() / spot) as u64;
                        (&a0 + BigInt::from(out), &a1 - &order.amount_in)
                    }
                };
                assert!(new0 >= BigInt::zero() && new1 >= BigInt::zero());
                let residual =
                    solve_rebalance(tick, &sqrt_price, &range, &new0, &new1, &policy).unwrap();
                assert!(
                    residual.is_none(),
                    "width {} amounts ({}, {}): residual {:?}",
                    width,
                    amount0,
                    amount1,
                    residual
                );
            }
        }
    }
}

#[test]
fn solver_rejects_out_of_range_price() {
    let tick = 67_455;
    let sqrt_price = sqrt_price_at_tick(tick);
    let range = TickRange { lower: tick + 60, upper: tick + 1_200 };
    let err = solve_rebalance(
        tick,
        &sqrt_price,
        &range,
        &BigInt::from(1_000u32),
        &BigInt::from(1_000u32),
        &RebalancePolicy::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ProvisionError::RangeOutOfCurrentPrice { .. }));
}

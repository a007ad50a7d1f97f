// Width -> tick-range derivation.
//
// A width W (basis-point-like, 0 < W < 10000) asks for price bounds whose
// relative spread is W/10000:
//
//   10000 * (priceUpper - priceLower) / (priceLower + priceUpper) ~= W
//
// With r = W/10000 the bound ratio is k = priceUpper/priceLower =
// (1 + r) / (1 - r), and the band is centered geometrically on the current
// price, so each side spans ln(k) / (2 ln 1.0001) ticks.

use crate::engine::errors::ProvisionError;

use super::tick::{MAX_TICK, MIN_TICK};

/// Denominator of the width parameter (and of all bps-style policy knobs).
pub const WIDTH_SCALE: i64 = 10_000;

/// A usable tick range: both bounds on the spacing grid, lower < upper,
/// inclusive of the tick it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickRange {
    pub lower: i32,
    pub upper: i32,
}

impl TickRange {
    pub fn width_ticks(&self) -> i32 {
        self.upper - self.lower
    }

    pub fn contains(&self, tick: i32) -> bool {
        self.lower <= tick && tick < self.upper
    }
}

#[inline]
fn floor_to_spacing(tick: i32, spacing: i32) -> i32 {
    tick.div_euclid(spacing) * spacing
}

#[inline]
fn ceil_to_spacing(tick: i32, spacing: i32) -> i32 {
    -((-tick).div_euclid(spacing)) * spacing
}

#[inline]
fn round_to_spacing(tick: f64, spacing: i32) -> i32 {
    ((tick / spacing as f64).round() as i64 * spacing as i64) as i32
}

/// Derive the target tick range for `width` around `current_tick`.
///
/// Both bounds snap to the nearest spacing multiple; a bound that rounds
/// past the current tick is pushed one spacing outward so the range stays
/// inclusive. Errors with `InvalidWidth` for a non-positive or saturated
/// width, and for a width too small to survive snapping at this spacing.
pub fn range_for_width(
    current_tick: i32,
    width: i64,
    tick_spacing: i32,
) -> Result<TickRange, ProvisionError> {
    if width <= 0 {
        return Err(ProvisionError::InvalidWidth {
            width,
            reason: "width must be positive",
        });
    }
    if width >= WIDTH_SCALE {
        return Err(ProvisionError::InvalidWidth {
            width,
            reason: "width must be below 10000",
        });
    }
    debug_assert!(tick_spacing > 0, "pool tick spacing must be positive");

    let r = width as f64 / WIDTH_SCALE as f64;
    let bound_ratio = (1.0 + r) / (1.0 - r);
    let half_ticks = bound_ratio.ln() / (2.0 * 1.0001_f64.ln());

    let mut lower = round_to_spacing(current_tick as f64 - half_ticks, tick_spacing);
    let mut upper = round_to_spacing(current_tick as f64 + half_ticks, tick_spacing);

    // Keep the current tick inside the band.
    if lower > current_tick {
        lower -= tick_spacing;
    }
    if upper < current_tick {
        upper += tick_spacing;
    }

    lower = lower.max(ceil_to_spacing(MIN_TICK, tick_spacing));
    upper = upper.min(floor_to_spacing(MAX_TICK, tick_spacing));

    if lower >= upper {
        return Err(ProvisionError::InvalidWidth {
            width,
            reason: "range collapses at this tick spacing",
        });
    }

    Ok(TickRange { lower, upper })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spread_metric(range: &TickRange) -> f64 {
        let lower_price = 1.0001_f64.powi(range.lower);
        let upper_price = 1.0001_f64.powi(range.upper);
        10_000.0 * (upper_price - lower_price) / (lower_price + upper_price)
    }

    #[test]
    fn bounds_land_on_spacing_grid() {
        let range = range_for_width(67_455, 6_000, 60).unwrap();
        assert_eq!(range.lower % 60, 0);
        assert_eq!(range.upper % 60, 0);
        assert!(range.contains(67_455));
    }

    #[test]
    fn spread_matches_width_within_tolerance() {
        for &width in &[5_000i64, 6_000, 7_500, 9_000, 9_950] {
            let range = range_for_width(67_455, width, 60).unwrap();
            let metric = spread_metric(&range);
            let err = (metric - width as f64).abs();
            assert!(
                err <= 0.1 * width as f64,
                "width {}: metric {:.1} off by {:.1}",
                width,
                metric,
                err
            );
        }
    }

    #[test]
    fn negative_ticks_snap_correctly() {
        let range = range_for_width(-191_740, 5_000, 60).unwrap();
        assert_eq!(range.lower.rem_euclid(60), 0);
        assert_eq!(range.upper.rem_euclid(60), 0);
        assert!(range.contains(-191_740));
        let metric = spread_metric(&range);
        assert!((metric - 5_000.0).abs() <= 500.0);
    }

    #[test]
    fn computation_is_idempotent() {
        let a = range_for_width(67_455, 7_500, 60).unwrap();
        let b = range_for_width(67_455, 7_500, 60).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn wider_width_means_wider_range() {
        let narrow = range_for_width(0, 2_000, 10).unwrap();
        let wide = range_for_width(0, 8_000, 10).unwrap();
        assert!(wide.width_ticks() > narrow.width_ticks());
    }

    #[test]
    fn non_positive_width_is_invalid() {
        for width in [0i64, -1, -10_000] {
            match range_for_width(0, width, 60) {
                Err(ProvisionError::InvalidWidth { .. }) => {}
                other => panic!("expected InvalidWidth, got {:?}", other),
            }
        }
    }

    #[test]
    fn saturated_width_is_invalid() {
        for width in [10_000i64, 20_000] {
            match range_for_width(0, width, 60) {
                Err(ProvisionError::InvalidWidth { .. }) => {}
                other => panic!("expected InvalidWidth, got {:?}", other),
            }
        }
    }

    #[test]
    fn collapsing_range_is_invalid_not_degenerate() {
        // Half width ~10 ticks, spacing 200: both bounds round to the same
        // grid point.
        match range_for_width(0, 10, 200) {
            Err(ProvisionError::InvalidWidth { reason, .. }) => {
                assert!(reason.contains("collapses"));
            }
            other => panic!("expected InvalidWidth, got {:?}", other),
        }
    }

    #[test]
    fn bounds_clamp_to_usable_grid() {
        let range = range_for_width(880_000, 9_950, 60).unwrap();
        assert!(range.upper <= MAX_TICK);
        assert!(range.lower >= MIN_TICK);
        assert!(range.contains(880_000));
    }
}

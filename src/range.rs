//! # Range Calculator
//!
//! Derives a replacement tick range centered on the current price: a
//! configured price width is converted to a symmetric tick half-width, the
//! raw bounds are aligned outward to the pool's tick spacing, and the final
//! range is validated against the tick bounds. The range always straddles
//! the live price rather than trailing it.

use crate::errors::MathError;
use crate::tick_math::TickBounds;
use crate::types::TickRange;
use tracing::{debug, instrument};

const LN_1_0001: f64 = 0.00009999500033330834;

/// Computes centered, spacing-aligned tick ranges within explicit bounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeCalculator {
    bounds: TickBounds,
}

impl RangeCalculator {
    pub fn new(bounds: TickBounds) -> Self {
        Self { bounds }
    }

    /// Converts `width_percent` into the tick count whose price width
    /// approximates `1 + width_percent/100`, split symmetrically around the
    /// center. The half-width only sizes the range; the tick boundaries
    /// themselves stay in the exact integer domain.
    fn half_width_ticks(width_percent: f64) -> i64 {
        ((1.0 + width_percent / 200.0).ln() / LN_1_0001).round() as i64
    }

    /// Produces the new range for `current_tick`.
    ///
    /// The lower bound is aligned down and the upper bound up to multiples
    /// of `tick_spacing`; a bound that lands exactly on `current_tick` is
    /// shifted outward one further spacing increment, so the current tick is
    /// always strictly inside whenever the tick bounds allow it. Bounds that
    /// cannot be aligned inside the configured tick bounds fail with
    /// `RangeOutOfBounds`.
    #[instrument(skip(self))]
    pub fn calculate_tick_range(
        &self,
        current_tick: i32,
        width_percent: f64,
        tick_spacing: u32,
    ) -> Result<TickRange, MathError> {
        if !self.bounds.contains_tick(current_tick) {
            return Err(MathError::TickOutOfBounds {
                tick: current_tick,
                min: self.bounds.min_tick,
                max: self.bounds.max_tick,
            });
        }
        if tick_spacing == 0 {
            return Err(MathError::InvalidRangeParameter(
                "tick spacing must be positive".into(),
            ));
        }
        if !width_percent.is_finite() || width_percent <= 0.0 {
            return Err(MathError::InvalidRangeParameter(format!(
                "range width must be a positive percentage, got {}",
                width_percent
            )));
        }

        let spacing = i64::from(tick_spacing);
        let current = i64::from(current_tick);
        let half_width = Self::half_width_ticks(width_percent);

        let mut lower = (current - half_width).div_euclid(spacing) * spacing;
        let raw_upper = current + half_width;
        let mut upper = raw_upper.div_euclid(spacing) * spacing;
        if upper < raw_upper {
            upper += spacing;
        }
        // Never leave the current tick sitting on a boundary.
        if lower == current {
            lower -= spacing;
        }
        if upper == current {
            upper += spacing;
        }

        let (min, max) = (i64::from(self.bounds.min_tick), i64::from(self.bounds.max_tick));
        if lower < min || upper > max {
            return Err(MathError::RangeOutOfBounds {
                lower: lower.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32,
                upper: upper.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32,
                min: self.bounds.min_tick,
                max: self.bounds.max_tick,
            });
        }

        let range = TickRange::new(lower as i32, upper as i32)?;
        debug!(
            current_tick,
            width_percent,
            tick_spacing,
            tick_lower = range.tick_lower,
            tick_upper = range.tick_upper,
            "computed replacement range"
        );
        Ok(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tick_math::{MAX_TICK, MIN_TICK};

    fn calc() -> RangeCalculator {
        RangeCalculator::default()
    }

    #[test]
    fn test_bounds_are_aligned_and_contain_current_tick() {
        let calc = calc();
        let cases = [
            (0i32, 5.0f64, 60u32),
            (0, 5.0, 1),
            (12345, 5.0, 60),
            (-12345, 5.0, 60),
            (7, 0.5, 10),
            (-7, 0.5, 10),
            (100000, 20.0, 200),
            (-100000, 20.0, 200),
            (1, 0.01, 2),
        ];
        for (current, width, spacing) in cases {
            let range = calc.calculate_tick_range(current, width, spacing).unwrap();
            let spacing_i = spacing as i32;
            assert_eq!(
                range.tick_lower.rem_euclid(spacing_i),
                0,
                "lower {} not aligned to {}",
                range.tick_lower,
                spacing
            );
            assert_eq!(range.tick_upper.rem_euclid(spacing_i), 0);
            assert!(
                range.tick_lower < current && current < range.tick_upper,
                "range {:?} does not strictly contain {}",
                range,
                current
            );
        }
    }

    #[test]
    fn test_current_tick_on_multiple_is_pushed_off_boundary() {
        // Tiny width rounds to a zero half-width; alignment alone must still
        // produce a strict straddle.
        let range = calc().calculate_tick_range(600, 0.001, 60).unwrap();
        assert_eq!(range.tick_lower, 540);
        assert_eq!(range.tick_upper, 660);
    }

    #[test]
    fn test_price_width_approximates_configured_percent() {
        let range = calc().calculate_tick_range(0, 5.0, 1).unwrap();
        let price_width = 1.0001f64.powi(range.width() as i32);
        assert!(
            (price_width - 1.05).abs() < 0.001,
            "price width {} too far from 1.05",
            price_width
        );
    }

    #[test]
    fn test_range_near_tick_bounds_fails() {
        let err = calc().calculate_tick_range(MAX_TICK - 10, 5.0, 60).unwrap_err();
        assert!(matches!(err, MathError::RangeOutOfBounds { .. }));
        let err = calc().calculate_tick_range(MIN_TICK + 10, 5.0, 60).unwrap_err();
        assert!(matches!(err, MathError::RangeOutOfBounds { .. }));
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert!(matches!(
            calc().calculate_tick_range(0, 5.0, 0),
            Err(MathError::InvalidRangeParameter(_))
        ));
        assert!(matches!(
            calc().calculate_tick_range(0, 0.0, 60),
            Err(MathError::InvalidRangeParameter(_))
        ));
        assert!(matches!(
            calc().calculate_tick_range(0, -3.0, 60),
            Err(MathError::InvalidRangeParameter(_))
        ));
        assert!(matches!(
            calc().calculate_tick_range(MAX_TICK + 1, 5.0, 60),
            Err(MathError::TickOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_half_width_matches_tick_log_identity() {
        // 5% price width -> ln(1.025)/ln(1.0001) ~= 247 ticks per side.
        assert_eq!(RangeCalculator::half_width_ticks(5.0), 247);
        // 2% -> ln(1.01)/ln(1.0001) ~= 100 ticks per side.
        assert_eq!(RangeCalculator::half_width_ticks(2.0), 100);
    }
}

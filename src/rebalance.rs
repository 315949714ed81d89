//! # Rebalance Decision Engine
//!
//! Classifies a position against the live pool price and decides whether a
//! rebalance is warranted. Two gates must both open before action: the
//! structural check (is the current tick outside the half-open position
//! range?) and the magnitude check (has price moved past the tolerance
//! threshold, measured in price space from the violated boundary?). Ticks
//! crossing just past a boundary therefore never churn transactions; only
//! decisive moves trigger.
//!
//! `evaluate` is a pure function over the snapshot pair. The caller is
//! responsible for fetching pool and position from the same ledger
//! checkpoint; freshness is not validated here.

use crate::errors::MathError;
use crate::tick_math::TickMath;
use crate::types::{PoolSnapshot, PositionSnapshot, PricePosition, RebalanceDecision, TickRange};
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, Default)]
pub struct RebalanceEngine {
    tick_math: TickMath,
}

impl RebalanceEngine {
    pub fn new(tick_math: TickMath) -> Self {
        Self { tick_math }
    }

    /// Evaluates one pool/position snapshot pair against a drift threshold.
    ///
    /// The deviation is the signed percentage distance from the current
    /// tick's price to the nearest violated boundary's price: positive when
    /// price moved above the upper bound, negative when below the lower.
    #[instrument(skip(self, pool, position), fields(current_tick = pool.current_tick))]
    pub fn evaluate(
        &self,
        pool: &PoolSnapshot,
        position: &PositionSnapshot,
        threshold_percent: f64,
    ) -> Result<RebalanceDecision, MathError> {
        if !threshold_percent.is_finite() || threshold_percent < 0.0 {
            return Err(MathError::InvalidRangeParameter(format!(
                "rebalance threshold must be a non-negative percentage, got {}",
                threshold_percent
            )));
        }
        let range = TickRange::new(position.tick_lower, position.tick_upper)?;

        let decision = match PricePosition::from_tick(pool.current_tick, &range) {
            PricePosition::InRange => {
                debug!(
                    tick_lower = range.tick_lower,
                    tick_upper = range.tick_upper,
                    "position in range"
                );
                self.hold(pool, &range, 0.0, "position is in range".to_string())
            }
            PricePosition::BelowRange => {
                let deviation = self.price_deviation_percent(pool.current_tick, range.tick_lower)?;
                self.classify_drift(pool, &range, deviation, threshold_percent, "below", "lower")
            }
            PricePosition::AboveRange => {
                let deviation = self.price_deviation_percent(pool.current_tick, range.tick_upper)?;
                self.classify_drift(pool, &range, deviation, threshold_percent, "above", "upper")
            }
        };
        Ok(decision)
    }

    /// `(price(current) - price(boundary)) / price(boundary) * 100`.
    ///
    /// Boundary prices come from the exact Q64.64 ladder; only the final
    /// percentage, a reporting value, is formed in floating point.
    fn price_deviation_percent(&self, current_tick: i32, boundary_tick: i32) -> Result<f64, MathError> {
        let sqrt_current = self.tick_math.tick_to_sqrt_price_x64(current_tick)?;
        let sqrt_boundary = self.tick_math.tick_to_sqrt_price_x64(boundary_tick)?;
        let ratio = sqrt_current as f64 / sqrt_boundary as f64;
        Ok((ratio * ratio - 1.0) * 100.0)
    }

    fn classify_drift(
        &self,
        pool: &PoolSnapshot,
        range: &TickRange,
        deviation: f64,
        threshold_percent: f64,
        direction: &str,
        boundary: &str,
    ) -> RebalanceDecision {
        if deviation.abs() < threshold_percent {
            debug!(
                deviation_percent = deviation,
                threshold_percent, "drift within tolerance band"
            );
            return self.hold(
                pool,
                range,
                deviation,
                format!(
                    "price drifted {:.4}% {} the {} bound, within the {:.2}% tolerance",
                    deviation.abs(),
                    direction,
                    boundary,
                    threshold_percent
                ),
            );
        }
        let reason = format!(
            "price moved {:.4}% {} the {} bound (tick {}), exceeding the {:.2}% threshold",
            deviation.abs(),
            direction,
            boundary,
            if boundary == "lower" { range.tick_lower } else { range.tick_upper },
            threshold_percent
        );
        debug!(deviation_percent = deviation, %reason, "rebalance triggered");
        RebalanceDecision {
            should_rebalance: true,
            reason,
            current_tick: pool.current_tick,
            tick_lower: range.tick_lower,
            tick_upper: range.tick_upper,
            price_deviation_percent: deviation,
        }
    }

    fn hold(
        &self,
        pool: &PoolSnapshot,
        range: &TickRange,
        deviation: f64,
        reason: String,
    ) -> RebalanceDecision {
        RebalanceDecision {
            should_rebalance: false,
            reason,
            current_tick: pool.current_tick,
            tick_lower: range.tick_lower,
            tick_upper: range.tick_upper,
            price_deviation_percent: deviation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(current_tick: i32) -> PoolSnapshot {
        let sqrt = TickMath::default()
            .tick_to_sqrt_price_x64(current_tick)
            .unwrap();
        PoolSnapshot {
            coin_type_a: "0x2::sui::SUI".to_string(),
            coin_type_b: "0xdead::usdc::USDC".to_string(),
            current_tick,
            current_sqrt_price_x64: sqrt,
            tick_spacing: 60,
            fee_rate: 2500,
        }
    }

    fn position(tick_lower: i32, tick_upper: i32) -> PositionSnapshot {
        PositionSnapshot {
            tick_lower,
            tick_upper,
            liquidity: 1_000_000_000,
            coin_a: 0,
            coin_b: 0,
        }
    }

    #[test]
    fn test_in_range_position_holds() {
        let decision = RebalanceEngine::default()
            .evaluate(&pool(0), &position(-1000, 1000), 2.0)
            .unwrap();
        assert!(!decision.should_rebalance);
        assert_eq!(decision.price_deviation_percent, 0.0);
    }

    #[test]
    fn test_drift_below_threshold_holds() {
        // 50 ticks under the lower bound is ~0.5% in price space, inside
        // the 2% tolerance band.
        let decision = RebalanceEngine::default()
            .evaluate(&pool(50), &position(100, 2000), 2.0)
            .unwrap();
        assert!(!decision.should_rebalance);
        assert!(decision.price_deviation_percent < 0.0);
        assert!(decision.price_deviation_percent.abs() < 2.0);
    }

    #[test]
    fn test_breach_beyond_threshold_triggers() {
        // 100 ticks below the lower bound is ~0.995%; with a 0.5% threshold
        // the magnitude gate opens.
        let decision = RebalanceEngine::default()
            .evaluate(&pool(0), &position(100, 2000), 0.5)
            .unwrap();
        assert!(decision.should_rebalance);
        assert!(decision.price_deviation_percent < 0.0);
        assert!(decision.price_deviation_percent.abs() >= 0.5);
        assert!(decision.reason.contains("lower"), "reason: {}", decision.reason);
        assert!(decision.reason.contains("below"), "reason: {}", decision.reason);
    }

    #[test]
    fn test_breach_above_upper_is_positive_deviation() {
        let decision = RebalanceEngine::default()
            .evaluate(&pool(2500), &position(100, 2000), 2.0)
            .unwrap();
        assert!(decision.should_rebalance);
        assert!(decision.price_deviation_percent > 0.0);
        assert!(decision.reason.contains("upper"), "reason: {}", decision.reason);
    }

    #[test]
    fn test_tick_on_upper_bound_is_out_of_range_but_zero_deviation() {
        // The upper bound is exclusive, so sitting exactly on it is a
        // structural breach with zero price distance: tolerated.
        let decision = RebalanceEngine::default()
            .evaluate(&pool(2000), &position(100, 2000), 2.0)
            .unwrap();
        assert!(!decision.should_rebalance);
        assert_eq!(decision.price_deviation_percent, 0.0);
    }

    #[test]
    fn test_inverted_position_range_rejected() {
        let err = RebalanceEngine::default()
            .evaluate(&pool(0), &position(1000, -1000), 2.0)
            .unwrap_err();
        assert!(matches!(err, MathError::InvalidTickRange { .. }));
    }
}

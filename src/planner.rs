//! # Rebalance Planner
//!
//! Pure orchestration of one evaluation cycle: snapshot pair in, decision
//! out, and when the decision triggers, the replacement range plus the
//! slippage-protected withdrawal minimums the transaction-construction
//! collaborator attaches to its calls. Nothing here performs I/O; the
//! planner only sequences the math components in the one-directional data
//! flow.

use crate::config::RebalancerConfig;
use crate::errors::{MathError, RebalancerError};
use crate::liquidity_math::amounts_from_liquidity;
use crate::range::RangeCalculator;
use crate::rebalance::RebalanceEngine;
use crate::tick_math::{TickBounds, TickMath};
use crate::types::{PoolSnapshot, PositionSnapshot, RebalanceDecision, TickRange, TokenAmounts};
use primitive_types::U256;
use tracing::{debug, instrument, warn};

const BPS_DENOMINATOR: u64 = 10_000;

/// Everything the transaction collaborator needs to rebalance: why, where
/// the new range sits, and the least it may accept when closing the old
/// position.
#[derive(Debug, Clone)]
pub struct RebalancePlan {
    pub decision: RebalanceDecision,
    pub new_range: TickRange,
    /// Amounts the closing position is expected to yield at the current
    /// price, before slippage.
    pub expected_withdrawal: TokenAmounts,
    /// Slippage-scaled minimum-output bounds for the withdrawal.
    pub amount_a_min: u64,
    pub amount_b_min: u64,
}

/// Outcome of one planning cycle.
#[derive(Debug, Clone)]
pub enum PlanOutcome {
    /// Position left alone; carries the decision for reporting.
    Hold(RebalanceDecision),
    Rebalance(Box<RebalancePlan>),
}

/// Amounts a position would yield if withdrawn at the pool's current price,
/// computed with the position's own boundaries. These seed the withdrawal's
/// minimum-output bounds and must not be confused with the deposit amounts
/// for the new range, which come from `liquidity_from_amounts` once token
/// balances are known.
pub fn expected_withdrawal_amounts(
    tick_math: &TickMath,
    pool: &PoolSnapshot,
    position: &PositionSnapshot,
) -> Result<TokenAmounts, MathError> {
    if position.liquidity == 0 {
        warn!("position has zero liquidity, expected withdrawal is empty");
        return Ok(TokenAmounts::default());
    }
    let sqrt_lower = tick_math.tick_to_sqrt_price_x64(position.tick_lower)?;
    let sqrt_upper = tick_math.tick_to_sqrt_price_x64(position.tick_upper)?;
    amounts_from_liquidity(
        pool.current_sqrt_price_x64,
        sqrt_lower,
        sqrt_upper,
        position.liquidity,
    )
}

/// Scales expected amounts down by `max_slippage_percent`, flooring. A
/// non-zero expected amount never produces a zero minimum: an unprotected
/// minimum would let the transaction layer accept arbitrarily bad fills.
pub fn min_amounts_after_slippage(
    amounts: TokenAmounts,
    max_slippage_percent: f64,
) -> Result<TokenAmounts, MathError> {
    if !max_slippage_percent.is_finite()
        || max_slippage_percent < 0.0
        || max_slippage_percent >= 100.0
    {
        return Err(MathError::InvalidRangeParameter(format!(
            "max slippage must be in [0, 100), got {}",
            max_slippage_percent
        )));
    }
    let slippage_bps = (max_slippage_percent * 100.0).round() as u64;
    let scale = |amount: u64| -> u64 {
        if amount == 0 {
            return 0;
        }
        let scaled = U256::from(amount) * U256::from(BPS_DENOMINATOR - slippage_bps)
            / U256::from(BPS_DENOMINATOR);
        scaled.low_u64().max(1)
    };
    Ok(TokenAmounts {
        amount_a: scale(amounts.amount_a),
        amount_b: scale(amounts.amount_b),
    })
}

/// Sequences decision, range computation, and withdrawal minimums over one
/// snapshot pair.
#[derive(Debug, Clone)]
pub struct RebalancePlanner {
    config: RebalancerConfig,
    tick_math: TickMath,
    engine: RebalanceEngine,
    ranges: RangeCalculator,
}

impl RebalancePlanner {
    pub fn new(config: RebalancerConfig) -> Result<Self, RebalancerError> {
        Self::with_bounds(config, TickBounds::default())
    }

    pub fn with_bounds(
        config: RebalancerConfig,
        bounds: TickBounds,
    ) -> Result<Self, RebalancerError> {
        config.validate()?;
        let tick_math = TickMath::new(bounds);
        Ok(Self {
            config,
            tick_math,
            engine: RebalanceEngine::new(tick_math),
            ranges: RangeCalculator::new(bounds),
        })
    }

    pub fn config(&self) -> &RebalancerConfig {
        &self.config
    }

    /// Evaluates one snapshot pair. The caller must have fetched both from
    /// the same ledger checkpoint.
    #[instrument(skip(self, pool, position), fields(current_tick = pool.current_tick))]
    pub fn plan(
        &self,
        pool: &PoolSnapshot,
        position: &PositionSnapshot,
    ) -> Result<PlanOutcome, RebalancerError> {
        let range = TickRange::new(position.tick_lower, position.tick_upper)
            .map_err(RebalancerError::from)?;
        if !range.is_aligned(pool.tick_spacing) {
            // The chain would have rejected such a position at open; a
            // misaligned snapshot pair means the caller mixed pools.
            return Err(MathError::MisalignedRange {
                lower: range.tick_lower,
                upper: range.tick_upper,
                spacing: pool.tick_spacing,
            }
            .into());
        }

        let decision = self.engine.evaluate(
            pool,
            position,
            self.config.rebalance_threshold_percent,
        )?;
        if !decision.should_rebalance {
            return Ok(PlanOutcome::Hold(decision));
        }

        let new_range = self.ranges.calculate_tick_range(
            pool.current_tick,
            self.config.range_width_percent,
            pool.tick_spacing,
        )?;
        let expected_withdrawal = expected_withdrawal_amounts(&self.tick_math, pool, position)?;
        let minimums =
            min_amounts_after_slippage(expected_withdrawal, self.config.max_slippage_percent)?;
        debug!(
            tick_lower = new_range.tick_lower,
            tick_upper = new_range.tick_upper,
            amount_a_min = minimums.amount_a,
            amount_b_min = minimums.amount_b,
            "rebalance plan assembled"
        );
        Ok(PlanOutcome::Rebalance(Box::new(RebalancePlan {
            decision,
            new_range,
            expected_withdrawal,
            amount_a_min: minimums.amount_a,
            amount_b_min: minimums.amount_b,
        })))
    }
}

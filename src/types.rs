//! # Core Value Types
//!
//! Immutable value objects exchanged between the math core and its external
//! collaborators. Snapshots are fetched by the chain-query collaborator and
//! consumed read-only; every evaluation cycle constructs fresh snapshots and
//! a fresh decision, then discards them. Nothing in this module carries
//! shared mutable state.

use crate::errors::MathError;
use serde::{Deserialize, Serialize};

/// Point-in-time view of a CLMM pool.
///
/// `current_sqrt_price_x64` is the canonical on-chain Q64.64 price;
/// `current_tick` is the tick the pool reported alongside it. The caller is
/// responsible for fetching both from the same ledger checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub coin_type_a: String,
    pub coin_type_b: String,
    pub current_tick: i32,
    pub current_sqrt_price_x64: u128,
    pub tick_spacing: u32,
    /// Pool fee rate in parts-per-million, carried for reporting only.
    pub fee_rate: u64,
}

/// Point-in-time view of an on-chain position NFT.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
    pub coin_a: u64,
    pub coin_b: u64,
}

/// A half-open tick interval `[tick_lower, tick_upper)`.
///
/// Invariant: `tick_lower < tick_upper`. Alignment to the owning pool's tick
/// spacing is the range calculator's contract, not enforced here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickRange {
    pub tick_lower: i32,
    pub tick_upper: i32,
}

impl TickRange {
    pub fn new(tick_lower: i32, tick_upper: i32) -> Result<Self, MathError> {
        if tick_lower >= tick_upper {
            return Err(MathError::InvalidTickRange {
                lower: tick_lower,
                upper: tick_upper,
            });
        }
        Ok(Self {
            tick_lower,
            tick_upper,
        })
    }

    /// A tick denotes the lower boundary of its price interval, so the upper
    /// bound is exclusive.
    pub fn contains(&self, tick: i32) -> bool {
        self.tick_lower <= tick && tick < self.tick_upper
    }

    pub fn width(&self) -> i64 {
        i64::from(self.tick_upper) - i64::from(self.tick_lower)
    }

    pub fn is_aligned(&self, tick_spacing: u32) -> bool {
        if tick_spacing == 0 {
            return false;
        }
        let spacing = tick_spacing as i32;
        self.tick_lower.rem_euclid(spacing) == 0 && self.tick_upper.rem_euclid(spacing) == 0
    }
}

/// Where the current price sits relative to a position's range.
///
/// Computed once per call and passed to whichever formula needs it, so the
/// liquidity math and the decision logic can never disagree about the regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PricePosition {
    /// Price at or below the lower bound: the position is entirely token A.
    BelowRange,
    /// Price strictly inside the range: both tokens participate.
    InRange,
    /// Price at or above the upper bound: the position is entirely token B.
    AboveRange,
}

impl PricePosition {
    /// Classify a current sqrt price against a sqrt-price range.
    pub fn from_sqrt_prices(
        sqrt_price_current: u128,
        sqrt_price_lower: u128,
        sqrt_price_upper: u128,
    ) -> Result<Self, MathError> {
        if sqrt_price_lower >= sqrt_price_upper {
            return Err(MathError::DivisionDomain(format!(
                "sqrt price range has zero or negative width: lower {} upper {}",
                sqrt_price_lower, sqrt_price_upper
            )));
        }
        if sqrt_price_current <= sqrt_price_lower {
            Ok(Self::BelowRange)
        } else if sqrt_price_current >= sqrt_price_upper {
            Ok(Self::AboveRange)
        } else {
            Ok(Self::InRange)
        }
    }

    /// Classify a current tick against a half-open tick range. The upper
    /// bound is exclusive, matching tick semantics where a tick denotes a
    /// lower boundary.
    pub fn from_tick(current_tick: i32, range: &TickRange) -> Self {
        if current_tick < range.tick_lower {
            Self::BelowRange
        } else if current_tick >= range.tick_upper {
            Self::AboveRange
        } else {
            Self::InRange
        }
    }
}

/// A pair of token amounts in raw integer units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAmounts {
    pub amount_a: u64,
    pub amount_b: u64,
}

impl TokenAmounts {
    pub fn is_zero(&self) -> bool {
        self.amount_a == 0 && self.amount_b == 0
    }
}

/// Outcome of one rebalance evaluation. Recomputed from fresh snapshots each
/// cycle, never mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebalanceDecision {
    pub should_rebalance: bool,
    pub reason: String,
    pub current_tick: i32,
    pub tick_lower: i32,
    pub tick_upper: i32,
    /// Signed percentage distance from the current price to the nearest
    /// violated boundary, in price space. Positive above the upper bound,
    /// negative below the lower bound, zero while in range.
    pub price_deviation_percent: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_range_invariant() {
        assert!(TickRange::new(-100, 100).is_ok());
        assert!(matches!(
            TickRange::new(100, 100),
            Err(MathError::InvalidTickRange { .. })
        ));
        assert!(TickRange::new(100, -100).is_err());
    }

    #[test]
    fn test_tick_range_upper_exclusive() {
        let range = TickRange::new(-100, 100).unwrap();
        assert!(range.contains(-100));
        assert!(range.contains(0));
        assert!(range.contains(99));
        assert!(!range.contains(100));
        assert!(!range.contains(-101));
    }

    #[test]
    fn test_tick_range_alignment_check() {
        let range = TickRange::new(-120, 180).unwrap();
        assert!(range.is_aligned(60));
        assert!(!range.is_aligned(100));
        assert!(!range.is_aligned(0));
    }

    #[test]
    fn test_price_position_from_tick() {
        let range = TickRange::new(100, 2000).unwrap();
        assert_eq!(PricePosition::from_tick(50, &range), PricePosition::BelowRange);
        assert_eq!(PricePosition::from_tick(100, &range), PricePosition::InRange);
        assert_eq!(PricePosition::from_tick(1999, &range), PricePosition::InRange);
        assert_eq!(PricePosition::from_tick(2000, &range), PricePosition::AboveRange);
    }

    #[test]
    fn test_price_position_from_sqrt_prices() {
        let q64 = 1u128 << 64;
        assert_eq!(
            PricePosition::from_sqrt_prices(q64 - 1, q64, q64 * 2).unwrap(),
            PricePosition::BelowRange
        );
        assert_eq!(
            PricePosition::from_sqrt_prices(q64, q64, q64 * 2).unwrap(),
            PricePosition::BelowRange
        );
        assert_eq!(
            PricePosition::from_sqrt_prices(q64 + 1, q64, q64 * 2).unwrap(),
            PricePosition::InRange
        );
        assert_eq!(
            PricePosition::from_sqrt_prices(q64 * 2, q64, q64 * 2).unwrap(),
            PricePosition::AboveRange
        );
        assert!(PricePosition::from_sqrt_prices(q64, q64, q64).is_err());
    }
}

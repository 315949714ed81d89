//! # rangekeeper
//!
//! Core engine for keeping a concentrated-liquidity position centered on a
//! pool's live price. It reproduces the on-chain CLMM fixed-point protocol
//! (Q64.64 sqrt prices over ticks in [-443636, 443636]) exactly, converts
//! between liquidity and token amounts in all three price regimes, derives
//! spacing-aligned replacement ranges, and decides when drift warrants a
//! rebalance.
//!
//! Everything in this crate is synchronous, single-threaded, and
//! side-effect-free: each call is a pure function over immutable snapshot
//! values that either returns a value or fails with a typed error. Chain
//! queries, transaction construction, signing, and retry policy belong to
//! external collaborators that consume [`PlanOutcome`] values.

pub mod config;
pub mod errors;
pub mod liquidity_math;
pub mod planner;
pub mod range;
pub mod rebalance;
pub mod tick_math;
pub mod types;

pub use config::RebalancerConfig;
pub use errors::{MathError, RebalancerError};
pub use planner::{PlanOutcome, RebalancePlan, RebalancePlanner};
pub use range::RangeCalculator;
pub use rebalance::RebalanceEngine;
pub use tick_math::{TickBounds, TickMath, MAX_SQRT_PRICE_X64, MAX_TICK, MIN_SQRT_PRICE_X64, MIN_TICK, Q64};
pub use types::{
    PoolSnapshot, PositionSnapshot, PricePosition, RebalanceDecision, TickRange, TokenAmounts,
};

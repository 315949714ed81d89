//! # Centralized Error Handling
//!
//! Typed, hierarchical errors for the rebalancing core. Every failure is a
//! deterministic function of the input values: there is no transient or
//! retryable class inside the core, and errors are never caught and
//! suppressed internally. Each variant carries the offending value and the
//! bound it violated so the caller can log and abort the evaluation cycle.

use thiserror::Error;

/// The top-level error type for the rebalancing core.
#[derive(Error, Debug)]
pub enum RebalancerError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Math error: {0}")]
    Math(#[from] MathError),
}

/// Errors raised by the tick/price/liquidity math engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MathError {
    #[error("tick {tick} outside bounds [{min}, {max}]")]
    TickOutOfBounds { tick: i32, min: i32, max: i32 },
    #[error("sqrt price {value} outside bounds [{min}, {max})")]
    SqrtPriceOutOfBounds { value: u128, min: u128, max: u128 },
    #[error("invalid tick range: lower {lower} must be strictly below upper {upper}")]
    InvalidTickRange { lower: i32, upper: i32 },
    #[error("range [{lower}, {upper}] cannot be aligned within tick bounds [{min}, {max}]")]
    RangeOutOfBounds {
        lower: i32,
        upper: i32,
        min: i32,
        max: i32,
    },
    #[error("invalid range parameter: {0}")]
    InvalidRangeParameter(String),
    #[error("position range [{lower}, {upper}] is not aligned to tick spacing {spacing}")]
    MisalignedRange { lower: i32, upper: i32, spacing: u32 },
    #[error("division domain: {0}")]
    DivisionDomain(String),
    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),
    #[error("amount {0} does not fit in u64")]
    AmountOverflow(u128),
    #[error("liquidity {0} does not fit in u128")]
    LiquidityOverflow(String),
    #[error("decimal price conversion failed: {0}")]
    DecimalConversion(String),
}

//! # Liquidity Math
//!
//! Conversions between position liquidity and token amounts in the Q64.64
//! sqrt-price domain, for all three price-relative-to-range regimes. These
//! are pure functions over the inputs with no external state lookups.
//!
//! Every division truncates toward zero, matching the on-chain rounding
//! direction, so amounts derived here are never optimistic when used to seed
//! minimum-output slippage bounds. Intermediate products run through
//! `U256`/`U512` so no precision is lost before the final division.

use crate::errors::MathError;
use crate::tick_math::Q64;
use crate::types::{PricePosition, TokenAmounts};
use primitive_types::{U256, U512};

/// Sorts a sqrt-price pair and rejects the degenerate cases the formulas
/// cannot express: zero-width ranges and a zero lower price.
fn normalize_sqrt_prices(sqrt_price_a: u128, sqrt_price_b: u128) -> Result<(u128, u128), MathError> {
    let (lower, upper) = if sqrt_price_a <= sqrt_price_b {
        (sqrt_price_a, sqrt_price_b)
    } else {
        (sqrt_price_b, sqrt_price_a)
    };
    if lower == upper {
        return Err(MathError::DivisionDomain(format!(
            "zero-width sqrt price range at {}",
            lower
        )));
    }
    if lower == 0 {
        return Err(MathError::DivisionDomain(
            "sqrt price lower bound is zero".into(),
        ));
    }
    Ok((lower, upper))
}

fn u512_to_u64(value: U512) -> Result<u64, MathError> {
    if value > U512::from(u64::MAX) {
        let clipped = if value > U512::from(u128::MAX) {
            u128::MAX
        } else {
            value.low_u128()
        };
        return Err(MathError::AmountOverflow(clipped));
    }
    Ok(value.low_u64())
}

/// `floor(liquidity * (sqrt_upper - sqrt_lower) * 2^64 / (sqrt_lower * sqrt_upper))`
///
/// The token-A amount held by `liquidity` between the two sqrt prices. The
/// pair is normalized internally, so argument order does not matter.
pub fn amount_a_from_liquidity(
    sqrt_price_a: u128,
    sqrt_price_b: u128,
    liquidity: u128,
) -> Result<u64, MathError> {
    let (lower, upper) = normalize_sqrt_prices(sqrt_price_a, sqrt_price_b)?;
    let numerator = U512::from(liquidity)
        .checked_mul(U512::from(upper - lower))
        .ok_or(MathError::Overflow("amount_a numerator"))?
        .checked_mul(U512::from(Q64))
        .ok_or(MathError::Overflow("amount_a numerator scale"))?;
    let denominator = U512::from(lower)
        .checked_mul(U512::from(upper))
        .ok_or(MathError::Overflow("amount_a denominator"))?;
    u512_to_u64(numerator / denominator)
}

/// `floor(liquidity * (sqrt_upper - sqrt_lower) / 2^64)`
///
/// The token-B amount held by `liquidity` between the two sqrt prices.
pub fn amount_b_from_liquidity(
    sqrt_price_a: u128,
    sqrt_price_b: u128,
    liquidity: u128,
) -> Result<u64, MathError> {
    let (lower, upper) = normalize_sqrt_prices(sqrt_price_a, sqrt_price_b)?;
    let product = U256::from(liquidity)
        .checked_mul(U256::from(upper - lower))
        .ok_or(MathError::Overflow("amount_b product"))?;
    let amount = product >> 64;
    if amount > U256::from(u64::MAX) {
        return Err(MathError::AmountOverflow(amount.low_u128()));
    }
    Ok(amount.low_u64())
}

/// `floor(amount_a * sqrt_lower * sqrt_upper / ((sqrt_upper - sqrt_lower) * 2^64))`
pub fn liquidity_from_amount_a(
    sqrt_price_a: u128,
    sqrt_price_b: u128,
    amount_a: u64,
) -> Result<u128, MathError> {
    let (lower, upper) = normalize_sqrt_prices(sqrt_price_a, sqrt_price_b)?;
    let numerator = U512::from(amount_a)
        .checked_mul(U512::from(lower))
        .ok_or(MathError::Overflow("liquidity_a numerator"))?
        .checked_mul(U512::from(upper))
        .ok_or(MathError::Overflow("liquidity_a numerator product"))?;
    let denominator = U512::from(upper - lower)
        .checked_mul(U512::from(Q64))
        .ok_or(MathError::Overflow("liquidity_a denominator"))?;
    let liquidity = numerator / denominator;
    if liquidity > U512::from(u128::MAX) {
        return Err(MathError::LiquidityOverflow(liquidity.to_string()));
    }
    Ok(liquidity.low_u128())
}

/// `floor(amount_b * 2^64 / (sqrt_upper - sqrt_lower))`
pub fn liquidity_from_amount_b(
    sqrt_price_a: u128,
    sqrt_price_b: u128,
    amount_b: u64,
) -> Result<u128, MathError> {
    let (lower, upper) = normalize_sqrt_prices(sqrt_price_a, sqrt_price_b)?;
    let numerator = U256::from(amount_b) << 64;
    let liquidity = numerator / U256::from(upper - lower);
    // numerator < 2^128, so the quotient always fits.
    Ok(liquidity.low_u128())
}

/// Maximum liquidity fundable by `amount_a` and `amount_b` at the current
/// price. When both tokens participate the limiting side wins; outside the
/// range only the single participating side is considered.
pub fn liquidity_from_amounts(
    sqrt_price_current: u128,
    sqrt_price_lower: u128,
    sqrt_price_upper: u128,
    amount_a: u64,
    amount_b: u64,
) -> Result<u128, MathError> {
    let position =
        PricePosition::from_sqrt_prices(sqrt_price_current, sqrt_price_lower, sqrt_price_upper)?;
    match position {
        PricePosition::BelowRange => {
            liquidity_from_amount_a(sqrt_price_lower, sqrt_price_upper, amount_a)
        }
        PricePosition::AboveRange => {
            liquidity_from_amount_b(sqrt_price_lower, sqrt_price_upper, amount_b)
        }
        PricePosition::InRange => {
            let from_a = liquidity_from_amount_a(sqrt_price_current, sqrt_price_upper, amount_a)?;
            let from_b = liquidity_from_amount_b(sqrt_price_lower, sqrt_price_current, amount_b)?;
            Ok(from_a.min(from_b))
        }
    }
}

/// The token amounts implied by `liquidity` at the current price, zero on
/// the side that does not participate in the active regime.
pub fn amounts_from_liquidity(
    sqrt_price_current: u128,
    sqrt_price_lower: u128,
    sqrt_price_upper: u128,
    liquidity: u128,
) -> Result<TokenAmounts, MathError> {
    let position =
        PricePosition::from_sqrt_prices(sqrt_price_current, sqrt_price_lower, sqrt_price_upper)?;
    let amounts = match position {
        PricePosition::BelowRange => TokenAmounts {
            amount_a: amount_a_from_liquidity(sqrt_price_lower, sqrt_price_upper, liquidity)?,
            amount_b: 0,
        },
        PricePosition::AboveRange => TokenAmounts {
            amount_a: 0,
            amount_b: amount_b_from_liquidity(sqrt_price_lower, sqrt_price_upper, liquidity)?,
        },
        PricePosition::InRange => TokenAmounts {
            amount_a: amount_a_from_liquidity(sqrt_price_current, sqrt_price_upper, liquidity)?,
            amount_b: amount_b_from_liquidity(sqrt_price_lower, sqrt_price_current, liquidity)?,
        },
    };
    Ok(amounts)
}

//! # Fixed-Point Tick Math
//!
//! Conversions between discrete tick indices and Q64.64 square-root prices,
//! reproducing the on-chain CLMM tick-math protocol bit for bit. All final
//! outputs come from integer bit-shift arithmetic; floating point is never
//! used for a value the chain will verify.
//!
//! A tick `t` denotes the price `1.0001^t`; the canonical on-chain encoding
//! is `sqrt(1.0001^t) * 2^64`, truncated. The forward conversion walks a
//! ladder of precomputed `sqrt(1.0001)^(2^i)` ratios selected by the bits of
//! `|t|`; the inverse recovers the tick from an integer base-2 logarithm.

use crate::errors::MathError;
use once_cell::sync::Lazy;
use primitive_types::U256;
use rust_decimal::Decimal;
use tracing::instrument;

/// The minimum tick supported by the protocol.
pub const MIN_TICK: i32 = -443636;
/// The maximum tick supported by the protocol.
pub const MAX_TICK: i32 = 443636;

/// `sqrt_price_x64` at `MIN_TICK`.
pub const MIN_SQRT_PRICE_X64: u128 = 4295048016;
/// `sqrt_price_x64` at `MAX_TICK`.
pub const MAX_SQRT_PRICE_X64: u128 = 79226673521066979257578248091;

/// Fixed-point scale: prices carry 64 fractional bits.
pub const Q64: u128 = 1u128 << 64;

/// Q64.64 encodings of `sqrt(1.0001)^(2^i)` for `i = 1..=18`, indexed by the
/// bits of `|tick|` above the lowest. The lowest bit uses
/// `0xfffcb933bd6fb800` (`sqrt(1/1.0001)` in Q64.64) as the ladder seed.
const RATIO_STEP_MULTIPLIERS: [u128; 18] = [
    0xfff97272373d4000,
    0xfff2e50f5f657000,
    0xffe5caca7e10f000,
    0xffcb9843d60f7000,
    0xff973b41fa98e800,
    0xff2ea16466c9b000,
    0xfe5dee046a9a3800,
    0xfcbe86c7900bb000,
    0xf987a7253ac65800,
    0xf3392b0822bb6000,
    0xe7159475a2caf000,
    0xd097f3bdfd2f2000,
    0xa9f746462d9f8000,
    0x70d869a156f31c00,
    0x31be135f97ed3200,
    0x9aa508b5b85a500,
    0x5d6af8dedc582c,
    0x2216e584f5fa,
];

static Q64_DECIMAL: Lazy<Decimal> = Lazy::new(|| Decimal::from_i128_with_scale(1i128 << 64, 0));

/// Tick-domain constants threaded into the math engines at construction.
///
/// `Default` gives the real protocol bounds; tests may narrow them to
/// synthetic values. Bounds wider than the protocol's are rejected because
/// the ratio ladder is only exact inside the protocol range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickBounds {
    pub min_tick: i32,
    pub max_tick: i32,
    pub min_sqrt_price_x64: u128,
    pub max_sqrt_price_x64: u128,
}

impl TickBounds {
    pub fn new(min_tick: i32, max_tick: i32) -> Result<Self, MathError> {
        if min_tick >= max_tick {
            return Err(MathError::InvalidTickRange {
                lower: min_tick,
                upper: max_tick,
            });
        }
        // The sqrt bounds are derived, keeping the struct internally
        // consistent for any narrowed tick interval.
        let min_sqrt_price_x64 = sqrt_price_at_tick_unchecked(min_tick)?;
        let max_sqrt_price_x64 = sqrt_price_at_tick_unchecked(max_tick)?;
        Ok(Self {
            min_tick,
            max_tick,
            min_sqrt_price_x64,
            max_sqrt_price_x64,
        })
    }

    pub fn contains_tick(&self, tick: i32) -> bool {
        self.min_tick <= tick && tick <= self.max_tick
    }
}

impl Default for TickBounds {
    fn default() -> Self {
        Self {
            min_tick: MIN_TICK,
            max_tick: MAX_TICK,
            min_sqrt_price_x64: MIN_SQRT_PRICE_X64,
            max_sqrt_price_x64: MAX_SQRT_PRICE_X64,
        }
    }
}

/// Tick/price conversion engine over an explicit set of bounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickMath {
    bounds: TickBounds,
}

impl TickMath {
    pub fn new(bounds: TickBounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> &TickBounds {
        &self.bounds
    }

    /// Computes `floor(sqrt(1.0001^tick) * 2^64)` exactly.
    ///
    /// Fails with `TickOutOfBounds` outside the configured bounds; the core
    /// never silently clamps.
    #[instrument(level = "trace", skip(self))]
    pub fn tick_to_sqrt_price_x64(&self, tick: i32) -> Result<u128, MathError> {
        if !self.bounds.contains_tick(tick) {
            return Err(MathError::TickOutOfBounds {
                tick,
                min: self.bounds.min_tick,
                max: self.bounds.max_tick,
            });
        }
        sqrt_price_at_tick_unchecked(tick)
    }

    /// Returns the greatest tick whose sqrt price does not exceed the input.
    ///
    /// The result is exact for ladder outputs and within one tick for any
    /// other in-bounds Q64.64 value.
    #[instrument(level = "trace", skip(self))]
    pub fn sqrt_price_x64_to_tick(&self, sqrt_price_x64: u128) -> Result<i32, MathError> {
        if sqrt_price_x64 < self.bounds.min_sqrt_price_x64
            || sqrt_price_x64 >= self.bounds.max_sqrt_price_x64
        {
            return Err(MathError::SqrtPriceOutOfBounds {
                value: sqrt_price_x64,
                min: self.bounds.min_sqrt_price_x64,
                max: self.bounds.max_sqrt_price_x64,
            });
        }

        // Integer base-2 log: integer part from the most significant bit,
        // fraction bits from repeated squaring of the normalized mantissa.
        let msb: u32 = 128 - sqrt_price_x64.leading_zeros() - 1;
        let log2p_integer_x32 = (i128::from(msb) - 64) << 32;

        let mut bit: i128 = 0x8000_0000_0000_0000;
        let mut precision = 0u32;
        let mut log2p_fraction_x64: i128 = 0;

        // Normalize so the mantissa sits in [2^63, 2^64); the squaring loop
        // preserves that invariant, so `r * r` stays below 2^128.
        let mut r = if msb >= 64 {
            sqrt_price_x64 >> (msb - 63)
        } else {
            sqrt_price_x64 << (63 - msb)
        };

        const BIT_PRECISION: u32 = 16;
        while bit > 0 && precision < BIT_PRECISION {
            r *= r;
            let is_r_more_than_two = r >> 127;
            r >>= 63 + is_r_more_than_two;
            log2p_fraction_x64 += bit * is_r_more_than_two as i128;
            bit >>= 1;
            precision += 1;
        }

        let log2p_fraction_x32 = log2p_fraction_x64 >> 32;
        let log2p_x32 = log2p_integer_x32 + log2p_fraction_x32;

        // Change of base: log2 -> log_sqrt(1.0001), with error margins that
        // bracket the true tick between two candidates.
        let log_sqrt_10001_x64 = log2p_x32 * 59543866431248i128;
        let tick_low = ((log_sqrt_10001_x64 - 184467440737095516i128) >> 64) as i32;
        let tick_high = ((log_sqrt_10001_x64 + 15793534762490258745i128) >> 64) as i32;

        let tick = if tick_low == tick_high {
            tick_low
        } else if sqrt_price_at_tick_unchecked(tick_high)? <= sqrt_price_x64 {
            tick_high
        } else {
            tick_low
        };
        Ok(tick)
    }

    /// Converts a Q64.64 sqrt price into a human-readable decimal price,
    /// adjusting raw integer units by `10^(decimals_b - decimals_a)`.
    #[instrument(level = "trace", skip(self))]
    pub fn sqrt_price_x64_to_decimal_price(
        &self,
        sqrt_price_x64: u128,
        decimals_a: u8,
        decimals_b: u8,
    ) -> Result<Decimal, MathError> {
        if sqrt_price_x64 < self.bounds.min_sqrt_price_x64
            || sqrt_price_x64 >= self.bounds.max_sqrt_price_x64
        {
            return Err(MathError::SqrtPriceOutOfBounds {
                value: sqrt_price_x64,
                min: self.bounds.min_sqrt_price_x64,
                max: self.bounds.max_sqrt_price_x64,
            });
        }

        let mantissa = i128::try_from(sqrt_price_x64)
            .map_err(|_| MathError::DecimalConversion(format!("{} exceeds i128", sqrt_price_x64)))?;
        let sqrt_dec = Decimal::try_from_i128_with_scale(mantissa, 0).map_err(|e| {
            MathError::DecimalConversion(format!("sqrt price {}: {}", sqrt_price_x64, e))
        })?;
        let sqrt_ratio = sqrt_dec
            .checked_div(*Q64_DECIMAL)
            .ok_or_else(|| MathError::DecimalConversion("Q64 scale division".into()))?;
        let mut price = sqrt_ratio.checked_mul(sqrt_ratio).ok_or_else(|| {
            MathError::DecimalConversion(format!("price overflow squaring {}", sqrt_ratio))
        })?;

        let exponent = i32::from(decimals_b) - i32::from(decimals_a);
        for _ in 0..exponent.unsigned_abs() {
            price = if exponent > 0 {
                price.checked_mul(Decimal::TEN)
            } else {
                price.checked_div(Decimal::TEN)
            }
            .ok_or_else(|| {
                MathError::DecimalConversion(format!(
                    "decimal adjustment 10^{} overflowed",
                    exponent
                ))
            })?;
        }
        Ok(price)
    }
}

/// Ladder walk over the protocol's ratio table. Callers are responsible for
/// bounds policy; this only rejects ticks the table itself cannot represent.
fn sqrt_price_at_tick_unchecked(tick: i32) -> Result<u128, MathError> {
    let abs_tick = tick.unsigned_abs();
    if abs_tick > MAX_TICK as u32 {
        return Err(MathError::TickOutOfBounds {
            tick,
            min: MIN_TICK,
            max: MAX_TICK,
        });
    }

    let mut ratio: U256 = if abs_tick & 0x1 != 0 {
        U256::from(0xfffcb933bd6fb800u128)
    } else {
        U256::one() << 64
    };
    for (step, multiplier) in RATIO_STEP_MULTIPLIERS.iter().enumerate() {
        if abs_tick & (0x2u32 << step) != 0 {
            ratio = ratio
                .checked_mul(U256::from(*multiplier))
                .ok_or(MathError::Overflow("tick ratio ladder"))?
                >> 64;
        }
    }

    // The ladder computes the negative-tick ratio; positive ticks take the
    // reciprocal in the full 128-bit domain.
    if tick > 0 {
        ratio = U256::from(u128::MAX) / ratio;
    }

    u128::try_from(ratio).map_err(|_| MathError::Overflow("tick ratio exceeds u128"))
}

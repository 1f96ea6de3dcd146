//! Core pricing calculation functions.
//!
//! Pure functions for pricing math - no database access.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;

/// Round to specified decimal places using banker's rounding (ROUND_HALF_EVEN).
///
/// Banker's rounding rounds to the nearest even number when the value is exactly
/// halfway between two possibilities. This reduces cumulative rounding bias.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use carsrus_booking::pricing::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(2));   // rounds to even
/// assert_eq!(round_money(dec!(3.5), 0), dec!(4));   // rounds to even
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

/// Number of billable days in a booking.
///
/// Both boundary days count: a pickup day and a return day are each one
/// rental day, so a same-day booking bills one day.
pub fn billable_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days().abs() + 1
}

/// Price of a booking at `rate` per day, rounded to cents.
///
/// Callers reject inverted ranges before calling; see [`quote`].
pub fn price(rate: Decimal, start: NaiveDate, end: NaiveDate) -> Decimal {
    round_money(rate * Decimal::from(billable_days(start, end)), 2)
}

/// Priced booking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    #[serde(with = "rust_decimal::serde::str")]
    pub rate: Decimal,
    pub billable_days: i64,
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
}

/// Pricing calculation error types
#[derive(Debug, Clone, PartialEq)]
pub enum PricingError {
    InvertedRange { start: NaiveDate, end: NaiveDate },
    RateUnavailable,
}

impl fmt::Display for PricingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingError::InvertedRange { start, end } => {
                write!(f, "End date {} is before start date {}", end, start)
            }
            PricingError::RateUnavailable => write!(f, "Pricing unavailable for this resource"),
        }
    }
}

impl std::error::Error for PricingError {}

/// Quote a booking, rejecting inverted ranges and missing rates.
///
/// A zero or absent rate would price the booking at nothing; that is
/// reported as `RateUnavailable` instead of producing a free booking.
pub fn quote(rate: Option<Decimal>, start: NaiveDate, end: NaiveDate) -> Result<Quote, PricingError> {
    if end < start {
        return Err(PricingError::InvertedRange { start, end });
    }

    let rate = match rate {
        Some(r) if r > Decimal::ZERO => r,
        _ => return Err(PricingError::RateUnavailable),
    };

    Ok(Quote {
        rate,
        billable_days: billable_days(start, end),
        total: price(rate, start, end),
    })
}

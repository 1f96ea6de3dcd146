//! Request DTOs for pricing and currency endpoints.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::currency::Currency;

/// Query for a booking quote
#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub currency: Option<Currency>,
}

/// Request to change the display currency
#[derive(Debug, Deserialize)]
pub struct SelectCurrencyRequest {
    pub currency: Currency,
}

/// Query to format a base amount
#[derive(Debug, Deserialize)]
pub struct FormatQuery {
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    #[serde(default)]
    pub currency: Option<Currency>,
}

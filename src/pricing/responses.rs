//! Response DTOs for pricing and currency endpoints.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::currency::{Currency, CurrencyService, RateTable};

/// Money value for JSON responses
#[derive(Debug, Clone, Serialize)]
pub struct MoneyResponse {
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: Currency,
}

/// A base-currency amount alongside its display rendering
#[derive(Debug, Clone, Serialize)]
pub struct DisplayMoney {
    pub base: MoneyResponse,
    pub display: MoneyResponse,
    pub formatted: String,
}

impl DisplayMoney {
    pub fn new(currency: &CurrencyService, amount_in_base: Decimal, display: Currency) -> Self {
        let rates = currency.snapshot();
        Self {
            base: MoneyResponse {
                amount: amount_in_base,
                currency: super::BASE_CURRENCY,
            },
            display: MoneyResponse {
                amount: super::round_money(rates.convert(amount_in_base, display), 2),
                currency: display,
            },
            formatted: currency.format_in(amount_in_base, display),
        }
    }
}

/// Response for a booking quote
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub resource_id: Uuid,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub billable_days: i64,
    pub rate: DisplayMoney,
    pub total: DisplayMoney,
}

/// Response describing the currency context
#[derive(Debug, Serialize)]
pub struct CurrencyResponse {
    pub base: Currency,
    pub display: Currency,
    pub symbol: &'static str,
    #[serde(serialize_with = "serialize_rates")]
    pub rates: BTreeMap<Currency, Decimal>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl CurrencyResponse {
    pub fn new(display: Currency, table: &RateTable) -> Self {
        Self {
            base: super::BASE_CURRENCY,
            display,
            symbol: display.symbol(),
            rates: table.rates().clone(),
            fetched_at: table.fetched_at,
        }
    }
}

fn serialize_rates<S>(rates: &BTreeMap<Currency, Decimal>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeMap;

    let mut map = serializer.serialize_map(Some(rates.len()))?;
    for (currency, rate) in rates {
        map.serialize_entry(currency.code(), &rate.to_string())?;
    }
    map.end()
}

/// Response for formatting a base amount
#[derive(Debug, Serialize)]
pub struct FormatResponse {
    pub amount: DisplayMoney,
}

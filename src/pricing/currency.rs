//! Display-currency conversion.
//!
//! All prices are stored in the base currency (MUR). The rate table is held
//! in a `watch` channel: the refresh task owns the only `RateWriter`, and
//! every reader borrows an `Arc` snapshot, so a refresh in progress never
//! blocks a conversion.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::calculators::round_money;

/// Currencies the storefront can display
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Mur,
    Zar,
    Gbp,
    Eur,
    Aud,
}

/// Currency every rate and stored amount is expressed against
pub const BASE_CURRENCY: Currency = Currency::Mur;

impl Currency {
    pub const ALL: [Currency; 5] = [
        Currency::Mur,
        Currency::Zar,
        Currency::Gbp,
        Currency::Eur,
        Currency::Aud,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Mur => "MUR",
            Currency::Zar => "ZAR",
            Currency::Gbp => "GBP",
            Currency::Eur => "EUR",
            Currency::Aud => "AUD",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Mur => "Rs",
            Currency::Zar => "R",
            Currency::Gbp => "£",
            Currency::Eur => "€",
            Currency::Aud => "A$",
        }
    }

    /// Static multiplier used until the first successful feed refresh
    pub fn fallback_rate(&self) -> Decimal {
        match self {
            Currency::Mur => Decimal::ONE,
            Currency::Zar => dec!(0.35),
            Currency::Gbp => dec!(0.017),
            Currency::Eur => dec!(0.020),
            Currency::Aud => dec!(0.032),
        }
    }

    /// Pick a display currency from an ISO country code.
    ///
    /// Unmapped countries get EUR.
    pub fn for_country(country_code: &str) -> Currency {
        match country_code.trim().to_ascii_uppercase().as_str() {
            "MU" => Currency::Mur,
            "ZA" => Currency::Zar,
            "GB" => Currency::Gbp,
            "FR" => Currency::Eur,
            "AU" => Currency::Aud,
            _ => Currency::Eur,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unsupported currency '{}'", s))
    }
}

/// Multipliers against the base currency.
///
/// Replaced wholesale on each refresh; never partially updated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateTable {
    rates: BTreeMap<Currency, Decimal>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl RateTable {
    /// The static table used before any feed data arrives
    pub fn fallback() -> Self {
        Self {
            rates: Currency::ALL.into_iter().map(|c| (c, c.fallback_rate())).collect(),
            fetched_at: None,
        }
    }

    /// Build a table from a feed payload keyed by currency code.
    ///
    /// Codes missing from the payload, or carrying a non-positive rate, keep
    /// their fallback value. The base currency is always exactly one.
    pub fn from_feed(feed: &HashMap<String, Decimal>, fetched_at: DateTime<Utc>) -> Self {
        let rates = Currency::ALL
            .into_iter()
            .map(|c| {
                let rate = if c == BASE_CURRENCY {
                    Decimal::ONE
                } else {
                    feed.get(c.code())
                        .copied()
                        .filter(|r| *r > Decimal::ZERO)
                        .unwrap_or_else(|| c.fallback_rate())
                };
                (c, rate)
            })
            .collect();

        Self {
            rates,
            fetched_at: Some(fetched_at),
        }
    }

    pub fn rate(&self, currency: Currency) -> Decimal {
        self.rates
            .get(&currency)
            .copied()
            .unwrap_or_else(|| currency.fallback_rate())
    }

    pub fn rates(&self) -> &BTreeMap<Currency, Decimal> {
        &self.rates
    }

    /// Base amount expressed in `currency`
    pub fn convert(&self, amount_in_base: Decimal, currency: Currency) -> Decimal {
        amount_in_base * self.rate(currency)
    }

    /// Amount in `currency` expressed back in base units
    pub fn to_base(&self, amount: Decimal, currency: Currency) -> Decimal {
        amount / self.rate(currency)
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self::fallback()
    }
}

/// Sole handle allowed to replace the rate table
pub struct RateWriter {
    tx: watch::Sender<Arc<RateTable>>,
}

impl RateWriter {
    pub fn replace(&self, table: RateTable) {
        self.tx.send_replace(Arc::new(table));
    }

    pub fn current(&self) -> Arc<RateTable> {
        self.tx.borrow().clone()
    }
}

/// Shared rate context passed to everything that displays a price.
///
/// The display currency itself belongs to each client; this only holds the
/// default used when a request does not name one.
pub struct CurrencyService {
    rates: watch::Receiver<Arc<RateTable>>,
    default_display: Currency,
}

impl CurrencyService {
    /// Create the service with fallback rates and the given default display
    /// currency.
    ///
    /// The returned writer belongs to the refresh task.
    pub fn new(default_display: Currency) -> (Self, RateWriter) {
        let (tx, rates) = watch::channel(Arc::new(RateTable::fallback()));
        (
            Self {
                rates,
                default_display,
            },
            RateWriter { tx },
        )
    }

    /// Immutable view of the current rate table
    pub fn snapshot(&self) -> Arc<RateTable> {
        self.rates.borrow().clone()
    }

    /// Display currency for requests that do not choose one
    pub fn default_currency(&self) -> Currency {
        self.default_display
    }

    pub fn convert_to(&self, amount_in_base: Decimal, currency: Currency) -> Decimal {
        self.snapshot().convert(amount_in_base, currency)
    }

    /// Base amount formatted in the default display currency, e.g. `€ 60.00`
    pub fn format(&self, amount_in_base: Decimal) -> String {
        self.format_in(amount_in_base, self.default_currency())
    }

    pub fn format_in(&self, amount_in_base: Decimal, currency: Currency) -> String {
        let converted = round_money(self.convert_to(amount_in_base, currency), 2);
        format!("{} {:.2}", currency.symbol(), converted)
    }
}

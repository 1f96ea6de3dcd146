//! Pricing module for the booking engine.
//!
//! Duration-based booking prices in the base currency, and conversion of
//! those prices into the visitor's display currency.

pub mod calculators;
pub mod currency;
pub mod feed;
pub mod requests;
pub mod responses;

// Re-export commonly used items
pub use calculators::{billable_days, price, quote, round_money, PricingError, Quote};
pub use currency::{Currency, CurrencyService, RateTable, RateWriter, BASE_CURRENCY};
pub use feed::{detect_display_currency, refresh_rates, run_rate_refresher, HttpExchangeClient};

//! Exchange rate feed and the background refresher.
//!
//! Feed failures never reach callers: the refresher logs them and keeps the
//! last good table, and display-currency detection falls back to the base
//! currency.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::currency::{Currency, RateTable, RateWriter, BASE_CURRENCY};

/// Rate feed error types
#[derive(Debug, thiserror::Error)]
pub enum RateFeedError {
    #[error("Rate feed request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Rate feed returned no usable rates")]
    Empty,

    #[error("Geolocation returned no country code")]
    NoCountry,
}

/// Source of current exchange rates against the base currency
#[async_trait]
pub trait RateFeed: Send + Sync {
    async fn latest_rates(&self) -> Result<HashMap<String, Decimal>, RateFeedError>;
}

/// Source of the client's country, consulted once at startup
#[async_trait]
pub trait GeoLocator: Send + Sync {
    async fn country_code(&self) -> Result<String, RateFeedError>;
}

#[derive(Debug, Deserialize)]
struct LatestRatesBody {
    rates: HashMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct GeoBody {
    country_code: Option<String>,
}

/// HTTP client for the public rate feed and geolocation endpoints
#[derive(Debug, Clone)]
pub struct HttpExchangeClient {
    client: reqwest::Client,
    rates_url: String,
    geo_url: String,
}

impl HttpExchangeClient {
    /// Every request made through this client is bounded by `timeout`
    pub fn new(rates_url: impl Into<String>, geo_url: impl Into<String>, timeout: Duration) -> Result<Self, RateFeedError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            rates_url: rates_url.into(),
            geo_url: geo_url.into(),
        })
    }
}

#[async_trait]
impl RateFeed for HttpExchangeClient {
    async fn latest_rates(&self) -> Result<HashMap<String, Decimal>, RateFeedError> {
        let body: LatestRatesBody = self
            .client
            .get(&self.rates_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let rates: HashMap<String, Decimal> = body
            .rates
            .into_iter()
            .filter_map(|(code, rate)| Decimal::try_from(rate).ok().map(|r| (code, r)))
            .collect();

        if rates.is_empty() {
            return Err(RateFeedError::Empty);
        }
        Ok(rates)
    }
}

#[async_trait]
impl GeoLocator for HttpExchangeClient {
    async fn country_code(&self) -> Result<String, RateFeedError> {
        let body: GeoBody = self
            .client
            .get(&self.geo_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        body.country_code
            .filter(|code| !code.trim().is_empty())
            .ok_or(RateFeedError::NoCountry)
    }
}

/// Pick the initial display currency from the caller's location.
///
/// Any failure yields the base currency.
pub async fn detect_display_currency(geo: &dyn GeoLocator) -> Currency {
    match geo.country_code().await {
        Ok(country) => {
            let currency = Currency::for_country(&country);
            info!("Detected country {}, displaying prices in {}", country, currency);
            currency
        }
        Err(e) => {
            warn!("Could not detect location, using {}: {}", BASE_CURRENCY, e);
            BASE_CURRENCY
        }
    }
}

/// Fetch once and swap in the new table.
///
/// Returns whether the table was replaced; on failure the previous table
/// stays in place.
pub async fn refresh_rates(writer: &RateWriter, feed: &dyn RateFeed) -> bool {
    match feed.latest_rates().await {
        Ok(rates) => {
            let table = RateTable::from_feed(&rates, Utc::now());
            debug!("Exchange rates refreshed: {:?}", table.rates());
            writer.replace(table);
            true
        }
        Err(e) => {
            warn!("Could not refresh exchange rates, keeping previous table: {}", e);
            false
        }
    }
}

/// Start background rate refresher
///
/// Refreshes immediately, then every `period`, until `shutdown` flips to
/// true or its sender is dropped.
pub async fn run_rate_refresher(
    writer: RateWriter,
    feed: Arc<dyn RateFeed>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                refresh_rates(&writer, feed.as_ref()).await;
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("Exchange rate refresher stopped");
                    break;
                }
            }
        }
    }
}

//! CarsRus booking engine
//!
//! Availability, pricing and reservation commit for the rental storefront,
//! served over HTTP with axum.

pub mod booking;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod pricing;
pub mod routes;

use std::sync::Arc;

use booking::{BookingEngine, IntakeService};
use cache::AppCache;
use pricing::CurrencyService;

pub use routes::router;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: BookingEngine,
    pub intake: IntakeService,
    pub currency: Arc<CurrencyService>,
    pub cache: AppCache,
}

impl AppState {
    pub fn new(engine: BookingEngine, currency: Arc<CurrencyService>, cache: AppCache) -> Self {
        Self {
            intake: IntakeService::new(engine.clone(), cache.clone()),
            engine,
            currency,
            cache,
        }
    }
}

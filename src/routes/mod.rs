//! HTTP route handlers

pub mod bookings;
pub mod currency;
pub mod identity;
pub mod resources;

use axum::{
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // Catalog
        .route("/api/resources", get(resources::list).post(resources::create))
        .route("/api/admin/resources", get(resources::managed))
        .route("/api/resources/:id", axum::routing::delete(resources::delete))
        .route("/api/resources/:id/availability", get(resources::availability))
        .route(
            "/api/resources/:id/availability/:date",
            get(resources::date_availability),
        )
        .route("/api/resources/:id/quote", get(resources::quote))
        // Intake
        .route("/api/bookings", get(bookings::list).post(bookings::submit_modal))
        .route("/api/bookings/vehicle", post(bookings::submit_vehicle))
        .route("/api/bookings/experience", post(bookings::submit_experience))
        .route("/api/bookings/:id", get(bookings::get))
        .route("/api/bookings/:id/cancel", post(bookings::cancel))
        .route(
            "/api/bookings/:id/payment-status",
            put(bookings::update_payment_status),
        )
        .route("/bookings/:id/confirmation", get(bookings::confirmation))
        // Currency
        .route("/api/currency", get(currency::show).put(currency::select))
        .route("/api/currency/format", get(currency::format))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health(axum::extract::State(state): axum::extract::State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "cache": state.cache.stats(),
    }))
}

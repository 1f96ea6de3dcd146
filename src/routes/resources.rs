//! Resource catalog, availability and quote handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{NewResource, Principal, Resource, ResourceKind};
use crate::pricing::requests::QuoteQuery;
use crate::pricing::responses::{DisplayMoney, QuoteResponse};
use crate::AppState;

use super::currency::DisplayCurrency;

#[derive(Debug, Deserialize)]
pub struct ResourceListQuery {
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub resource_id: Uuid,
    pub occupied_days: Vec<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct DateAvailabilityResponse {
    pub resource_id: Uuid,
    pub date: NaiveDate,
    pub free: bool,
}

/// Storefront listing, newest first
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ResourceListQuery>,
) -> Result<Json<Vec<Resource>>> {
    let kind = match query.kind.as_deref().filter(|k| !k.is_empty()) {
        Some(raw) => Some(raw.parse::<ResourceKind>().map_err(AppError::bad_request)?),
        None => None,
    };
    Ok(Json(state.engine.resources(kind).await?))
}

/// Admin listing: the caller's own resources, or all for superusers
pub async fn managed(State(state): State<AppState>, principal: Principal) -> Result<Json<Vec<Resource>>> {
    Ok(Json(state.engine.managed_resources(&principal).await?))
}

pub async fn create(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<NewResource>,
) -> Result<(StatusCode, Json<Resource>)> {
    let resource = state.engine.create_resource(payload, &principal).await?;
    Ok((StatusCode::CREATED, Json(resource)))
}

pub async fn delete(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.engine.delete_resource(id, &principal).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Occupied calendar days, ascending
pub async fn availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AvailabilityResponse>> {
    let occupied = state.engine.occupied_days(id).await?;
    Ok(Json(AvailabilityResponse {
        resource_id: id,
        occupied_days: occupied.into_iter().collect(),
    }))
}

pub async fn date_availability(
    State(state): State<AppState>,
    Path((id, date)): Path<(Uuid, NaiveDate)>,
) -> Result<Json<DateAvailabilityResponse>> {
    let free = state.engine.is_date_free(id, date).await?;
    Ok(Json(DateAvailabilityResponse {
        resource_id: id,
        date,
        free,
    }))
}

/// Price a date range, shown in the caller's display currency
pub async fn quote(
    State(state): State<AppState>,
    display: DisplayCurrency,
    Path(id): Path<Uuid>,
    Query(query): Query<QuoteQuery>,
) -> Result<Json<QuoteResponse>> {
    let quote = state.engine.quote(id, query.start, query.end).await?;
    let display = display.or_query(query.currency);

    Ok(Json(QuoteResponse {
        resource_id: id,
        start: query.start,
        end: query.end,
        billable_days: quote.billable_days,
        rate: DisplayMoney::new(&state.currency, quote.rate, display),
        total: DisplayMoney::new(&state.currency, quote.total, display),
    }))
}

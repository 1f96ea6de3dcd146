//! Booking intake, lookup, cancellation and receipt handlers

use std::io::Cursor;

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    Json,
};
use base64::Engine as _;
use chrono::NaiveDate;
use qrcode::QrCode;
use serde::Deserialize;
use uuid::Uuid;

use crate::booking::{
    ExperienceBookingForm, IntakeForm, IntakeOutcome, ModalBookingForm, VehicleBookingForm,
};
use crate::error::{AppError, Result};
use crate::models::{PaymentStatus, Principal, Reservation};
use crate::pricing::{Currency, BASE_CURRENCY};
use crate::AppState;

use super::currency::DisplayCurrency;
use super::identity::MaybePrincipal;

#[derive(Debug, Deserialize)]
pub struct ReservationListQuery {
    pub resource_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ReceiptQuery {
    #[serde(default)]
    pub currency: Option<Currency>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentStatusRequest {
    pub status: PaymentStatus,
}

/// Receipt page template
#[derive(Template)]
#[template(path = "booking/confirmation.html")]
struct ConfirmationTemplate {
    reference: String,
    resource_name: String,
    resource_kind: String,
    customer_name: String,
    customer_email: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    single_day: bool,
    has_locations: bool,
    pickup_location: String,
    dropoff_location: String,
    total_formatted: String,
    total_base: String,
    show_base: bool,
    payment_status: String,
    qr_data_uri: String,
}

async fn submit<F: IntakeForm>(
    state: &AppState,
    form: F,
    principal: MaybePrincipal,
) -> Result<(StatusCode, Json<IntakeOutcome>)> {
    let outcome = state.intake.submit(form, principal.user_id()).await?;
    let status = match outcome {
        IntakeOutcome::Confirmed { .. } => StatusCode::CREATED,
        IntakeOutcome::DatesUnavailable { .. } => StatusCode::CONFLICT,
    };
    Ok((status, Json(outcome)))
}

pub async fn submit_vehicle(
    State(state): State<AppState>,
    principal: MaybePrincipal,
    Json(form): Json<VehicleBookingForm>,
) -> Result<(StatusCode, Json<IntakeOutcome>)> {
    submit(&state, form, principal).await
}

pub async fn submit_experience(
    State(state): State<AppState>,
    principal: MaybePrincipal,
    Json(form): Json<ExperienceBookingForm>,
) -> Result<(StatusCode, Json<IntakeOutcome>)> {
    submit(&state, form, principal).await
}

pub async fn submit_modal(
    State(state): State<AppState>,
    principal: MaybePrincipal,
    Json(form): Json<ModalBookingForm>,
) -> Result<(StatusCode, Json<IntakeOutcome>)> {
    submit(&state, form, principal).await
}

/// Reservations the caller may see, newest first, optionally for one
/// resource
pub async fn list(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<ReservationListQuery>,
) -> Result<Json<Vec<Reservation>>> {
    Ok(Json(
        state
            .engine
            .reservations_visible_to(&principal, query.resource_id)
            .await?,
    ))
}

pub async fn get(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<Reservation>> {
    Ok(Json(state.engine.reservation_as(id, &principal).await?))
}

pub async fn cancel(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<Reservation>> {
    Ok(Json(state.engine.cancel_as(id, &principal).await?))
}

/// Called by the payment collaborator, which authenticates as a superuser
pub async fn update_payment_status(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(body): Json<PaymentStatusRequest>,
) -> Result<Json<Reservation>> {
    if !principal.is_superuser {
        return Err(AppError::Forbidden(
            "Only the payment service may change payment status".to_string(),
        ));
    }
    Ok(Json(state.engine.update_payment_status(id, body.status).await?))
}

/// Receipt step shown after a confirmed submission
pub async fn confirmation(
    State(state): State<AppState>,
    display: DisplayCurrency,
    Path(id): Path<Uuid>,
    Query(query): Query<ReceiptQuery>,
) -> Result<Html<String>> {
    let reservation = state.engine.reservation(id).await?;
    let resource_name = match state.engine.resource(reservation.resource_id).await {
        Ok(resource) => resource.name,
        Err(e) => {
            tracing::warn!("Receipt {} rendered without resource details: {}", id, e);
            reservation.resource_kind.to_string()
        }
    };

    let display = display.or_query(query.currency);
    let reference = short_reference(reservation.id);
    let qr_data_uri = qr_data_uri(&format!("CARSRUS:{}", reservation.id))?;

    let template = ConfirmationTemplate {
        reference,
        resource_name,
        resource_kind: reservation.resource_kind.to_string(),
        customer_name: reservation.customer.name,
        customer_email: reservation.customer.email,
        start_date: reservation.start_date,
        end_date: reservation.end_date,
        single_day: reservation.start_date == reservation.end_date,
        has_locations: !reservation.pickup_location.is_empty(),
        pickup_location: reservation.pickup_location,
        dropoff_location: reservation.dropoff_location,
        total_formatted: state.currency.format_in(reservation.total_amount, display),
        total_base: state.currency.format_in(reservation.total_amount, BASE_CURRENCY),
        show_base: display != BASE_CURRENCY,
        payment_status: reservation.payment_status.to_string(),
        qr_data_uri,
    };

    Ok(Html(template.render()?))
}

/// First eight hex digits of the reservation id, upper-cased
pub fn short_reference(id: Uuid) -> String {
    id.simple().to_string()[..8].to_ascii_uppercase()
}

/// PNG QR code of `payload` as a `data:` URI
pub fn qr_data_uri(payload: &str) -> Result<String> {
    let code = QrCode::new(payload.as_bytes()).map_err(|e| AppError::Internal(e.to_string()))?;
    let image = code
        .render::<image::Luma<u8>>()
        .min_dimensions(200, 200)
        .build();

    let mut png = Vec::new();
    image::DynamicImage::ImageLuma8(image)
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    ))
}

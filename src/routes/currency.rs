//! Display currency handlers.
//!
//! The display currency is chosen per client: the storefront keeps the
//! visitor's selection and sends it as `X-Display-Currency` (or a
//! `currency` query parameter). Requests without one get the default
//! detected at startup.

use axum::{
    async_trait,
    extract::{FromRequestParts, Query, State},
    http::{request::Parts, HeaderName, HeaderValue},
    response::{AppendHeaders, IntoResponse},
    Json,
};

use crate::error::AppError;
use crate::pricing::requests::{FormatQuery, SelectCurrencyRequest};
use crate::pricing::responses::{CurrencyResponse, DisplayMoney, FormatResponse};
use crate::pricing::Currency;
use crate::AppState;

pub const DISPLAY_CURRENCY_HEADER: &str = "X-Display-Currency";

/// The display currency the calling client selected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayCurrency(pub Currency);

impl DisplayCurrency {
    /// An explicit `currency` query parameter wins over the header
    pub fn or_query(self, query: Option<Currency>) -> Currency {
        query.unwrap_or(self.0)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for DisplayCurrency {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match parts.headers.get(DISPLAY_CURRENCY_HEADER) {
            None => Ok(Self(state.currency.default_currency())),
            Some(value) => value
                .to_str()
                .map_err(|_| AppError::bad_request("display currency header is not text"))?
                .parse::<Currency>()
                .map(Self)
                .map_err(AppError::bad_request),
        }
    }
}

/// The caller's display currency and the current rate snapshot
pub async fn show(State(state): State<AppState>, display: DisplayCurrency) -> Json<CurrencyResponse> {
    Json(CurrencyResponse::new(display.0, &state.currency.snapshot()))
}

/// Confirm a selection for the calling client.
///
/// Nothing is stored server side; the response echoes the header the client
/// sends from now on.
pub async fn select(
    State(state): State<AppState>,
    Json(body): Json<SelectCurrencyRequest>,
) -> impl IntoResponse {
    tracing::debug!("Client selected display currency {}", body.currency);
    let header = HeaderValue::from_static(body.currency.code());
    (
        AppendHeaders([(HeaderName::from_static("x-display-currency"), header)]),
        Json(CurrencyResponse::new(body.currency, &state.currency.snapshot())),
    )
}

pub async fn format(
    State(state): State<AppState>,
    display: DisplayCurrency,
    Query(query): Query<FormatQuery>,
) -> Json<FormatResponse> {
    let currency = display.or_query(query.currency);
    Json(FormatResponse {
        amount: DisplayMoney::new(&state.currency, query.amount, currency),
    })
}

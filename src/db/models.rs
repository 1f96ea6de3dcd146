//! Row types for the booking tables.
//!
//! These models use sqlx's FromRow derive for direct database deserialization
//! and convert into the domain types, rejecting values the domain cannot hold.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::{CustomerInfo, OccupiedDayEntry, PaymentStatus, Reservation, Resource, ResourceKind};

use super::StoreError;

/// Row from `resources`
#[derive(Debug, Clone, FromRow)]
pub struct ResourceRow {
    pub id: Uuid,
    pub kind: String,
    pub name: String,
    pub description: String,
    pub rate: Option<Decimal>,
    pub duration_hours: Option<i32>,
    pub owner_id: Uuid,
    pub image_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ResourceRow> for Resource {
    type Error = StoreError;

    fn try_from(row: ResourceRow) -> Result<Self, Self::Error> {
        Ok(Resource {
            id: row.id,
            kind: row.kind.parse::<ResourceKind>().map_err(StoreError::Corrupt)?,
            name: row.name,
            description: row.description,
            rate: row.rate,
            duration_hours: row.duration_hours,
            owner_id: row.owner_id,
            image_urls: row.image_urls,
            created_at: row.created_at,
        })
    }
}

/// Row from `reservations`
#[derive(Debug, Clone, FromRow)]
pub struct ReservationRow {
    pub id: Uuid,
    pub resource_id: Uuid,
    pub resource_kind: String,
    pub user_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_amount: Decimal,
    pub payment_status: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = StoreError;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        Ok(Reservation {
            id: row.id,
            resource_id: row.resource_id,
            resource_kind: row
                .resource_kind
                .parse::<ResourceKind>()
                .map_err(StoreError::Corrupt)?,
            user_id: row.user_id,
            customer: CustomerInfo {
                name: row.customer_name,
                email: row.customer_email,
                phone: row.customer_phone,
            },
            pickup_location: row.pickup_location,
            dropoff_location: row.dropoff_location,
            start_date: row.start_date,
            end_date: row.end_date,
            total_amount: row.total_amount,
            payment_status: row
                .payment_status
                .parse::<PaymentStatus>()
                .map_err(StoreError::Corrupt)?,
            created_at: row.created_at,
        })
    }
}

/// Row from `occupied_days`
#[derive(Debug, Clone, Copy, FromRow)]
pub struct OccupiedDayRow {
    pub resource_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reservation_id: Uuid,
}

impl From<OccupiedDayRow> for OccupiedDayEntry {
    fn from(row: OccupiedDayRow) -> Self {
        OccupiedDayEntry {
            resource_id: row.resource_id,
            start_date: row.start_date,
            end_date: row.end_date,
            reservation_id: row.reservation_id,
        }
    }
}

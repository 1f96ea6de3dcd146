//! Persistence store access
//!
//! `BookingStore` is the record-oriented interface the engine talks to.
//! `PgBookingStore` backs it with Postgres, where an exclusion constraint on
//! `occupied_days` is the source of truth for "no overlapping bookings".
//! `MemoryBookingStore` serializes all writes behind one lock and performs
//! the same overlap check, for tests and local runs without a database.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, warn};
use uuid::Uuid;

use crate::models::{OccupiedDayEntry, PaymentStatus, Reservation, Resource, ResourceKind};

pub mod memory;
pub mod models;
pub mod postgres;
pub mod queries;

pub use memory::MemoryBookingStore;
pub use postgres::PgBookingStore;

/// SQLSTATE raised by Postgres when an exclusion constraint rejects a row
const EXCLUSION_VIOLATION: &str = "23P01";

/// How many times the occupied-day write is attempted before the
/// reservation written ahead of it is rolled back
pub const OCCUPIED_WRITE_ATTEMPTS: u32 = 3;

/// Store error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    #[error("Date range overlaps an existing reservation")]
    Overlap,

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Cannot move a {from} reservation to {to}")]
    InvalidTransition { from: PaymentStatus, to: PaymentStatus },

    #[error("Resource still has reservations holding dates")]
    InUse,

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db) if db.code().as_deref() == Some(EXCLUSION_VIOLATION) => {
                StoreError::Overlap
            }
            _ => StoreError::Unavailable(err.to_string()),
        }
    }
}

/// Record CRUD over `resources`, `reservations` and `occupied_days`.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn insert_resource(&self, resource: &Resource) -> Result<(), StoreError>;

    async fn get_resource(&self, id: Uuid) -> Result<Resource, StoreError>;

    /// Newest first
    async fn list_resources(
        &self,
        kind: Option<ResourceKind>,
        owner_id: Option<Uuid>,
    ) -> Result<Vec<Resource>, StoreError>;

    /// Fails with `StoreError::InUse` while pending or paid reservations
    /// point at the resource. The check and the delete are one unit, and
    /// a reservation cannot be written for a resource being deleted.
    async fn delete_resource(&self, id: Uuid) -> Result<(), StoreError>;

    /// Occupied-day entries for one resource, ordered by start date
    async fn occupied_entries(&self, resource_id: Uuid) -> Result<Vec<OccupiedDayEntry>, StoreError>;

    async fn get_reservation(&self, id: Uuid) -> Result<Reservation, StoreError>;

    /// Newest first, optionally restricted to one resource
    async fn list_reservations(&self, resource_id: Option<Uuid>) -> Result<Vec<Reservation>, StoreError>;

    /// Fails with `StoreError::NotFound` if the resource does not exist
    async fn insert_reservation(&self, reservation: &Reservation) -> Result<(), StoreError>;

    /// Must fail with `StoreError::Overlap` if the range collides with an
    /// existing entry for the same resource.
    async fn insert_occupied_entry(&self, entry: &OccupiedDayEntry) -> Result<(), StoreError>;

    /// Removes the reservation and its occupied-day entry, if any
    async fn delete_reservation(&self, id: Uuid) -> Result<(), StoreError>;

    /// Changes the payment status. The transition is checked against the
    /// stored status in the same unit as the write, failing with
    /// `StoreError::InvalidTransition`. When the new status no longer holds
    /// dates, the occupied-day entry is released in that unit too.
    async fn set_payment_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
    ) -> Result<Reservation, StoreError>;

    /// Write a reservation together with its occupied-day entry.
    ///
    /// Stores with transactions override this. The fallback writes the
    /// reservation first, retries the entry write, and deletes the
    /// reservation again if the entry cannot be written, so that no
    /// reservation is left without its entry.
    async fn record_reservation(&self, reservation: &Reservation) -> Result<(), StoreError> {
        self.insert_reservation(reservation).await?;

        let entry = reservation.occupied_entry();
        let mut attempt = 1;
        loop {
            match self.insert_occupied_entry(&entry).await {
                Ok(()) => return Ok(()),
                Err(StoreError::Overlap) => {
                    self.roll_back_reservation(reservation.id).await;
                    return Err(StoreError::Overlap);
                }
                Err(e) if attempt < OCCUPIED_WRITE_ATTEMPTS => {
                    warn!(
                        "Occupied-day write for reservation {} failed (attempt {}): {}",
                        reservation.id, attempt, e
                    );
                    attempt += 1;
                }
                Err(e) => {
                    self.roll_back_reservation(reservation.id).await;
                    return Err(e);
                }
            }
        }
    }

    /// Best-effort compensation after a failed occupied-day write
    async fn roll_back_reservation(&self, id: Uuid) {
        match self.delete_reservation(id).await {
            Ok(()) | Err(StoreError::NotFound) => {}
            Err(e) => error!("Could not roll back reservation {}: {}", id, e),
        }
    }
}

/// Bound a store call by `limit`, turning an elapsed deadline into a
/// retryable `StoreError::Timeout`.
pub async fn timed<T, F>(limit: Duration, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| StoreError::Timeout(limit))?
}

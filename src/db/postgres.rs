//! Postgres-backed booking store

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::models::{OccupiedDayEntry, PaymentStatus, Reservation, Resource, ResourceKind};

use super::{queries, BookingStore, StoreError};

/// Booking store over a Postgres pool
#[derive(Clone)]
pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn insert_resource(&self, resource: &Resource) -> Result<(), StoreError> {
        queries::insert_resource(&self.pool, resource).await?;
        Ok(())
    }

    async fn get_resource(&self, id: Uuid) -> Result<Resource, StoreError> {
        queries::find_resource(&self.pool, id)
            .await?
            .ok_or(StoreError::NotFound)?
            .try_into()
    }

    async fn list_resources(
        &self,
        kind: Option<ResourceKind>,
        owner_id: Option<Uuid>,
    ) -> Result<Vec<Resource>, StoreError> {
        queries::list_resources(&self.pool, kind.as_ref().map(ResourceKind::as_str), owner_id)
            .await?
            .into_iter()
            .map(Resource::try_from)
            .collect()
    }

    /// Locks the resource row first; a reservation write holding its
    /// shared lock finishes before the count runs, and one arriving later
    /// finds the row gone.
    async fn delete_resource(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        queries::lock_resource_for_update(&mut *tx, id)
            .await?
            .ok_or(StoreError::NotFound)?;
        if queries::count_active_reservations(&mut *tx, id).await? > 0 {
            return Err(StoreError::InUse);
        }
        queries::delete_resource(&mut *tx, id).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn occupied_entries(&self, resource_id: Uuid) -> Result<Vec<OccupiedDayEntry>, StoreError> {
        let rows = queries::occupied_entries(&self.pool, resource_id).await?;
        Ok(rows.into_iter().map(OccupiedDayEntry::from).collect())
    }

    async fn get_reservation(&self, id: Uuid) -> Result<Reservation, StoreError> {
        queries::find_reservation(&self.pool, id)
            .await?
            .ok_or(StoreError::NotFound)?
            .try_into()
    }

    async fn list_reservations(&self, resource_id: Option<Uuid>) -> Result<Vec<Reservation>, StoreError> {
        queries::list_reservations(&self.pool, resource_id)
            .await?
            .into_iter()
            .map(Reservation::try_from)
            .collect()
    }

    async fn insert_reservation(&self, reservation: &Reservation) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        queries::lock_resource_for_share(&mut *tx, reservation.resource_id)
            .await?
            .ok_or(StoreError::NotFound)?;
        queries::insert_reservation(&mut *tx, reservation).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn insert_occupied_entry(&self, entry: &OccupiedDayEntry) -> Result<(), StoreError> {
        queries::insert_occupied_entry(&self.pool, entry).await?;
        Ok(())
    }

    async fn delete_reservation(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        queries::delete_occupied_entry(&mut *tx, id).await?;
        let removed = queries::delete_reservation(&mut *tx, id).await?;
        if removed == 0 {
            return Err(StoreError::NotFound);
        }
        tx.commit().await?;
        Ok(())
    }

    async fn set_payment_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
    ) -> Result<Reservation, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = queries::find_reservation_for_update(&mut *tx, id)
            .await?
            .ok_or(StoreError::NotFound)?;
        let mut reservation = Reservation::try_from(row)?;
        if !reservation.payment_status.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                from: reservation.payment_status,
                to: status,
            });
        }

        queries::update_payment_status(&mut *tx, id, status).await?;
        if !status.holds_dates() {
            let released = queries::delete_occupied_entry(&mut *tx, id).await?;
            debug!("Released {} occupied-day entries for reservation {}", released, id);
        }

        tx.commit().await?;

        reservation.payment_status = status;
        Ok(reservation)
    }

    /// Both rows go in one transaction; an exclusion violation on
    /// `occupied_days` aborts the reservation insert with it.
    async fn record_reservation(&self, reservation: &Reservation) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        queries::lock_resource_for_share(&mut *tx, reservation.resource_id)
            .await?
            .ok_or(StoreError::NotFound)?;
        queries::insert_reservation(&mut *tx, reservation).await?;
        queries::insert_occupied_entry(&mut *tx, &reservation.occupied_entry()).await?;
        tx.commit().await?;
        Ok(())
    }
}

//! In-memory booking store.
//!
//! All state sits behind one mutex, which makes every write a single-writer
//! serialization point; `insert_occupied_entry` checks overlap under that
//! lock the way the Postgres exclusion constraint does. Failure injection
//! hooks let tests exercise the unavailable-store, partial-write and
//! stalled-write paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{OccupiedDayEntry, PaymentStatus, Reservation, Resource, ResourceKind};

use super::{BookingStore, StoreError};

#[derive(Debug, Default)]
struct MemoryState {
    resources: HashMap<Uuid, Resource>,
    reservations: HashMap<Uuid, Reservation>,
    occupied: Vec<OccupiedDayEntry>,
}

/// Booking store held in process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryBookingStore {
    state: Arc<Mutex<MemoryState>>,
    offline: Arc<AtomicBool>,
    failing_occupied_writes: Arc<AtomicU32>,
    occupied_write_stall_ms: Arc<AtomicU64>,
}

impl MemoryState {
    fn active_reservations(&self, resource_id: Uuid) -> usize {
        self.reservations
            .values()
            .filter(|r| r.resource_id == resource_id && r.payment_status.holds_dates())
            .count()
    }
}

impl MemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every call fails with `StoreError::Unavailable`
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make the next `count` occupied-day writes fail
    pub fn fail_next_occupied_writes(&self, count: u32) {
        self.failing_occupied_writes.store(count, Ordering::SeqCst);
    }

    /// Make every occupied-day write hang for `stall` after it is stored,
    /// as a slow connection would
    pub fn stall_occupied_writes(&self, stall: Duration) {
        self.occupied_write_stall_ms
            .store(stall.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of stored occupied-day entries (for tests)
    pub fn occupied_count(&self) -> usize {
        self.lock().map(|state| state.occupied.len()).unwrap_or(0)
    }

    /// Number of stored reservations, whatever their status (for tests)
    pub fn reservation_count(&self) -> usize {
        self.lock().map(|state| state.reservations.len()).unwrap_or(0)
    }

    /// Reservations on `resource_id` that still hold dates (for tests)
    pub fn active_reservation_count(&self, resource_id: Uuid) -> usize {
        self.lock()
            .map(|state| state.active_reservations(resource_id))
            .unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store is offline".to_string()));
        }
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("Mutex lock failed".to_string()))
    }

    fn take_injected_failure(&self) -> bool {
        self.failing_occupied_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl BookingStore for MemoryBookingStore {
    async fn insert_resource(&self, resource: &Resource) -> Result<(), StoreError> {
        self.lock()?.resources.insert(resource.id, resource.clone());
        Ok(())
    }

    async fn get_resource(&self, id: Uuid) -> Result<Resource, StoreError> {
        self.lock()?
            .resources
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_resources(
        &self,
        kind: Option<ResourceKind>,
        owner_id: Option<Uuid>,
    ) -> Result<Vec<Resource>, StoreError> {
        let state = self.lock()?;
        let mut resources: Vec<Resource> = state
            .resources
            .values()
            .filter(|r| kind.map_or(true, |k| r.kind == k))
            .filter(|r| owner_id.map_or(true, |o| r.owner_id == o))
            .cloned()
            .collect();
        resources.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(resources)
    }

    async fn delete_resource(&self, id: Uuid) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if !state.resources.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        if state.active_reservations(id) > 0 {
            return Err(StoreError::InUse);
        }
        state.resources.remove(&id);
        Ok(())
    }

    async fn occupied_entries(&self, resource_id: Uuid) -> Result<Vec<OccupiedDayEntry>, StoreError> {
        let state = self.lock()?;
        let mut entries: Vec<OccupiedDayEntry> = state
            .occupied
            .iter()
            .filter(|e| e.resource_id == resource_id)
            .copied()
            .collect();
        entries.sort_by_key(|e| e.start_date);
        Ok(entries)
    }

    async fn get_reservation(&self, id: Uuid) -> Result<Reservation, StoreError> {
        self.lock()?
            .reservations
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_reservations(&self, resource_id: Option<Uuid>) -> Result<Vec<Reservation>, StoreError> {
        let state = self.lock()?;
        let mut reservations: Vec<Reservation> = state
            .reservations
            .values()
            .filter(|r| resource_id.map_or(true, |id| r.resource_id == id))
            .cloned()
            .collect();
        reservations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reservations)
    }

    async fn insert_reservation(&self, reservation: &Reservation) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if !state.resources.contains_key(&reservation.resource_id) {
            return Err(StoreError::NotFound);
        }
        if state.reservations.contains_key(&reservation.id) {
            return Err(StoreError::Unavailable(format!(
                "reservation {} already exists",
                reservation.id
            )));
        }
        state.reservations.insert(reservation.id, reservation.clone());
        Ok(())
    }

    async fn insert_occupied_entry(&self, entry: &OccupiedDayEntry) -> Result<(), StoreError> {
        if self.take_injected_failure() {
            return Err(StoreError::Unavailable("injected occupied-day write failure".to_string()));
        }

        {
            let mut state = self.lock()?;
            let collides = state
                .occupied
                .iter()
                .any(|e| e.resource_id == entry.resource_id && e.overlaps(entry.start_date, entry.end_date));
            if collides {
                return Err(StoreError::Overlap);
            }
            state.occupied.push(*entry);
        }

        let stall = self.occupied_write_stall_ms.load(Ordering::SeqCst);
        if stall > 0 {
            tokio::time::sleep(Duration::from_millis(stall)).await;
        }
        Ok(())
    }

    async fn delete_reservation(&self, id: Uuid) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.occupied.retain(|e| e.reservation_id != id);
        state
            .reservations
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn set_payment_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
    ) -> Result<Reservation, StoreError> {
        let mut state = self.lock()?;
        let reservation = state.reservations.get_mut(&id).ok_or(StoreError::NotFound)?;
        if !reservation.payment_status.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                from: reservation.payment_status,
                to: status,
            });
        }
        reservation.payment_status = status;
        let updated = reservation.clone();
        if !status.holds_dates() {
            state.occupied.retain(|e| e.reservation_id != id);
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CustomerInfo, NewResource};
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn car(store: &MemoryBookingStore) -> Uuid {
        let resource = NewResource {
            kind: ResourceKind::Vehicle,
            name: "Swift".to_string(),
            description: String::new(),
            rate: Some(dec!(1000)),
            duration_hours: None,
            image_urls: vec![],
        }
        .into_resource(Uuid::new_v4(), Utc::now());
        store.insert_resource(&resource).await.unwrap();
        resource.id
    }

    fn reservation(resource_id: Uuid, start: NaiveDate, end: NaiveDate) -> Reservation {
        Reservation {
            id: Uuid::new_v4(),
            resource_id,
            resource_kind: ResourceKind::Vehicle,
            user_id: None,
            customer: CustomerInfo::new("Jane", "jane@example.mu", "5712 3456"),
            pickup_location: "Port Louis".to_string(),
            dropoff_location: "Port Louis".to_string(),
            start_date: start,
            end_date: end,
            total_amount: dec!(1000),
            payment_status: PaymentStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_overlapping_entry_is_rejected() {
        let store = MemoryBookingStore::new();
        let car = car(&store).await;
        let first = reservation(car, date(2024, 3, 1), date(2024, 3, 3));
        store.record_reservation(&first).await.unwrap();

        let second = reservation(car, date(2024, 3, 3), date(2024, 3, 4));
        let err = store.record_reservation(&second).await.unwrap_err();

        assert!(matches!(err, StoreError::Overlap));
        assert_eq!(store.reservation_count(), 1);
        assert_eq!(store.occupied_count(), 1);
    }

    #[tokio::test]
    async fn test_other_resources_do_not_collide() {
        let store = MemoryBookingStore::new();
        let a = reservation(car(&store).await, date(2024, 3, 1), date(2024, 3, 3));
        let b = reservation(car(&store).await, date(2024, 3, 1), date(2024, 3, 3));
        store.record_reservation(&a).await.unwrap();
        store.record_reservation(&b).await.unwrap();
        assert_eq!(store.occupied_count(), 2);
    }

    #[tokio::test]
    async fn test_transient_entry_failure_is_retried() {
        let store = MemoryBookingStore::new();
        let r = reservation(car(&store).await, date(2024, 3, 1), date(2024, 3, 1));
        store.fail_next_occupied_writes(1);
        store.record_reservation(&r).await.unwrap();
        assert_eq!(store.occupied_count(), 1);
    }

    #[tokio::test]
    async fn test_persistent_entry_failure_rolls_back_reservation() {
        let store = MemoryBookingStore::new();
        let r = reservation(car(&store).await, date(2024, 3, 1), date(2024, 3, 2));
        store.fail_next_occupied_writes(crate::db::OCCUPIED_WRITE_ATTEMPTS);

        let err = store.record_reservation(&r).await.unwrap_err();

        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(store.reservation_count(), 0);
        assert_eq!(store.occupied_count(), 0);
    }

    #[tokio::test]
    async fn test_reservation_for_missing_resource_is_refused() {
        let store = MemoryBookingStore::new();
        let r = reservation(Uuid::new_v4(), date(2024, 3, 1), date(2024, 3, 2));

        let err = store.record_reservation(&r).await.unwrap_err();

        assert!(matches!(err, StoreError::NotFound));
        assert_eq!(store.reservation_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelling_releases_entry() {
        let store = MemoryBookingStore::new();
        let r = reservation(car(&store).await, date(2024, 3, 1), date(2024, 3, 2));
        store.record_reservation(&r).await.unwrap();

        let updated = store.set_payment_status(r.id, PaymentStatus::Cancelled).await.unwrap();

        assert_eq!(updated.payment_status, PaymentStatus::Cancelled);
        assert_eq!(store.occupied_count(), 0);
        assert_eq!(store.active_reservation_count(r.resource_id), 0);
    }

    #[tokio::test]
    async fn test_status_change_is_checked_against_stored_status() {
        let store = MemoryBookingStore::new();
        let r = reservation(car(&store).await, date(2024, 3, 1), date(2024, 3, 2));
        store.record_reservation(&r).await.unwrap();
        store.set_payment_status(r.id, PaymentStatus::Cancelled).await.unwrap();

        let err = store.set_payment_status(r.id, PaymentStatus::Paid).await.unwrap_err();

        assert!(matches!(
            err,
            StoreError::InvalidTransition {
                from: PaymentStatus::Cancelled,
                to: PaymentStatus::Paid
            }
        ));
        assert_eq!(store.get_reservation(r.id).await.unwrap().payment_status, PaymentStatus::Cancelled);
        assert_eq!(store.occupied_count(), 0);
    }

    #[tokio::test]
    async fn test_resource_with_live_reservation_is_not_deleted() {
        let store = MemoryBookingStore::new();
        let car = car(&store).await;
        let r = reservation(car, date(2024, 3, 1), date(2024, 3, 2));
        store.record_reservation(&r).await.unwrap();

        assert!(matches!(store.delete_resource(car).await.unwrap_err(), StoreError::InUse));
        assert!(store.get_resource(car).await.is_ok());

        store.set_payment_status(r.id, PaymentStatus::Failed).await.unwrap();
        store.delete_resource(car).await.unwrap();
        assert!(matches!(store.get_resource(car).await.unwrap_err(), StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_offline_store_fails_reads() {
        let store = MemoryBookingStore::new();
        store.set_offline(true);
        let err = store.occupied_entries(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}

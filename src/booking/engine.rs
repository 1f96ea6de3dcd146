//! Reservation commit protocol.
//!
//! `commit` validates the request, re-reads the availability index, prices
//! the booking, and writes the reservation together with its occupied-day
//! entry. The availability check only fails fast with a friendly error; the
//! store's overlap rule is what actually prevents double-booking when two
//! commits race.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::db::{timed, BookingStore, StoreError};
use crate::models::{CustomerInfo, PaymentStatus, Principal, Reservation, Resource, ResourceKind};
use crate::pricing::{self, PricingError, Quote};

use super::availability::{conflicting_days, expand_entries};
use super::error::BookingError;

/// Everything the commit protocol needs to claim a resource
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub resource_id: Uuid,
    /// Kinds of resource the submitting surface may book (empty: any)
    pub accepted_kinds: Vec<ResourceKind>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub customer: CustomerInfo,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub user_id: Option<Uuid>,
}

/// The booking engine: availability, pricing and commit over one store
#[derive(Clone)]
pub struct BookingEngine {
    store: Arc<dyn BookingStore>,
    store_timeout: Duration,
}

impl BookingEngine {
    pub fn new(store: Arc<dyn BookingStore>, store_timeout: Duration) -> Self {
        Self {
            store,
            store_timeout,
        }
    }

    pub(crate) fn store(&self) -> &dyn BookingStore {
        self.store.as_ref()
    }

    pub(crate) fn store_timeout(&self) -> Duration {
        self.store_timeout
    }

    /// Every day already reserved for `resource_id`.
    ///
    /// A read failure is an error, never an empty set: callers must not
    /// offer dates they could not check.
    pub async fn occupied_days(&self, resource_id: Uuid) -> Result<BTreeSet<NaiveDate>, BookingError> {
        let entries = timed(self.store_timeout, self.store.occupied_entries(resource_id)).await?;
        Ok(expand_entries(&entries))
    }

    pub async fn is_date_free(&self, resource_id: Uuid, date: NaiveDate) -> Result<bool, BookingError> {
        Ok(!self.occupied_days(resource_id).await?.contains(&date))
    }

    pub async fn resource(&self, resource_id: Uuid) -> Result<Resource, BookingError> {
        match timed(self.store_timeout, self.store.get_resource(resource_id)).await {
            Ok(resource) => Ok(resource),
            Err(StoreError::NotFound) => Err(BookingError::ResourceNotFound(resource_id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Price `[start, end]` for a resource without reserving anything
    pub async fn quote(&self, resource_id: Uuid, start: NaiveDate, end: NaiveDate) -> Result<Quote, BookingError> {
        let resource = self.resource(resource_id).await?;
        quote_for(&resource, start, end)
    }

    /// Commit a reservation.
    ///
    /// `as_of` is the day considered "today" for the no-past-bookings rule
    /// (default: the current UTC date).
    pub async fn commit(
        &self,
        request: BookingRequest,
        as_of: Option<NaiveDate>,
    ) -> Result<Reservation, BookingError> {
        let today = as_of.unwrap_or_else(|| Utc::now().date_naive());
        validate_request(&request, today)?;

        let resource = self.resource(request.resource_id).await?;
        if !request.accepted_kinds.is_empty() && !request.accepted_kinds.contains(&resource.kind) {
            return Err(BookingError::validation(format!(
                "resource {} is a {} and cannot be booked here",
                resource.id, resource.kind
            )));
        }

        // Freshest possible read; stale form data is not trusted.
        let occupied = self.occupied_days(resource.id).await?;
        let conflicts = conflicting_days(&occupied, request.start_date, request.end_date);
        if !conflicts.is_empty() {
            info!(
                "Rejected booking for resource {}: {} requested day(s) already taken",
                resource.id,
                conflicts.len()
            );
            return Err(BookingError::Conflict {
                resource_id: resource.id,
                conflicting_days: conflicts,
            });
        }

        let quote = quote_for(&resource, request.start_date, request.end_date)?;
        let reservation = build_reservation(&resource, request, quote);

        self.record(&reservation).await?;

        info!(
            "Reservation {} committed for {} {} ({}..={}, total {})",
            reservation.id,
            reservation.resource_kind,
            reservation.resource_id,
            reservation.start_date,
            reservation.end_date,
            reservation.total_amount
        );
        Ok(reservation)
    }

    /// Write reservation and occupied-day entry as one unit.
    ///
    /// The write runs on its own task so an abandoned request cannot stop it
    /// halfway. If it overruns the store timeout, the task removes whatever
    /// was written before reporting failure.
    async fn record(&self, reservation: &Reservation) -> Result<(), BookingError> {
        let store = Arc::clone(&self.store);
        let limit = self.store_timeout;
        let pending = reservation.clone();

        let write = tokio::spawn(async move {
            let outcome = timed(limit, store.record_reservation(&pending)).await;
            if let Err(StoreError::Timeout(_)) = outcome {
                warn!("Reservation {} write timed out, compensating", pending.id);
                if tokio::time::timeout(limit, store.roll_back_reservation(pending.id))
                    .await
                    .is_err()
                {
                    error!(
                        "Rolling back reservation {} timed out after {:?}",
                        pending.id, limit
                    );
                }
            }
            outcome
        });

        let outcome = write.await.map_err(|e| {
            error!("Reservation write task failed: {}", e);
            BookingError::StoreUnavailable(StoreError::Unavailable(e.to_string()))
        })?;

        match outcome {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound) => Err(BookingError::ResourceNotFound(reservation.resource_id)),
            Err(StoreError::Overlap) => {
                info!(
                    "Store rejected overlapping reservation for resource {} ({}..={})",
                    reservation.resource_id, reservation.start_date, reservation.end_date
                );
                Err(BookingError::Conflict {
                    resource_id: reservation.resource_id,
                    conflicting_days: Vec::new(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn reservation(&self, id: Uuid) -> Result<Reservation, BookingError> {
        match timed(self.store_timeout, self.store.get_reservation(id)).await {
            Ok(reservation) => Ok(reservation),
            Err(StoreError::NotFound) => Err(BookingError::ReservationNotFound(id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Reservations, newest first
    pub async fn reservations(&self, resource_id: Option<Uuid>) -> Result<Vec<Reservation>, BookingError> {
        Ok(timed(self.store_timeout, self.store.list_reservations(resource_id)).await?)
    }

    /// Reservations `principal` may see, newest first: their own bookings
    /// and bookings on resources they manage. Superusers see everything.
    pub async fn reservations_visible_to(
        &self,
        principal: &Principal,
        resource_id: Option<Uuid>,
    ) -> Result<Vec<Reservation>, BookingError> {
        let reservations = self.reservations(resource_id).await?;
        if principal.is_superuser {
            return Ok(reservations);
        }

        let managed: HashSet<Uuid> = self
            .managed_resources(principal)
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect();
        Ok(reservations
            .into_iter()
            .filter(|r| r.user_id == Some(principal.user_id) || managed.contains(&r.resource_id))
            .collect())
    }

    /// Look up a reservation on behalf of `principal`: the customer who
    /// booked, the owner of the booked resource, or a superuser.
    pub async fn reservation_as(&self, id: Uuid, principal: &Principal) -> Result<Reservation, BookingError> {
        let reservation = self.reservation(id).await?;
        let allowed = principal.is_superuser
            || reservation.user_id == Some(principal.user_id)
            || match self.resource(reservation.resource_id).await {
                Ok(resource) => principal.can_manage(resource.owner_id),
                Err(BookingError::ResourceNotFound(_)) => false,
                Err(e) => return Err(e),
            };
        if !allowed {
            return Err(BookingError::Forbidden(id));
        }
        Ok(reservation)
    }

    /// Move a reservation to a new payment status.
    ///
    /// The store checks the transition against the status it holds when it
    /// writes, so two racing changes cannot both pass. Cancelled and failed
    /// reservations release their days.
    pub async fn update_payment_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
    ) -> Result<Reservation, BookingError> {
        let updated = match timed(self.store_timeout, self.store.set_payment_status(id, status)).await {
            Ok(updated) => updated,
            Err(StoreError::NotFound) => return Err(BookingError::ReservationNotFound(id)),
            Err(StoreError::InvalidTransition { from, to }) => {
                info!("Refused moving reservation {} from {} to {}", id, from, to);
                return Err(BookingError::InvalidTransition { from, to });
            }
            Err(e) => return Err(e.into()),
        };

        info!("Reservation {} moved to {}", id, status);
        Ok(updated)
    }

    pub async fn cancel(&self, id: Uuid) -> Result<Reservation, BookingError> {
        self.update_payment_status(id, PaymentStatus::Cancelled).await
    }

    /// Cancel on behalf of `principal`, with the same access rule as
    /// `reservation_as`.
    pub async fn cancel_as(&self, id: Uuid, principal: &Principal) -> Result<Reservation, BookingError> {
        self.reservation_as(id, principal).await?;
        self.cancel(id).await
    }
}

fn validate_request(request: &BookingRequest, today: NaiveDate) -> Result<(), BookingError> {
    let mut errors = Vec::new();

    if request.end_date < request.start_date {
        errors.push(format!(
            "end date {} is before start date {}",
            request.end_date, request.start_date
        ));
    }
    if request.start_date < today {
        errors.push(format!("start date {} is in the past", request.start_date));
    }
    errors.extend(request.customer.validate());

    if errors.is_empty() {
        Ok(())
    } else {
        Err(BookingError::Validation(errors))
    }
}

fn quote_for(resource: &Resource, start: NaiveDate, end: NaiveDate) -> Result<Quote, BookingError> {
    pricing::quote(resource.rate, start, end).map_err(|e| match e {
        PricingError::RateUnavailable => BookingError::PricingUnavailable(resource.id),
        PricingError::InvertedRange { .. } => BookingError::validation(e.to_string()),
    })
}

fn build_reservation(resource: &Resource, request: BookingRequest, quote: Quote) -> Reservation {
    let (pickup_location, dropoff_location) = if resource.kind.uses_locations() {
        (request.pickup_location, request.dropoff_location)
    } else {
        (String::new(), String::new())
    };

    Reservation {
        id: Uuid::new_v4(),
        resource_id: resource.id,
        resource_kind: resource.kind,
        user_id: request.user_id,
        customer: request.customer,
        pickup_location,
        dropoff_location,
        start_date: request.start_date,
        end_date: request.end_date,
        total_amount: quote.total,
        payment_status: PaymentStatus::Pending,
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryBookingStore;
    use crate::models::NewResource;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> Option<NaiveDate> {
        Some(date(2024, 1, 1))
    }

    async fn setup(kind: ResourceKind, rate: Option<Decimal>) -> (BookingEngine, MemoryBookingStore, Uuid) {
        let store = MemoryBookingStore::new();
        let resource = NewResource {
            kind,
            name: "Car-42".to_string(),
            description: String::new(),
            rate,
            duration_hours: None,
            image_urls: vec![],
        }
        .into_resource(Uuid::new_v4(), Utc::now());
        let id = resource.id;
        store.insert_resource(&resource).await.unwrap();
        let engine = BookingEngine::new(Arc::new(store.clone()), Duration::from_secs(2));
        (engine, store, id)
    }

    fn request(resource_id: Uuid, start: NaiveDate, end: NaiveDate) -> BookingRequest {
        BookingRequest {
            resource_id,
            accepted_kinds: vec![],
            start_date: start,
            end_date: end,
            customer: CustomerInfo::new("Jane Doe", "jane@example.mu", "5712 3456"),
            pickup_location: "Airport".to_string(),
            dropoff_location: "Grand Baie".to_string(),
            user_id: None,
        }
    }

    // ==================== commit tests ====================

    #[tokio::test]
    async fn test_car_42_scenario() {
        let (engine, store, car) = setup(ResourceKind::Vehicle, Some(dec!(1000))).await;

        let first = engine
            .commit(request(car, date(2024, 3, 1), date(2024, 3, 3)), today())
            .await
            .unwrap();
        assert_eq!(first.total_amount, dec!(3000));
        assert_eq!(first.payment_status, PaymentStatus::Pending);

        let err = engine
            .commit(request(car, date(2024, 3, 2), date(2024, 3, 4)), today())
            .await
            .unwrap_err();
        match err {
            BookingError::Conflict { conflicting_days, .. } => {
                assert_eq!(conflicting_days, vec![date(2024, 3, 2), date(2024, 3, 3)]);
            }
            other => panic!("expected conflict, got {:?}", other),
        }
        assert_eq!(store.occupied_count(), 1);

        let third = engine
            .commit(request(car, date(2024, 3, 4), date(2024, 3, 5)), today())
            .await
            .unwrap();
        assert_eq!(third.total_amount, dec!(2000));
        assert_eq!(store.occupied_count(), 2);
    }

    #[tokio::test]
    async fn test_occupied_days_after_commit() {
        let (engine, _store, car) = setup(ResourceKind::Vehicle, Some(dec!(800))).await;
        engine
            .commit(request(car, date(2024, 2, 10), date(2024, 2, 12)), today())
            .await
            .unwrap();

        let days = engine.occupied_days(car).await.unwrap();
        assert_eq!(
            days.into_iter().collect::<Vec<_>>(),
            vec![date(2024, 2, 10), date(2024, 2, 11), date(2024, 2, 12)]
        );
        assert!(!engine.is_date_free(car, date(2024, 2, 11)).await.unwrap());
        assert!(engine.is_date_free(car, date(2024, 2, 13)).await.unwrap());
    }

    #[tokio::test]
    async fn test_validation_rejects_before_any_write() {
        let (engine, store, car) = setup(ResourceKind::Vehicle, Some(dec!(1000))).await;
        let mut bad = request(car, date(2023, 12, 30), date(2023, 12, 29));
        bad.customer = CustomerInfo::new("", "jane@example.mu", "");

        let err = engine.commit(bad, today()).await.unwrap_err();

        match err {
            BookingError::Validation(errors) => assert_eq!(errors.len(), 4),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(store.reservation_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_rate_is_pricing_unavailable() {
        let (engine, store, tour) = setup(ResourceKind::Tour, None).await;
        let d = date(2024, 4, 1);
        let err = engine.commit(request(tour, d, d), today()).await.unwrap_err();
        assert!(matches!(err, BookingError::PricingUnavailable(id) if id == tour));
        assert_eq!(store.reservation_count(), 0);
    }

    #[tokio::test]
    async fn test_single_day_experience_priced_at_listed_rate() {
        let (engine, _store, tour) = setup(ResourceKind::Tour, Some(dec!(2500))).await;
        let d = date(2024, 4, 1);
        let reservation = engine.commit(request(tour, d, d), today()).await.unwrap();
        assert_eq!(reservation.total_amount, dec!(2500));
        assert!(reservation.pickup_location.is_empty());
        assert!(reservation.dropoff_location.is_empty());
    }

    #[tokio::test]
    async fn test_surface_kind_mismatch_is_rejected() {
        let (engine, _store, tour) = setup(ResourceKind::Tour, Some(dec!(2500))).await;
        let mut req = request(tour, date(2024, 4, 1), date(2024, 4, 2));
        req.accepted_kinds = vec![ResourceKind::Vehicle];
        let err = engine.commit(req, today()).await.unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unreadable_index_fails_closed() {
        let (engine, store, car) = setup(ResourceKind::Vehicle, Some(dec!(1000))).await;
        store.set_offline(true);
        let err = engine.occupied_days(car).await.unwrap_err();
        assert!(matches!(err, BookingError::StoreUnavailable(_)));
        assert!(engine.is_date_free(car, date(2024, 5, 1)).await.is_err());
    }

    #[tokio::test]
    async fn test_failed_entry_write_leaves_no_reservation() {
        let (engine, store, car) = setup(ResourceKind::Vehicle, Some(dec!(1000))).await;
        store.fail_next_occupied_writes(crate::db::OCCUPIED_WRITE_ATTEMPTS);

        let err = engine
            .commit(request(car, date(2024, 5, 1), date(2024, 5, 2)), today())
            .await
            .unwrap_err();

        assert!(matches!(err, BookingError::StoreUnavailable(_)));
        assert_eq!(store.reservation_count(), 0);
        assert_eq!(store.occupied_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_overlapping_commits_book_once() {
        let (engine, store, car) = setup(ResourceKind::Vehicle, Some(dec!(1000))).await;

        let attempts = (0..8).map(|i| {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine
                    .commit(request(car, date(2024, 6, 1 + i % 2), date(2024, 6, 3)), today())
                    .await
            })
        });
        let mut committed = 0;
        for attempt in attempts.collect::<Vec<_>>() {
            match attempt.await.unwrap() {
                Ok(_) => committed += 1,
                Err(BookingError::Conflict { .. }) => {}
                Err(other) => panic!("unexpected error {:?}", other),
            }
        }

        assert_eq!(committed, 1);
        assert_eq!(store.occupied_count(), 1);
        assert_eq!(store.reservation_count(), 1);
    }

    // ==================== payment status tests ====================

    #[tokio::test]
    async fn test_cancel_releases_dates() {
        let (engine, _store, car) = setup(ResourceKind::Vehicle, Some(dec!(1000))).await;
        let r = engine
            .commit(request(car, date(2024, 3, 1), date(2024, 3, 3)), today())
            .await
            .unwrap();

        let cancelled = engine.cancel(r.id).await.unwrap();
        assert_eq!(cancelled.payment_status, PaymentStatus::Cancelled);
        assert!(engine.occupied_days(car).await.unwrap().is_empty());

        engine
            .commit(request(car, date(2024, 3, 2), date(2024, 3, 4)), today())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_terminal_status_cannot_change() {
        let (engine, _store, car) = setup(ResourceKind::Vehicle, Some(dec!(1000))).await;
        let r = engine
            .commit(request(car, date(2024, 3, 1), date(2024, 3, 1)), today())
            .await
            .unwrap();
        engine.update_payment_status(r.id, PaymentStatus::Failed).await.unwrap();

        let err = engine.update_payment_status(r.id, PaymentStatus::Paid).await.unwrap_err();
        assert!(matches!(err, BookingError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_booking_cannot_be_revived_over_a_new_one() {
        let (engine, store, car) = setup(ResourceKind::Vehicle, Some(dec!(1000))).await;
        let first = engine
            .commit(request(car, date(2024, 3, 1), date(2024, 3, 3)), today())
            .await
            .unwrap();
        engine.cancel(first.id).await.unwrap();
        let second = engine
            .commit(request(car, date(2024, 3, 1), date(2024, 3, 3)), today())
            .await
            .unwrap();

        let err = engine
            .update_payment_status(first.id, PaymentStatus::Paid)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BookingError::InvalidTransition {
                from: PaymentStatus::Cancelled,
                to: PaymentStatus::Paid
            }
        ));
        assert_eq!(engine.reservation(first.id).await.unwrap().payment_status, PaymentStatus::Cancelled);
        assert_eq!(engine.reservation(second.id).await.unwrap().payment_status, PaymentStatus::Pending);
        assert_eq!(store.active_reservation_count(car), 1);
        assert_eq!(store.occupied_count(), 1);
    }

    #[tokio::test]
    async fn test_racing_cancel_and_payment_keep_index_consistent() {
        let (engine, store, car) = setup(ResourceKind::Vehicle, Some(dec!(1000))).await;

        for month in 1..=12 {
            let id = engine
                .commit(request(car, date(2025, month, 1), date(2025, month, 3)), today())
                .await
                .unwrap()
                .id;
            let cancel = tokio::spawn({
                let engine = engine.clone();
                async move { engine.cancel(id).await }
            });
            let pay = tokio::spawn({
                let engine = engine.clone();
                async move { engine.update_payment_status(id, PaymentStatus::Paid).await }
            });
            cancel.await.unwrap().unwrap();
            let _ = pay.await.unwrap();

            assert_eq!(
                engine.reservation(id).await.unwrap().payment_status,
                PaymentStatus::Cancelled
            );
        }

        assert_eq!(store.active_reservation_count(car), 0);
        assert_eq!(store.occupied_count(), 0);
    }

    #[tokio::test]
    async fn test_write_timeout_rolls_back_reservation() {
        let store = MemoryBookingStore::new();
        let resource = NewResource {
            kind: ResourceKind::Vehicle,
            name: "Car-42".to_string(),
            description: String::new(),
            rate: Some(dec!(1000)),
            duration_hours: None,
            image_urls: vec![],
        }
        .into_resource(Uuid::new_v4(), Utc::now());
        store.insert_resource(&resource).await.unwrap();
        store.stall_occupied_writes(Duration::from_millis(500));
        let engine = BookingEngine::new(Arc::new(store.clone()), Duration::from_millis(50));

        let err = engine
            .commit(request(resource.id, date(2024, 5, 1), date(2024, 5, 2)), today())
            .await
            .unwrap_err();

        assert!(matches!(err, BookingError::StoreUnavailable(StoreError::Timeout(_))));
        assert_eq!(store.reservation_count(), 0);
        assert_eq!(store.occupied_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_reservation_is_not_found() {
        let (engine, _store, _car) = setup(ResourceKind::Vehicle, Some(dec!(1000))).await;
        let id = Uuid::new_v4();
        assert!(matches!(
            engine.cancel(id).await.unwrap_err(),
            BookingError::ReservationNotFound(missing) if missing == id
        ));
    }

    #[tokio::test]
    async fn test_cancel_as_requires_booker_owner_or_superuser() {
        let (engine, _store, car) = setup(ResourceKind::Vehicle, Some(dec!(1000))).await;
        let customer = Uuid::new_v4();
        let mut req = request(car, date(2024, 3, 1), date(2024, 3, 1));
        req.user_id = Some(customer);
        let r = engine.commit(req, today()).await.unwrap();

        let stranger = Principal::user(Uuid::new_v4());
        assert!(matches!(
            engine.cancel_as(r.id, &stranger).await.unwrap_err(),
            BookingError::Forbidden(_)
        ));

        let cancelled = engine.cancel_as(r.id, &Principal::user(customer)).await.unwrap();
        assert_eq!(cancelled.payment_status, PaymentStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_reservations_scoped_to_booker_and_owner() {
        let store = MemoryBookingStore::new();
        let owner = Principal::user(Uuid::new_v4());
        let resource = NewResource {
            kind: ResourceKind::Vehicle,
            name: "Car-42".to_string(),
            description: String::new(),
            rate: Some(dec!(1000)),
            duration_hours: None,
            image_urls: vec![],
        }
        .into_resource(owner.user_id, Utc::now());
        store.insert_resource(&resource).await.unwrap();
        let engine = BookingEngine::new(Arc::new(store), Duration::from_secs(2));

        let customer = Uuid::new_v4();
        let mut req = request(resource.id, date(2024, 3, 1), date(2024, 3, 1));
        req.user_id = Some(customer);
        let mine = engine.commit(req, today()).await.unwrap();
        engine
            .commit(request(resource.id, date(2024, 3, 5), date(2024, 3, 5)), today())
            .await
            .unwrap();

        let seen = engine
            .reservations_visible_to(&Principal::user(customer), None)
            .await
            .unwrap();
        assert_eq!(seen.iter().map(|r| r.id).collect::<Vec<_>>(), vec![mine.id]);

        assert_eq!(engine.reservations_visible_to(&owner, None).await.unwrap().len(), 2);
        let stranger = Principal::user(Uuid::new_v4());
        assert!(engine.reservations_visible_to(&stranger, None).await.unwrap().is_empty());
        assert!(matches!(
            engine.reservation_as(mine.id, &stranger).await.unwrap_err(),
            BookingError::Forbidden(_)
        ));
        assert_eq!(engine.reservation_as(mine.id, &owner).await.unwrap().id, mine.id);
    }
}

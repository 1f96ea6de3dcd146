//! Booking intake: the surface-specific form adapters and the submission
//! flow they share.
//!
//! Each form checks its own required fields and turns itself into a
//! `BookingRequest`; nothing reaches the commit protocol until that passes.
//! `IntakeService` then claims the form's submission id so a double-click or
//! a retried POST cannot commit twice.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::cache::{AppCache, SubmissionState};
use crate::models::{CustomerInfo, Reservation, ResourceKind};

use super::engine::{BookingEngine, BookingRequest};
use super::error::BookingError;

/// A submitted booking form from one of the intake surfaces
pub trait IntakeForm {
    /// Identifier generated when the form was loaded; repeats share it
    fn submission_id(&self) -> Uuid;

    /// Check required fields and build the commit request
    fn into_request(self, user_id: Option<Uuid>) -> Result<BookingRequest, BookingError>;
}

/// Vehicle rental over a date range, with pickup and drop-off
#[derive(Debug, Clone, Deserialize)]
pub struct VehicleBookingForm {
    pub submission_id: Uuid,
    pub resource_id: Uuid,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub pickup_location: String,
    #[serde(default)]
    pub dropoff_location: String,
}

impl IntakeForm for VehicleBookingForm {
    fn submission_id(&self) -> Uuid {
        self.submission_id
    }

    fn into_request(self, user_id: Option<Uuid>) -> Result<BookingRequest, BookingError> {
        let customer = CustomerInfo::new(self.name, self.email, self.phone);
        let mut errors = customer.validate();

        if self.start_date.is_none() {
            errors.push("pickup date is required".to_string());
        }
        if self.end_date.is_none() {
            errors.push("return date is required".to_string());
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                errors.push("return date must not be before pickup date".to_string());
            }
        }
        if self.pickup_location.trim().is_empty() {
            errors.push("pickup location is required".to_string());
        }
        if self.dropoff_location.trim().is_empty() {
            errors.push("drop-off location is required".to_string());
        }

        match (self.start_date, self.end_date) {
            (Some(start_date), Some(end_date)) if errors.is_empty() => Ok(BookingRequest {
                resource_id: self.resource_id,
                accepted_kinds: vec![ResourceKind::Vehicle],
                start_date,
                end_date,
                customer,
                pickup_location: self.pickup_location.trim().to_string(),
                dropoff_location: self.dropoff_location.trim().to_string(),
                user_id,
            }),
            _ => Err(BookingError::Validation(errors)),
        }
    }
}

/// Single-day tour or attraction booking
#[derive(Debug, Clone, Deserialize)]
pub struct ExperienceBookingForm {
    pub submission_id: Uuid,
    pub resource_id: Uuid,
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl IntakeForm for ExperienceBookingForm {
    fn submission_id(&self) -> Uuid {
        self.submission_id
    }

    fn into_request(self, user_id: Option<Uuid>) -> Result<BookingRequest, BookingError> {
        let customer = CustomerInfo::new(self.name, self.email, self.phone);
        let mut errors = customer.validate();

        match self.date {
            Some(date) if errors.is_empty() => Ok(BookingRequest {
                resource_id: self.resource_id,
                accepted_kinds: vec![ResourceKind::Tour, ResourceKind::Attraction],
                start_date: date,
                end_date: date,
                customer,
                pickup_location: String::new(),
                dropoff_location: String::new(),
                user_id,
            }),
            date => {
                if date.is_none() {
                    errors.push("booking date is required".to_string());
                }
                Err(BookingError::Validation(errors))
            }
        }
    }
}

/// Generic quick-book dialog: one day, any kind the listing declares
#[derive(Debug, Clone, Deserialize)]
pub struct ModalBookingForm {
    pub submission_id: Uuid,
    pub resource_id: Uuid,
    pub kind: ResourceKind,
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl IntakeForm for ModalBookingForm {
    fn submission_id(&self) -> Uuid {
        self.submission_id
    }

    fn into_request(self, user_id: Option<Uuid>) -> Result<BookingRequest, BookingError> {
        let customer = CustomerInfo::new(self.name, self.email, self.phone);
        let mut errors = customer.validate();

        match self.date {
            Some(date) if errors.is_empty() => Ok(BookingRequest {
                resource_id: self.resource_id,
                accepted_kinds: vec![self.kind],
                start_date: date,
                end_date: date,
                customer,
                pickup_location: String::new(),
                dropoff_location: String::new(),
                user_id,
            }),
            date => {
                if date.is_none() {
                    errors.push("booking date is required".to_string());
                }
                Err(BookingError::Validation(errors))
            }
        }
    }
}

/// What the intake surface shows next
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IntakeOutcome {
    /// Move on to the receipt step
    Confirmed {
        reservation_id: Uuid,
        confirmation_url: String,
        reservation: Reservation,
    },
    /// Back to date selection with a freshly read calendar
    DatesUnavailable {
        resource_id: Uuid,
        message: String,
        conflicting_days: Vec<NaiveDate>,
        occupied_days: Vec<NaiveDate>,
    },
}

impl IntakeOutcome {
    fn confirmed(reservation: Reservation) -> Self {
        IntakeOutcome::Confirmed {
            reservation_id: reservation.id,
            confirmation_url: confirmation_url(reservation.id),
            reservation,
        }
    }
}

pub fn confirmation_url(reservation_id: Uuid) -> String {
    format!("/bookings/{}/confirmation", reservation_id)
}

/// Runs form submissions through the commit protocol, once per submission id
#[derive(Clone)]
pub struct IntakeService {
    engine: BookingEngine,
    cache: AppCache,
}

impl IntakeService {
    pub fn new(engine: BookingEngine, cache: AppCache) -> Self {
        Self { engine, cache }
    }

    pub fn engine(&self) -> &BookingEngine {
        &self.engine
    }

    pub async fn submit<F: IntakeForm>(
        &self,
        form: F,
        user_id: Option<Uuid>,
    ) -> Result<IntakeOutcome, BookingError> {
        self.submit_as_of(form, user_id, None).await
    }

    /// Submit with an explicit "today" for the no-past-bookings rule
    pub async fn submit_as_of<F: IntakeForm>(
        &self,
        form: F,
        user_id: Option<Uuid>,
        as_of: Option<NaiveDate>,
    ) -> Result<IntakeOutcome, BookingError> {
        let submission_id = form.submission_id();
        let request = form.into_request(user_id)?;

        let claim = self
            .cache
            .submissions
            .entry(submission_id)
            .or_insert(SubmissionState::InFlight)
            .await;
        if !claim.is_fresh() {
            return match claim.into_value() {
                SubmissionState::InFlight => Err(BookingError::SubmissionInFlight),
                SubmissionState::Completed(reservation) => {
                    debug!("Replaying submission {} -> {}", submission_id, reservation.id);
                    Ok(IntakeOutcome::confirmed((*reservation).clone()))
                }
            };
        }

        // The claim is settled on a separate task so a dropped request
        // cannot leave it in flight.
        let service = self.clone();
        tokio::spawn(async move { service.settle(submission_id, request, as_of).await })
            .await
            .map_err(|e| {
                error!("Submission {} task failed: {}", submission_id, e);
                BookingError::StoreUnavailable(crate::db::StoreError::Unavailable(e.to_string()))
            })?
    }

    async fn settle(
        &self,
        submission_id: Uuid,
        request: BookingRequest,
        as_of: Option<NaiveDate>,
    ) -> Result<IntakeOutcome, BookingError> {
        match self.engine.commit(request, as_of).await {
            Ok(reservation) => {
                self.cache
                    .submissions
                    .insert(submission_id, SubmissionState::Completed(Arc::new(reservation.clone())))
                    .await;
                Ok(IntakeOutcome::confirmed(reservation))
            }
            Err(BookingError::Conflict {
                resource_id,
                conflicting_days,
            }) => {
                self.cache.release_submission(submission_id).await;
                let occupied_days = self.engine.occupied_days(resource_id).await?;
                info!(
                    "Submission {} hit taken dates on resource {}",
                    submission_id, resource_id
                );
                Ok(IntakeOutcome::DatesUnavailable {
                    resource_id,
                    message: "Selected dates are no longer available. Please pick new dates.".to_string(),
                    conflicting_days,
                    occupied_days: occupied_days.into_iter().collect(),
                })
            }
            Err(e) => {
                self.cache.release_submission(submission_id).await;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{BookingStore, MemoryBookingStore};
    use crate::models::NewResource;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> Option<NaiveDate> {
        Some(date(2024, 1, 1))
    }

    async fn service_with(kind: ResourceKind) -> (IntakeService, MemoryBookingStore, Uuid) {
        let store = MemoryBookingStore::new();
        let resource = NewResource {
            kind,
            name: "Car-42".to_string(),
            description: String::new(),
            rate: Some(dec!(1000)),
            duration_hours: None,
            image_urls: vec![],
        }
        .into_resource(Uuid::new_v4(), Utc::now());
        store.insert_resource(&resource).await.unwrap();
        let engine = BookingEngine::new(Arc::new(store.clone()), Duration::from_secs(2));
        (IntakeService::new(engine, AppCache::new()), store, resource.id)
    }

    fn vehicle_form(resource_id: Uuid, start: NaiveDate, end: NaiveDate) -> VehicleBookingForm {
        VehicleBookingForm {
            submission_id: Uuid::new_v4(),
            resource_id,
            start_date: Some(start),
            end_date: Some(end),
            name: "Jane Doe".to_string(),
            email: "jane@example.mu".to_string(),
            phone: "5712 3456".to_string(),
            pickup_location: "Airport".to_string(),
            dropoff_location: "Grand Baie".to_string(),
        }
    }

    // ==================== form tests ====================

    #[test]
    fn test_vehicle_form_requires_locations_and_dates() {
        let mut form = vehicle_form(Uuid::new_v4(), date(2024, 3, 1), date(2024, 3, 3));
        form.pickup_location = "  ".to_string();
        form.end_date = None;

        match form.into_request(None).unwrap_err() {
            BookingError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_vehicle_form_rejects_inverted_range() {
        let form = vehicle_form(Uuid::new_v4(), date(2024, 3, 3), date(2024, 3, 1));
        assert!(matches!(form.into_request(None), Err(BookingError::Validation(_))));
    }

    #[test]
    fn test_experience_form_books_one_day_without_locations() {
        let form = ExperienceBookingForm {
            submission_id: Uuid::new_v4(),
            resource_id: Uuid::new_v4(),
            date: Some(date(2024, 4, 1)),
            name: "Jane".to_string(),
            email: "jane@example.mu".to_string(),
            phone: "5712 3456".to_string(),
        };
        let request = form.into_request(None).unwrap();
        assert_eq!(request.start_date, request.end_date);
        assert!(request.pickup_location.is_empty());
        assert!(!request.accepted_kinds.contains(&ResourceKind::Vehicle));
    }

    #[test]
    fn test_modal_form_reports_every_missing_field() {
        let form = ModalBookingForm {
            submission_id: Uuid::new_v4(),
            resource_id: Uuid::new_v4(),
            kind: ResourceKind::Attraction,
            date: None,
            name: String::new(),
            email: "not-an-email".to_string(),
            phone: String::new(),
        };
        match form.into_request(None).unwrap_err() {
            BookingError::Validation(errors) => assert_eq!(errors.len(), 4),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    // ==================== submission tests ====================

    #[tokio::test]
    async fn test_submission_confirms_with_receipt_url() {
        let (service, _store, car) = service_with(ResourceKind::Vehicle).await;
        let outcome = service
            .submit_as_of(vehicle_form(car, date(2024, 3, 1), date(2024, 3, 3)), None, today())
            .await
            .unwrap();

        match outcome {
            IntakeOutcome::Confirmed {
                reservation_id,
                confirmation_url,
                reservation,
            } => {
                assert_eq!(reservation.total_amount, dec!(3000));
                assert_eq!(confirmation_url, format!("/bookings/{}/confirmation", reservation_id));
            }
            other => panic!("expected confirmation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_repeated_submission_commits_once() {
        let (service, store, car) = service_with(ResourceKind::Vehicle).await;
        let form = vehicle_form(car, date(2024, 3, 1), date(2024, 3, 3));

        let first = service.submit_as_of(form.clone(), None, today()).await.unwrap();
        let second = service.submit_as_of(form, None, today()).await.unwrap();

        let id = |o: &IntakeOutcome| match o {
            IntakeOutcome::Confirmed { reservation_id, .. } => *reservation_id,
            other => panic!("expected confirmation, got {:?}", other),
        };
        assert_eq!(id(&first), id(&second));
        assert_eq!(store.reservation_count(), 1);
    }

    #[tokio::test]
    async fn test_in_flight_submission_is_refused() {
        let (service, _store, car) = service_with(ResourceKind::Vehicle).await;
        let form = vehicle_form(car, date(2024, 3, 1), date(2024, 3, 3));
        service
            .cache
            .submissions
            .insert(form.submission_id, SubmissionState::InFlight)
            .await;

        let err = service.submit_as_of(form, None, today()).await.unwrap_err();
        assert!(matches!(err, BookingError::SubmissionInFlight));
    }

    #[tokio::test]
    async fn test_conflict_returns_to_date_selection_with_fresh_calendar() {
        let (service, store, car) = service_with(ResourceKind::Vehicle).await;
        service
            .submit_as_of(vehicle_form(car, date(2024, 3, 1), date(2024, 3, 3)), None, today())
            .await
            .unwrap();

        let clash = vehicle_form(car, date(2024, 3, 2), date(2024, 3, 4));
        let retry_id = clash.submission_id;
        let outcome = service.submit_as_of(clash, None, today()).await.unwrap();

        match outcome {
            IntakeOutcome::DatesUnavailable {
                conflicting_days,
                occupied_days,
                ..
            } => {
                assert_eq!(conflicting_days, vec![date(2024, 3, 2), date(2024, 3, 3)]);
                assert_eq!(occupied_days.len(), 3);
            }
            other => panic!("expected dates unavailable, got {:?}", other),
        }
        assert_eq!(store.reservation_count(), 1);
        assert!(service.cache.submissions.get(&retry_id).await.is_none());
    }

    #[tokio::test]
    async fn test_invalid_form_never_claims_submission() {
        let (service, store, car) = service_with(ResourceKind::Vehicle).await;
        let mut form = vehicle_form(car, date(2024, 3, 1), date(2024, 3, 3));
        form.email = String::new();
        let id = form.submission_id;

        assert!(service.submit_as_of(form, None, today()).await.is_err());
        assert!(service.cache.submissions.get(&id).await.is_none());
        assert_eq!(store.reservation_count(), 0);
    }

    #[tokio::test]
    async fn test_evicted_claim_cannot_book_twice() {
        let (service, store, car) = service_with(ResourceKind::Vehicle).await;
        let form = vehicle_form(car, date(2024, 3, 1), date(2024, 3, 3));
        let id = form.submission_id;
        service.submit_as_of(form.clone(), None, today()).await.unwrap();

        // Same effect as the ledger dropping the entry when full.
        service.cache.submissions.invalidate(&id).await;
        let outcome = service.submit_as_of(form, None, today()).await.unwrap();

        assert!(matches!(outcome, IntakeOutcome::DatesUnavailable { .. }));
        assert_eq!(store.reservation_count(), 1);
        assert_eq!(store.occupied_count(), 1);
    }
}

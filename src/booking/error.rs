//! Booking error kinds

use chrono::NaiveDate;
use uuid::Uuid;

use crate::db::StoreError;
use crate::models::PaymentStatus;

/// Outcome kinds for a failed booking operation.
///
/// None of them is fatal to the process; each is scoped to one request.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Invalid booking request: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Selected dates are no longer available")]
    Conflict {
        resource_id: Uuid,
        conflicting_days: Vec<NaiveDate>,
    },

    #[error("Pricing unavailable for resource {0}")]
    PricingUnavailable(Uuid),

    #[error("Resource {0} not found")]
    ResourceNotFound(Uuid),

    #[error("Reservation {0} not found")]
    ReservationNotFound(Uuid),

    #[error("Resource {0} still has active reservations")]
    ResourceInUse(Uuid),

    #[error("Not allowed to manage {0}")]
    Forbidden(Uuid),

    #[error("Cannot move a {from} reservation to {to}")]
    InvalidTransition { from: PaymentStatus, to: PaymentStatus },

    #[error("A submission with this id is already being processed")]
    SubmissionInFlight,

    #[error("Booking store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),
}

impl BookingError {
    pub fn validation(message: impl Into<String>) -> Self {
        BookingError::Validation(vec![message.into()])
    }

    /// Whether the same request may succeed if the caller tries again
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BookingError::Conflict { .. }
                | BookingError::StoreUnavailable(_)
                | BookingError::SubmissionInFlight
        )
    }
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        BookingError::StoreUnavailable(err)
    }
}

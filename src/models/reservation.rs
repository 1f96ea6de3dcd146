//! Reservations and their occupied-day markers

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::resource::ResourceKind;

/// Payment state of a reservation.
///
/// Reservations start out `Pending`; the external payment flow moves them on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Cancelled,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Failed => "failed",
        }
    }

    /// Whether a reservation in this state still blocks its dates
    pub fn holds_dates(&self) -> bool {
        matches!(self, PaymentStatus::Pending | PaymentStatus::Paid)
    }

    /// Cancelled and failed are terminal; a paid booking may still be cancelled.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (*self, next),
            (Pending, Paid) | (Pending, Failed) | (Pending, Cancelled) | (Paid, Cancelled)
        )
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "cancelled" => Ok(PaymentStatus::Cancelled),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(format!("unknown payment status '{}'", other)),
        }
    }
}

/// Contact details collected by every intake surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl CustomerInfo {
    pub fn new(name: impl Into<String>, email: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            email: email.into().trim().to_string(),
            phone: phone.into().trim().to_string(),
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.name.is_empty() {
            errors.push("customer name is required".to_string());
        }
        if self.email.is_empty() {
            errors.push("customer email is required".to_string());
        } else if !is_plausible_email(&self.email) {
            errors.push(format!("'{}' is not a valid email address", self.email));
        }
        if self.phone.is_empty() {
            errors.push("customer phone is required".to_string());
        }
        errors
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

/// A customer's claim on a resource for the inclusive range `[start_date, end_date]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reservation {
    pub id: Uuid,
    pub resource_id: Uuid,
    pub resource_kind: ResourceKind,
    pub user_id: Option<Uuid>,
    pub customer: CustomerInfo,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// The availability marker written alongside this reservation
    pub fn occupied_entry(&self) -> OccupiedDayEntry {
        OccupiedDayEntry {
            resource_id: self.resource_id,
            start_date: self.start_date,
            end_date: self.end_date,
            reservation_id: self.id,
        }
    }
}

/// Denormalized calendar marker: `resource_id` is taken from `start_date`
/// through `end_date`, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OccupiedDayEntry {
    pub resource_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reservation_id: Uuid,
}

impl OccupiedDayEntry {
    /// True when the two inclusive ranges share at least one calendar day
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && start <= self.end_date
    }

    /// Every calendar day covered by this entry
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end_date;
        self.start_date.iter_days().take_while(move |day| *day <= end)
    }
}

//! Booking module
//!
//! Availability index, reservation commit protocol, resource catalog and
//! the intake adapters that feed them.

pub mod availability;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod intake;

pub use availability::{conflicting_days, expand_entries};
pub use engine::{BookingEngine, BookingRequest};
pub use error::BookingError;
pub use intake::{
    confirmation_url, ExperienceBookingForm, IntakeForm, IntakeOutcome, IntakeService,
    ModalBookingForm, VehicleBookingForm,
};

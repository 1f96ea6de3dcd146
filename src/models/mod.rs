//! Domain models for the booking engine

pub mod principal;
pub mod reservation;
pub mod resource;

pub use principal::Principal;
pub use reservation::{CustomerInfo, OccupiedDayEntry, PaymentStatus, Reservation};
pub use resource::{NewResource, Resource, ResourceKind, MAX_RESOURCE_IMAGES};

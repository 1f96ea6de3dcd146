//! Bookable resources: vehicles, tours and attractions

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upper bound on images attached to one resource
pub const MAX_RESOURCE_IMAGES: usize = 5;

/// What kind of thing is being rented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Vehicle,
    Tour,
    Attraction,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Vehicle => "vehicle",
            ResourceKind::Tour => "tour",
            ResourceKind::Attraction => "attraction",
        }
    }

    /// Vehicles carry pickup and dropoff locations; experiences do not.
    pub fn uses_locations(&self) -> bool {
        matches!(self, ResourceKind::Vehicle)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vehicle" | "car" => Ok(ResourceKind::Vehicle),
            "tour" => Ok(ResourceKind::Tour),
            "attraction" => Ok(ResourceKind::Attraction),
            other => Err(format!("unknown resource kind '{}'", other)),
        }
    }
}

/// A bookable entity.
///
/// `rate` is expressed in base currency units per billable day. A resource
/// without a rate can be listed but not booked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    pub id: Uuid,
    pub kind: ResourceKind,
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub rate: Option<Decimal>,
    pub duration_hours: Option<i32>,
    pub owner_id: Uuid,
    pub image_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Admin intake payload for a new resource.
///
/// Images are uploaded to the object store beforehand; only their public
/// URLs arrive here.
#[derive(Debug, Clone, Deserialize)]
pub struct NewResource {
    pub kind: ResourceKind,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub rate: Option<Decimal>,
    #[serde(default)]
    pub duration_hours: Option<i32>,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

impl NewResource {
    /// Collect every problem with the payload rather than stopping at the first.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("name is required".to_string());
        }
        if let Some(rate) = self.rate {
            if rate.is_sign_negative() {
                errors.push("rate must not be negative".to_string());
            }
        }
        if let Some(hours) = self.duration_hours {
            if hours <= 0 {
                errors.push("duration_hours must be positive".to_string());
            }
        }
        if self.image_urls.len() > MAX_RESOURCE_IMAGES {
            errors.push(format!(
                "at most {} images may be attached",
                MAX_RESOURCE_IMAGES
            ));
        }
        if self.image_urls.iter().any(|url| url.trim().is_empty()) {
            errors.push("image urls must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Turn a validated payload into a stored resource owned by `owner_id`
    pub fn into_resource(self, owner_id: Uuid, now: DateTime<Utc>) -> Resource {
        Resource {
            id: Uuid::new_v4(),
            kind: self.kind,
            name: self.name.trim().to_string(),
            description: self.description,
            rate: self.rate,
            duration_hours: self.duration_hours,
            owner_id,
            image_urls: self.image_urls,
            created_at: now,
        }
    }
}

//! In-memory caching using moka
//!
//! Holds the submission ledger used to de-duplicate booking form submits.
//! Nothing about availability is cached: the occupied-day index is always
//! read fresh from the store.

use moka::future::Cache;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::models::Reservation;

/// Where a form submission stands
#[derive(Debug, Clone)]
pub enum SubmissionState {
    /// Claimed by a request that has not finished yet
    InFlight,
    /// Finished; repeats of the same submission replay this reservation
    Completed(Arc<Reservation>),
}

/// Submissions remembered by default
pub const DEFAULT_SUBMISSION_CAPACITY: u64 = 100_000;

/// Default lifetime of a submission entry
pub const DEFAULT_SUBMISSION_TTL: Duration = Duration::from_secs(30 * 60);

/// Application cache.
///
/// The submission ledger is bounded. Once full, moka may evict any entry,
/// an in-flight claim included. A repeat of an evicted submission runs the
/// commit protocol again, where the store's overlap rule refuses it, so the
/// repeat comes back as unavailable dates rather than a replay. It never
/// books twice.
#[derive(Clone)]
pub struct AppCache {
    /// Submission id -> state
    pub submissions: Cache<Uuid, SubmissionState>,
}

impl AppCache {
    /// Create a new cache instance with the default limits
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_SUBMISSION_TTL, DEFAULT_SUBMISSION_CAPACITY)
    }

    /// An in-flight claim orphaned by a crashed request expires after `ttl`
    pub fn with_limits(ttl: Duration, capacity: u64) -> Self {
        Self {
            submissions: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            submissions_size: self.submissions.entry_count(),
        }
    }

    /// Forget a submission so the same id can be submitted again
    pub async fn release_submission(&self, id: Uuid) {
        self.submissions.invalidate(&id).await;
    }
}

impl Default for AppCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics for monitoring endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub submissions_size: u64,
}

//! Availability index: which calendar days a resource is already taken.
//!
//! Stateless; every call reads the occupied-day entries afresh.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::models::OccupiedDayEntry;

/// Union of the days covered by `entries`
pub fn expand_entries(entries: &[OccupiedDayEntry]) -> BTreeSet<NaiveDate> {
    entries.iter().flat_map(OccupiedDayEntry::days).collect()
}

/// Days of `[start, end]` already present in `occupied`
pub fn conflicting_days(
    occupied: &BTreeSet<NaiveDate>,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<NaiveDate> {
    if end < start {
        return Vec::new();
    }
    occupied.range(start..=end).copied().collect()
}

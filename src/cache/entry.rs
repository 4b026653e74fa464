//! Cache entry definitions.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::scanner::ScanResult;

/// A stored scan result with its expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The scan this entry was built from
    pub result: ScanResult,
    /// When the scan finished
    pub created_at: DateTime<Utc>,
    /// First instant at which the entry is stale
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Wrap a fresh scan result that lives for `ttl` from `now`.
    ///
    /// A TTL that reaches past year 9999 saturates to the last second of 9999,
    /// which keeps the entry serializable.
    #[must_use]
    pub fn new(result: ScanResult, now: DateTime<Utc>, ttl: Duration) -> Self {
        let latest = latest_expiry();
        let expires_at = TimeDelta::from_std(ttl)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta))
            .map_or(latest, |at| at.min(latest));
        Self {
            result,
            created_at: now,
            expires_at,
        }
    }

    /// True while `now` is before the expiry.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

fn latest_expiry() -> DateTime<Utc> {
    DateTime::from_timestamp(253_402_300_799, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

//! Time source

use chrono::{DateTime, Utc};

/// Source of the current time
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Time elapsed from `earlier` to `later`, zero if `later` is not after it
#[must_use]
pub fn elapsed_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> std::time::Duration {
    (later - earlier).to_std().unwrap_or_default()
}

/// `at` shifted forward by `delay`
#[must_use]
pub fn deadline_after(at: DateTime<Utc>, delay: std::time::Duration) -> DateTime<Utc> {
    let millis = i64::try_from(delay.as_millis()).unwrap_or(i64::MAX);
    chrono::TimeDelta::try_milliseconds(millis)
        .and_then(|delta| at.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

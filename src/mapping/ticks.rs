//! Tick encoding for date-times and durations.
//!
//! A tick is 100 nanoseconds. Date-times count ticks since
//! `0001-01-01T00:00:00Z`; durations count ticks of elapsed time.
//!
//! chrono types serialize as strings by default, which would make them
//! String leaves. Wrap such properties in [`Ticks`] so they are indexed as
//! Long tick counts and can take part in range queries:
//!
//! ```
//! use chrono::{DateTime, TimeDelta, Utc};
//! use docmap::mapping::ticks::Ticks;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Visit {
//!     at: Ticks<DateTime<Utc>>,
//!     length: Ticks<TimeDelta>,
//! }
//! ```

use std::fmt;
use std::ops::Deref;

use chrono::{DateTime, TimeDelta, Utc};
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Newtype name the serializer recognizes as a date-time leaf.
pub const DATETIME_MARKER: &str = "$ticks:datetime";

/// Newtype name the serializer recognizes as a duration leaf.
pub const DURATION_MARKER: &str = "$ticks:duration";

/// Ticks per second.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Ticks between 0001-01-01 and the Unix epoch.
pub const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

/// Convert a date-time to ticks, if it is representable.
pub fn from_datetime(value: &DateTime<Utc>) -> Option<i64> {
    value
        .timestamp()
        .checked_mul(TICKS_PER_SECOND)?
        .checked_add(i64::from(value.timestamp_subsec_nanos() / 100))?
        .checked_add(UNIX_EPOCH_TICKS)
}

/// Convert ticks back to a date-time.
pub fn to_datetime(ticks: i64) -> Option<DateTime<Utc>> {
    let relative = ticks.checked_sub(UNIX_EPOCH_TICKS)?;
    let secs = relative.div_euclid(TICKS_PER_SECOND);
    let nanos = (relative.rem_euclid(TICKS_PER_SECOND) * 100) as u32;
    DateTime::from_timestamp(secs, nanos)
}

/// Convert a duration to ticks.
pub fn from_duration(value: &TimeDelta) -> Option<i64> {
    value
        .num_seconds()
        .checked_mul(TICKS_PER_SECOND)?
        .checked_add(i64::from(value.subsec_nanos() / 100))
}

/// Convert ticks back to a duration.
pub fn to_duration(ticks: i64) -> Option<TimeDelta> {
    let secs = ticks.div_euclid(TICKS_PER_SECOND);
    let nanos = (ticks.rem_euclid(TICKS_PER_SECOND) * 100) as u32;
    TimeDelta::new(secs, nanos)
}

/// The current time in ticks.
pub fn now() -> i64 {
    from_datetime(&Utc::now()).unwrap_or(i64::MAX)
}

/// chrono types that have a tick encoding.
pub trait TickValue: Sized + private::Sealed {
    /// Newtype name announced to the field serializer.
    const MARKER: &'static str;

    /// Encode as ticks, if representable.
    fn to_ticks(&self) -> Option<i64>;

    /// Decode from ticks.
    fn from_ticks(ticks: i64) -> Option<Self>;
}

mod private {
    pub trait Sealed {}

    impl Sealed for chrono::DateTime<chrono::Utc> {}
    impl Sealed for chrono::TimeDelta {}
}

impl TickValue for DateTime<Utc> {
    const MARKER: &'static str = DATETIME_MARKER;

    fn to_ticks(&self) -> Option<i64> {
        from_datetime(self)
    }

    fn from_ticks(ticks: i64) -> Option<Self> {
        to_datetime(ticks)
    }
}

impl TickValue for TimeDelta {
    const MARKER: &'static str = DURATION_MARKER;

    fn to_ticks(&self) -> Option<i64> {
        from_duration(self)
    }

    fn from_ticks(ticks: i64) -> Option<Self> {
        to_duration(ticks)
    }
}

/// A date-time or duration stored as a Long tick count.
///
/// Only `Ticks<_>` properties take part in range queries as date-times
/// and durations; bare chrono values serialize as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticks<T>(pub T);

impl<T> Ticks<T> {
    /// Unwrap the inner value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> From<T> for Ticks<T> {
    fn from(value: T) -> Self {
        Ticks(value)
    }
}

impl<T> Deref for Ticks<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: TickValue + fmt::Display> Serialize for Ticks<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let ticks = self
            .0
            .to_ticks()
            .ok_or_else(|| S::Error::custom(format!("{} is outside the tick range", self.0)))?;
        serializer.serialize_newtype_struct(T::MARKER, &ticks)
    }
}

impl<'de, T: TickValue> Deserialize<'de> for Ticks<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let ticks = i64::deserialize(deserializer)?;
        T::from_ticks(ticks)
            .map(Ticks)
            .ok_or_else(|| D::Error::custom(format!("{ticks} ticks is out of range for {}", T::MARKER)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unix_epoch_offset() {
        let epoch = DateTime::from_timestamp(0, 0).unwrap();
        assert_eq!(from_datetime(&epoch), Some(UNIX_EPOCH_TICKS));
        assert_eq!(to_datetime(UNIX_EPOCH_TICKS), Some(epoch));
    }

    #[test]
    fn test_datetime_round_trip_keeps_100ns_precision() {
        let value = DateTime::from_timestamp(1_700_000_000, 123_456_700).unwrap();
        let ticks = from_datetime(&value).unwrap();
        assert_eq!(to_datetime(ticks), Some(value));

        let before = DateTime::from_timestamp(-86_400, 500).unwrap();
        let ticks = from_datetime(&before).unwrap();
        assert!(ticks < UNIX_EPOCH_TICKS);
        assert_eq!(to_datetime(ticks), DateTime::from_timestamp(-86_400, 500));
    }

    #[test]
    fn test_duration_round_trip() {
        let value = TimeDelta::milliseconds(90_500);
        let ticks = from_duration(&value).unwrap();
        assert_eq!(ticks, 905_000_000);
        assert_eq!(to_duration(ticks), Some(value));

        let negative = TimeDelta::seconds(-3);
        assert_eq!(to_duration(from_duration(&negative).unwrap()), Some(negative));
    }

    #[test]
    fn test_ticks_json_is_a_bare_count() {
        let value = Ticks(DateTime::from_timestamp(0, 0).unwrap());
        let json = serde_json::to_value(value).unwrap();
        assert_eq!(json, serde_json::json!(UNIX_EPOCH_TICKS));

        let restored: Ticks<DateTime<Utc>> = serde_json::from_value(json).unwrap();
        assert_eq!(restored, value);

        let length: Ticks<TimeDelta> = serde_json::from_value(serde_json::json!(30)).unwrap();
        assert_eq!(*length, TimeDelta::microseconds(3));
    }

    #[test]
    fn test_now_is_after_epoch() {
        assert!(now() > UNIX_EPOCH_TICKS);
    }
}

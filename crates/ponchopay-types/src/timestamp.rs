//! Time values used on the PonchoPay wire.
//!
//! Two shapes of time travel over the API:
//!
//! - [`Timestamp`] is a calendar date sent in request bodies (payment expiry,
//!   subscription end date). The API accepts either an ISO8601 date or an
//!   arbitrary string, so both are representable.
//! - [`UnixTimestamp`] is a number of seconds since the epoch, used for the
//!   `iat` and `exp` claims of manipulation assertions.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::ops::Add;
use std::time::SystemTime;

/// A date value as accepted by the API.
///
/// Dates serialise as ISO8601 with millisecond precision and a trailing `Z`
/// (`2025-04-03T12:57:16.000Z`). Literal strings are sent verbatim.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use ponchopay_types::timestamp::Timestamp;
///
/// let date = Timestamp::from(Utc.with_ymd_and_hms(2025, 4, 3, 12, 57, 16).unwrap());
/// assert_eq!(date.to_string(), "2025-04-03T12:57:16.000Z");
///
/// let literal = Timestamp::from("tomorrow");
/// assert_eq!(literal.to_string(), "tomorrow");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Timestamp {
    Date(DateTime<Utc>),
    Literal(String),
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Timestamp::Date(date) => {
                write!(f, "{}", date.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Timestamp::Literal(literal) => write!(f, "{literal}"),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Timestamp::Date(value)
    }
}

impl From<String> for Timestamp {
    fn from(value: String) -> Self {
        Timestamp::Literal(value)
    }
}

impl From<&str> for Timestamp {
    fn from(value: &str) -> Self {
        Timestamp::Literal(value.to_string())
    }
}

/// A Unix timestamp representing seconds since the Unix epoch (1970-01-01T00:00:00Z).
///
/// Serialised as a JSON number, as registered JWT claims require.
///
/// ```
/// use ponchopay_types::timestamp::UnixTimestamp;
///
/// let issued_at = UnixTimestamp::from_secs(1699999999);
/// let expires_at = issued_at + 5;
/// assert_eq!(expires_at.as_secs(), 1700000004);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Ord, Eq)]
pub struct UnixTimestamp(u64);

impl Serialize for UnixTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for UnixTimestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(UnixTimestamp)
    }
}

impl Display for UnixTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add<u64> for UnixTimestamp {
    type Output = Self;

    fn add(self, rhs: u64) -> Self::Output {
        UnixTimestamp(self.0 + rhs)
    }
}

impl UnixTimestamp {
    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Returns the current system time as a [`UnixTimestamp`].
    ///
    /// A clock set before the Unix epoch yields `0`.
    pub fn now() -> Self {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self(now)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn dates_serialise_with_milliseconds_and_zulu() {
        let date = Utc
            .with_ymd_and_hms(2024, 1, 16, 11, 13, 20)
            .unwrap()
            .checked_add_signed(chrono::Duration::milliseconds(7))
            .unwrap();
        let json = serde_json::to_string(&Timestamp::from(date)).unwrap();
        assert_eq!(json, r#""2024-01-16T11:13:20.007Z""#);
    }

    #[test]
    fn literals_pass_through() {
        let json = serde_json::to_string(&Timestamp::from("2025-04-03T12:57:16.000Z")).unwrap();
        assert_eq!(json, r#""2025-04-03T12:57:16.000Z""#);
    }

    #[test]
    fn unix_timestamps_are_numbers() {
        let json = serde_json::to_string(&UnixTimestamp::from_secs(42)).unwrap();
        assert_eq!(json, "42");
        let parsed: UnixTimestamp = serde_json::from_str("42").unwrap();
        assert_eq!(parsed, UnixTimestamp::from_secs(42));
    }
}

// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Wall-clock helpers.

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer, Visitor};
use std::fmt;

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Format an epoch-milliseconds timestamp as an ISO-8601 calendar date
/// (`YYYY-MM-DD`, UTC). Out-of-range timestamps fall back to the epoch.
pub fn iso_date(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .unwrap_or(DateTime::UNIX_EPOCH)
        .format("%Y-%m-%d")
        .to_string()
}

/// Deserialize an epoch-milliseconds value from any JSON number.
/// Fractional values are truncated.
pub fn deserialize_millis<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(MillisVisitor)
}

struct MillisVisitor;

impl<'de> Visitor<'de> for MillisVisitor {
    type Value = i64;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a timestamp in milliseconds")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<i64, E> {
        Ok(value)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<i64, E> {
        i64::try_from(value).map_err(|_| E::custom("timestamp out of range"))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<i64, E> {
        if value.is_finite() && value.abs() < i64::MAX as f64 {
            Ok(value.trunc() as i64)
        } else {
            Err(E::custom("timestamp out of range"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Stamp {
        #[serde(deserialize_with = "deserialize_millis")]
        at: i64,
    }

    fn stamp(json: &str) -> Result<i64, serde_json::Error> {
        serde_json::from_str::<Stamp>(json).map(|s| s.at)
    }

    #[test]
    fn test_epoch() {
        assert_eq!(iso_date(0), "1970-01-01");
    }

    #[test]
    fn test_known_dates() {
        // 2000-02-29T12:00:00Z
        assert_eq!(iso_date(951_825_600_000), "2000-02-29");
        // 2024-12-31T23:59:59Z
        assert_eq!(iso_date(1_735_689_599_000), "2024-12-31");
    }

    #[test]
    fn test_now_is_after_2020() {
        assert!(now_millis() > 1_577_836_800_000);
    }

    #[test]
    fn test_millis_from_any_number() {
        assert_eq!(stamp(r#"{"at":1700000000000}"#).unwrap(), 1_700_000_000_000);
        assert_eq!(stamp(r#"{"at":1700000000000.5}"#).unwrap(), 1_700_000_000_000);
        assert_eq!(stamp(r#"{"at":-12}"#).unwrap(), -12);
        assert!(stamp(r#"{"at":"soon"}"#).is_err());
        assert!(stamp(r#"{"at":18446744073709551615}"#).is_err());
    }
}

use crate::{float, CodecError, Result};
use time::format_description::well_known::{Iso8601, Rfc3339};
use time::OffsetDateTime;

/// The three ways a date/time/timedelta value can arrive on the wire
/// (spec §4.B "Date / Time / Timedelta"): a parsed ISO-8601 string, a
/// raw numeric timestamp (seconds since epoch), or an already-resolved
/// offset in seconds (e.g. from a `{"_date": ...}` cast object once
/// the schema engine has unwrapped it).
#[derive(Debug, Clone, PartialEq)]
pub enum DateValue {
    Iso8601(String),
    EpochSeconds(f64),
}

/// Resolves a [`DateValue`] to seconds-since-epoch and serializes it
/// with the same sortable float encoding as `Float` (spec §4.B: "Date /
/// Time / Timedelta: encoded as sortable float seconds-since-epoch").
pub fn serialize_datetime(value: &DateValue) -> Result<[u8; 8]> {
    let seconds = match value {
        DateValue::EpochSeconds(s) => *s,
        DateValue::Iso8601(s) => parse_iso8601(s)?,
    };
    Ok(float::serialize_f64(seconds))
}

pub fn unserialize_datetime(bytes: &[u8; 8]) -> f64 {
    float::unserialize_f64(bytes)
}

fn parse_iso8601(s: &str) -> Result<f64> {
    let dt = OffsetDateTime::parse(s, &Rfc3339)
        .or_else(|_| OffsetDateTime::parse(s, &Iso8601::DEFAULT))
        .map_err(|e| CodecError::Invalid("date", e.to_string()))?;
    let nanos = dt.unix_timestamp_nanos();
    Ok(nanos as f64 / 1_000_000_000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_epoch_seconds() {
        let v = DateValue::EpochSeconds(1_700_000_000.5);
        let enc = serialize_datetime(&v).unwrap();
        assert_eq!(unserialize_datetime(&enc), 1_700_000_000.5);
    }

    #[test]
    fn parses_rfc3339() {
        let v = DateValue::Iso8601("2023-11-14T22:13:20Z".to_string());
        let enc = serialize_datetime(&v).unwrap();
        assert_eq!(unserialize_datetime(&enc), 1_700_000_000.0);
    }

    #[test]
    fn sorts_chronologically() {
        let earlier = serialize_datetime(&DateValue::Iso8601("2020-01-01T00:00:00Z".into())).unwrap();
        let later = serialize_datetime(&DateValue::Iso8601("2021-01-01T00:00:00Z".into())).unwrap();
        assert!(earlier < later);
    }

    #[test]
    fn rejects_garbage() {
        assert!(serialize_datetime(&DateValue::Iso8601("not a date".into())).is_err());
    }
}

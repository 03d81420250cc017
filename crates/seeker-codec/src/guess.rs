use crate::{parse_uuids, CodecError, DateValue, Result};
use seeker_types::CastKind;
use serde_json::Value;
use time::macros::format_description;
use time::{Date, Time};
use uuid::Uuid;

/// The resolved, concrete value a MsgPack/JSON scalar guesses or casts
/// to (spec §4.B `guess_type`/`cast`). Geo is carried as raw EWKT text;
/// expanding it into ranges/centroids is the `CoverGenerator`'s job.
#[derive(Debug, Clone, PartialEq)]
pub enum Typed {
    Integer(i64),
    Positive(u64),
    Float(f64),
    Boolean(bool),
    Uuid(Vec<Uuid>),
    Date(DateValue),
    Time(DateValue),
    Timedelta(DateValue),
    Geo(String),
    Term(String),
    Text(String),
    String(String),
}

impl Typed {
    pub fn type_name(&self) -> &'static str {
        match self {
            Typed::Integer(_) => "integer",
            Typed::Positive(_) => "positive",
            Typed::Float(_) => "float",
            Typed::Boolean(_) => "boolean",
            Typed::Uuid(_) => "uuid",
            Typed::Date(_) => "date",
            Typed::Time(_) => "time",
            Typed::Timedelta(_) => "timedelta",
            Typed::Geo(_) => "geo",
            Typed::Term(_) => "term",
            Typed::Text(_) => "text",
            Typed::String(_) => "string",
        }
    }
}

fn is_date_like(s: &str) -> bool {
    let fmt = format_description!("[year]-[month]-[day]");
    Date::parse(s, &fmt).is_ok() || time::OffsetDateTime::parse(s, &time::format_description::well_known::Rfc3339).is_ok()
}

fn is_time_like(s: &str) -> bool {
    let fmt = format_description!("[hour]:[minute]:[second]");
    Time::parse(s, &fmt).is_ok()
}

/// A timedelta is a signed magnitude followed by a single `d`/`h`/`m`/`s`
/// unit, e.g. `+1.5h`, `-30m` (spec §4.B; exact grammar left to the
/// real implementation's `Datetime::isTimedelta`, this mirrors its
/// shape for type-guessing purposes).
fn is_timedelta_like(s: &str) -> bool {
    let s = s.strip_prefix(['+', '-']).unwrap_or(s);
    match s.strip_suffix(['d', 'h', 'm', 's']) {
        Some(magnitude) => !magnitude.is_empty() && magnitude.chars().all(|c| c.is_ascii_digit() || c == '.'),
        None => false,
    }
}

const EWKT_KEYWORDS: &[&str] = &[
    "POINT", "MULTIPOINT", "CIRCLE", "MULTICIRCLE", "CONVEX", "POLYGON", "MULTIPOLYGON", "CHULL", "MULTICHULL",
    "GEOMETRYCOLLECTION", "GEOMETRYINTERSECTION",
];

/// Detects EWKT shape: an optional `SRID=####;` prefix followed by one
/// of the recognized geometry keywords (spec §4.B "Geo(EWKT)"; full
/// grammar validation happens in the real cover generator).
fn is_ewkt_like(s: &str) -> bool {
    let body = match s.split_once(';') {
        Some((prefix, rest)) if prefix.trim_start().starts_with("SRID") => rest,
        _ => s,
    };
    let body = body.trim_start();
    EWKT_KEYWORDS.iter().any(|kw| body.starts_with(kw))
}

fn is_text(s: &str, bool_term: bool) -> bool {
    !bool_term && s.split_whitespace().count() > 1
}

/// `guess_type` (spec §4.B): infers a concrete type from a MsgPack/JSON
/// scalar. Numbers dispatch by sign/fractional-ness; strings are
/// probed in order `UUID, Date, Time, Timedelta, Geo(EWKT), Text,
/// String`; a single-key object whose key is a cast tag dispatches via
/// [`cast_as`].
pub fn guess_type(value: &Value, bool_term: bool) -> Result<Typed> {
    match value {
        Value::Bool(b) => Ok(Typed::Boolean(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                if i < 0 {
                    return Ok(Typed::Integer(i));
                }
                return Ok(Typed::Positive(i as u64));
            }
            if let Some(u) = n.as_u64() {
                return Ok(Typed::Positive(u));
            }
            let f = n.as_f64().ok_or_else(|| CodecError::Invalid("guess", "number is neither int nor float".to_string()))?;
            Ok(Typed::Float(f))
        }
        Value::String(s) => {
            if let Ok(uuids) = parse_uuids(s) {
                if !uuids.is_empty() {
                    return Ok(Typed::Uuid(uuids));
                }
            }
            if is_date_like(s) {
                return Ok(Typed::Date(DateValue::Iso8601(s.clone())));
            }
            if is_time_like(s) {
                return Ok(Typed::Time(DateValue::Iso8601(s.clone())));
            }
            if is_timedelta_like(s) {
                return Ok(Typed::Timedelta(DateValue::Iso8601(s.clone())));
            }
            if is_ewkt_like(s) {
                return Ok(Typed::Geo(s.clone()));
            }
            if bool_term {
                return Ok(Typed::Term(s.clone()));
            }
            if is_text(s, bool_term) {
                return Ok(Typed::Text(s.clone()));
            }
            Ok(Typed::String(s.clone()))
        }
        Value::Object(map) if map.len() == 1 => {
            let (key, inner) = map.iter().next().expect("checked len == 1");
            let kind = CastKind::from_tag(key)
                .ok_or_else(|| CodecError::Invalid("guess", format!("unknown cast tag `{key}`")))?;
            cast_as(inner, kind)
        }
        Value::Null => Ok(if bool_term { Typed::Term(String::new()) } else { Typed::String(String::new()) }),
        other => Err(CodecError::Invalid("guess", format!("unexpected value shape: {other}"))),
    }
}

/// `cast(object)` (spec §4.B): enforces a single cast tag against its
/// payload, returning [`crate::CodecError::Invalid`] (the codec-level
/// counterpart of *TypeMismatch*) on mismatch rather than guessing.
pub fn cast_as(value: &Value, kind: CastKind) -> Result<Typed> {
    let mismatch = |expected: &'static str| {
        CodecError::Invalid("cast", format!("expected {expected}, found {value}"))
    };
    match kind {
        CastKind::Integer => value.as_i64().map(Typed::Integer).ok_or_else(|| mismatch("integer")),
        CastKind::Positive => value.as_u64().map(Typed::Positive).ok_or_else(|| mismatch("positive")),
        CastKind::Float => value.as_f64().map(Typed::Float).ok_or_else(|| mismatch("float")),
        CastKind::Boolean => value.as_bool().map(Typed::Boolean).ok_or_else(|| mismatch("boolean")),
        CastKind::Uuid => {
            let s = value.as_str().ok_or_else(|| mismatch("uuid"))?;
            parse_uuids(s).map(Typed::Uuid)
        }
        CastKind::Date => value.as_str().map(|s| Typed::Date(DateValue::Iso8601(s.to_string()))).ok_or_else(|| mismatch("date")),
        CastKind::Time => value.as_str().map(|s| Typed::Time(DateValue::Iso8601(s.to_string()))).ok_or_else(|| mismatch("time")),
        CastKind::Timedelta => value
            .as_str()
            .map(|s| Typed::Timedelta(DateValue::Iso8601(s.to_string())))
            .ok_or_else(|| mismatch("timedelta")),
        CastKind::Term => value.as_str().map(|s| Typed::Term(s.to_string())).ok_or_else(|| mismatch("term")),
        CastKind::Text => value.as_str().map(|s| Typed::Text(s.to_string())).ok_or_else(|| mismatch("text")),
        CastKind::String => value.as_str().map(|s| Typed::String(s.to_string())).ok_or_else(|| mismatch("string")),
        CastKind::Ewkt
        | CastKind::Point
        | CastKind::Circle
        | CastKind::Convex
        | CastKind::Polygon
        | CastKind::Chull
        | CastKind::MultiPoint
        | CastKind::MultiCircle
        | CastKind::MultiConvex
        | CastKind::MultiPolygon
        | CastKind::MultiChull
        | CastKind::GeoCollection
        | CastKind::GeoIntersection => value.as_str().map(|s| Typed::Geo(s.to_string())).ok_or_else(|| mismatch("geo")),
        CastKind::Chai | CastKind::Ecma => Err(CodecError::Invalid("cast", "script cast tags are handled by the schema engine, not the codec".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn guesses_numbers() {
        assert_eq!(guess_type(&json!(-5), false).unwrap(), Typed::Integer(-5));
        assert_eq!(guess_type(&json!(5), false).unwrap(), Typed::Positive(5));
        assert_eq!(guess_type(&json!(5.5), false).unwrap(), Typed::Float(5.5));
    }

    #[test]
    fn guesses_uuid_before_text() {
        let v = guess_type(&json!("550e8400-e29b-41d4-a716-446655440000"), false).unwrap();
        assert!(matches!(v, Typed::Uuid(_)));
    }

    #[test]
    fn guesses_date_before_text() {
        let v = guess_type(&json!("2023-11-14"), false).unwrap();
        assert!(matches!(v, Typed::Date(_)));
    }

    #[test]
    fn guesses_ewkt_geo() {
        let v = guess_type(&json!("POINT(10 20)"), false).unwrap();
        assert_eq!(v, Typed::Geo("POINT(10 20)".to_string()));
    }

    #[test]
    fn multi_word_strings_are_text_unless_bool_term() {
        assert!(matches!(guess_type(&json!("hello world"), false).unwrap(), Typed::Text(_)));
        assert!(matches!(guess_type(&json!("hello world"), true).unwrap(), Typed::Term(_)));
    }

    #[test]
    fn single_word_strings_are_string() {
        assert_eq!(guess_type(&json!("hello"), false).unwrap(), Typed::String("hello".to_string()));
    }

    #[test]
    fn cast_tag_object_dispatches() {
        let v = guess_type(&json!({"_integer": 42}), false).unwrap();
        assert_eq!(v, Typed::Integer(42));
    }

    #[test]
    fn cast_mismatch_is_an_error() {
        assert!(cast_as(&json!("not a number"), CastKind::Integer).is_err());
    }
}

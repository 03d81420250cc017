//! Lossless, sort-order-preserving encoding of each concrete field type
//! to an opaque byte string, and its inverse (spec §4.B).

mod boolean;
mod date;
mod float;
mod geo;
mod guess;
mod integer;
mod string_list;
mod text;
mod uuid_codec;

pub use boolean::{serialize_bool, unserialize_bool};
pub use date::{serialize_datetime, unserialize_datetime, DateValue};
pub use float::{serialize_f64, unserialize_f64};
pub use geo::{serialize_geo, unserialize_geo, Cartesian, GeoRange, GeoValue};
pub use guess::{cast_as, guess_type, Typed};
pub use integer::{serialize_integer, serialize_positive, unserialize_integer, unserialize_positive};
pub use string_list::{serialize_string_list, unserialize_string_list};
pub use text::{serialize_term, serialize_text};
pub use uuid_codec::{parse_uuids, serialize_uuids, short_form, unserialize_uuids};

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CodecError {
    #[error("buffer too short to decode {0}")]
    TooShort(&'static str),
    #[error("invalid encoding for {0}: {1}")]
    Invalid(&'static str, String),
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// The concrete, leaf-level types the serializer knows how to encode
/// (the `Concrete` slot of spec §3's `sep_types` quadruple; `Empty`,
/// `Foreign`, `Object`, `Array` and `Script` are schema-level wrappers
/// handled by `seeker-schema`, not by this codec).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConcreteType {
    Boolean,
    Date,
    Time,
    Timedelta,
    Float,
    Integer,
    Positive,
    Geo,
    String,
    Term,
    Text,
    Uuid,
}

impl ConcreteType {
    pub fn name(self) -> &'static str {
        match self {
            ConcreteType::Boolean => "boolean",
            ConcreteType::Date => "date",
            ConcreteType::Time => "time",
            ConcreteType::Timedelta => "timedelta",
            ConcreteType::Float => "float",
            ConcreteType::Integer => "integer",
            ConcreteType::Positive => "positive",
            ConcreteType::Geo => "geo",
            ConcreteType::String => "string",
            ConcreteType::Term => "term",
            ConcreteType::Text => "text",
            ConcreteType::Uuid => "uuid",
        }
    }
}
